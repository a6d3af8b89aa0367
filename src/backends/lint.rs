//! Style linting via an external, time-bounded subprocess.
//!
//! The submitted code is materialized to a uniquely-named `.rs` temp file,
//! the lint binary (by default a sibling `quench-lint`) is invoked against
//! it, and the artifact is removed on every exit path: success, failure
//! or timeout. Diagnostic lines have the artifact path rewritten to a
//! stable `Line ` prefix so no local filesystem path leaks to callers.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::LintSettings;
use crate::error::AnalysisError;

/// Name of the default lint binary, resolved next to the server binary or
/// on `PATH`.
const DEFAULT_LINT_BINARY: &str = "quench-lint";

/// A successful lint invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOutcome {
    /// One formatted finding per line, ordered as the tool reported them.
    pub issues: Vec<String>,
}

/// The lint backend: a resolved external binary plus its fixed invocation
/// policy.
pub struct LintBackend {
    program: Option<PathBuf>,
    timeout: Duration,
    disabled_rules: Vec<String>,
    max_line_width: usize,
}

impl LintBackend {
    /// Resolve the lint binary once at startup. An explicit configured
    /// command is probed as-is and never falls back; otherwise a sibling
    /// `quench-lint` next to the current executable is tried, then `PATH`.
    pub async fn resolve(settings: &LintSettings) -> Self {
        let program = match &settings.command {
            Some(command) => {
                if probe(command).await {
                    Some(command.clone())
                } else {
                    warn!(
                        command = %command.display(),
                        "configured lint command did not respond to --version; linting disabled"
                    );
                    None
                }
            }
            None => resolve_default().await,
        };

        match &program {
            Some(path) => info!(lint_backend = %path.display(), "lint backend available"),
            None => info!("no lint backend found; lint action will report unavailable"),
        }

        Self {
            program,
            timeout: Duration::from_secs(settings.timeout_secs),
            disabled_rules: settings.disabled_rules.clone(),
            max_line_width: settings.max_line_width,
        }
    }

    pub fn is_available(&self) -> bool {
        self.program.is_some()
    }

    /// Lint one snippet through the external tool.
    pub async fn lint(&self, code: &str) -> Result<LintOutcome, AnalysisError> {
        self.lint_traced(code).await.0
    }

    /// As [`lint`], additionally reporting the artifact path that was
    /// used, so tests can assert it no longer exists.
    pub(crate) async fn lint_traced(
        &self,
        code: &str,
    ) -> (Result<LintOutcome, AnalysisError>, Option<PathBuf>) {
        let Some(program) = &self.program else {
            return (
                Err(AnalysisError::Unavailable(
                    "Linting is not available. No lint backend is installed.".to_string(),
                )),
                None,
            );
        };

        let artifact = match LintArtifact::materialize(code) {
            Ok(artifact) => artifact,
            Err(err) => {
                return (
                    Err(AnalysisError::Backend(format!(
                        "failed to materialize lint artifact: {err}"
                    ))),
                    None,
                );
            }
        };

        let path = artifact.path().to_path_buf();
        let result = self.run(program, &path).await;
        artifact.release();
        (result, Some(path))
    }

    async fn run(&self, program: &Path, file: &Path) -> Result<LintOutcome, AnalysisError> {
        let mut command = Command::new(program);
        command
            .args(self.build_args(file))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %program.display(), file = %file.display(), "spawning lint subprocess");

        let child = command
            .spawn()
            .map_err(|err| AnalysisError::Backend(format!("failed to spawn lint process: {err}")))?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                // Exit code 1 means findings were reported; anything
                // beyond that is a tool failure.
                if !matches!(output.status.code(), Some(0) | Some(1)) {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(AnalysisError::Backend(format!(
                        "lint process failed ({}): {}",
                        output.status,
                        stderr.trim()
                    )));
                }
                let stdout = String::from_utf8_lossy(&output.stdout);
                Ok(LintOutcome {
                    issues: rewrite_output(&stdout, file),
                })
            }
            Ok(Err(err)) => Err(AnalysisError::Backend(format!("lint process error: {err}"))),
            // Timeout: dropping the wait future drops the child, and
            // kill_on_drop terminates it.
            Err(_) => Err(AnalysisError::Timeout(
                "Linting operation timed out. Code may be too complex.".to_string(),
            )),
        }
    }

    /// Fixed invocation policy: compact output, the configured disabled
    /// rules, a maximum line width, then the artifact path.
    fn build_args(&self, file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--format".into(), "compact".into()];
        for rule in &self.disabled_rules {
            args.push("--disable".into());
            args.push(rule.as_str().into());
        }
        args.push("--max-line-width".into());
        args.push(self.max_line_width.to_string().into());
        args.push(file.as_os_str().to_os_string());
        args
    }

    #[cfg(test)]
    pub(crate) fn for_tests(program: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            program,
            timeout,
            disabled_rules: Vec::new(),
            max_line_width: 88,
        }
    }
}

/// Keep only lines that mention the artifact and replace its path prefix
/// with `Line `, so responses never carry a filesystem path.
fn rewrite_output(stdout: &str, file: &Path) -> Vec<String> {
    let needle = file.display().to_string();
    let prefix = format!("{}:", needle);
    stdout
        .lines()
        .filter(|line| line.contains(&needle))
        .map(|line| line.replace(&prefix, "Line "))
        .collect()
}

/// The scoped temp artifact for one lint invocation. Dropping it removes
/// the file; [`release`](LintArtifact::release) removes it explicitly and
/// logs when deletion fails.
struct LintArtifact {
    file: NamedTempFile,
}

impl LintArtifact {
    fn materialize(code: &str) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("quench-")
            .suffix(".rs")
            .tempfile()?;
        file.write_all(code.as_bytes())?;
        file.flush()?;
        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(err) = self.file.close() {
            warn!(path = %path.display(), error = %err, "failed to delete lint artifact");
        }
    }
}

/// Whether a candidate binary responds to `--version`.
async fn probe(program: &Path) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Default resolution: a sibling binary next to the current executable,
/// then whatever `PATH` offers.
async fn resolve_default() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(DEFAULT_LINT_BINARY);
            if probe(&sibling).await {
                return Some(sibling);
            }
        }
    }

    let bare = PathBuf::from(DEFAULT_LINT_BINARY);
    if probe(&bare).await {
        return Some(bare);
    }
    None
}
