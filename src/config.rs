//! Service configuration: defaults, optional TOML file, environment overrides.
//!
//! Precedence (highest → lowest):
//! 1. `QUENCH_*` environment variables
//! 2. A TOML config file (`--config` flag, or `quench.toml` in the working
//!    directory when present)
//! 3. Built-in defaults
//!
//! # quench.toml format
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 8040
//! rate_limit_per_minute = 60
//!
//! [lint]
//! command = "/usr/local/bin/quench-lint"
//! timeout_secs = 30
//! max_line_width = 88
//! disabled_rules = ["missing_newline_eof", "blank_lines_eof"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Maximum accepted request body, in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Maximum accepted code payload, in characters.
pub const DEFAULT_MAX_CODE_CHARS: usize = 50_000;

/// Default per-client request budget per minute bucket.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

/// Default wall-clock budget for the lint subprocess, in seconds.
pub const DEFAULT_LINT_TIMEOUT_SECS: u64 = 30;

/// Default maximum line width passed to the linter.
pub const DEFAULT_MAX_LINE_WIDTH: usize = 88;

/// Stylistic rules the service asks the linter to skip. These mirror the
/// whitespace-at-end-of-file class of findings that are noise for pasted
/// snippets.
pub const DEFAULT_DISABLED_RULES: &[&str] =
    &["missing_newline_eof", "blank_lines_eof", "trailing_whitespace"];

/// Settings for the external lint subprocess.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LintSettings {
    /// Explicit path to the lint binary. When unset, a sibling
    /// `quench-lint` next to the server binary is tried, then `PATH`.
    pub command: Option<PathBuf>,

    /// Wall-clock budget for one lint invocation.
    pub timeout_secs: u64,

    /// Rule IDs passed to the linter via `--disable`.
    pub disabled_rules: Vec<String>,

    /// Maximum line width passed to the linter via `--max-line-width`.
    pub max_line_width: usize,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: DEFAULT_LINT_TIMEOUT_SECS,
            disabled_rules: DEFAULT_DISABLED_RULES.iter().map(|s| s.to_string()).collect(),
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,

    /// Requests with bodies larger than this are rejected with 413.
    pub max_body_bytes: usize,

    /// Code payloads longer than this (in characters) fail validation.
    pub max_code_chars: usize,

    /// Per-client request budget per minute bucket.
    pub rate_limit_per_minute: u32,

    pub lint: LintSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8040,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_code_chars: DEFAULT_MAX_CODE_CHARS,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            lint: LintSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides on top.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_toml(path)?,
            None => {
                let default_path = Path::new("quench.toml");
                if default_path.is_file() {
                    Self::from_toml(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file. Missing keys fall back to defaults.
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Apply `QUENCH_*` environment variables on top of the current values.
    fn apply_env_overrides(&mut self) {
        if let Some(host) = env_var("QUENCH_HOST") {
            self.host = host;
        }
        if let Some(port) = env_parse("QUENCH_PORT") {
            self.port = port;
        }
        if let Some(max) = env_parse("QUENCH_MAX_BODY_BYTES") {
            self.max_body_bytes = max;
        }
        if let Some(max) = env_parse("QUENCH_MAX_CODE_CHARS") {
            self.max_code_chars = max;
        }
        if let Some(limit) = env_parse("QUENCH_RATE_LIMIT_PER_MINUTE") {
            self.rate_limit_per_minute = limit;
        }
        if let Some(command) = env_var("QUENCH_LINT_COMMAND") {
            self.lint.command = Some(PathBuf::from(command));
        }
        if let Some(timeout) = env_parse("QUENCH_LINT_TIMEOUT_SECS") {
            self.lint.timeout_secs = timeout;
        }
        if let Some(width) = env_parse("QUENCH_LINT_MAX_LINE_WIDTH") {
            self.lint.max_line_width = width;
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 8040);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.max_code_chars, 50_000);
        assert_eq!(config.rate_limit_per_minute, 60);
        assert_eq!(config.lint.timeout_secs, 30);
        assert_eq!(config.lint.max_line_width, 88);
        assert!(config.lint.command.is_none());
    }

    #[test]
    fn test_from_toml_partial_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
port = 9000
rate_limit_per_minute = 5

[lint]
timeout_secs = 2
disabled_rules = ["unwrap_used"]
"#
        )
        .unwrap();

        let config = ServiceConfig::from_toml(file.path()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.rate_limit_per_minute, 5);
        assert_eq!(config.lint.timeout_secs, 2);
        assert_eq!(config.lint.disabled_rules, vec!["unwrap_used".to_string()]);
        // Untouched keys keep defaults.
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.lint.max_line_width, 88);
    }

    #[test]
    fn test_from_toml_missing_file_errors() {
        assert!(ServiceConfig::from_toml(Path::new("/nonexistent/quench.toml")).is_err());
    }
}
