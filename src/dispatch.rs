//! Per-action dispatch and response normalization.
//!
//! Routes a validated request to its backend, runs CPU-bound parsing on
//! the blocking pool, and normalizes every outcome, result or failure,
//! into a `(status code, envelope)` pair. Syntax errors in the submitted
//! code come back as HTTP 200 with an in-band diagnostic: an invalid
//! snippet is an expected, valid outcome of analysis.

use axum::http::StatusCode;
use serde_json::json;
use tokio::task;

use crate::backends::lint::LintBackend;
use crate::backends::syntax::{self, SyntaxResult};
use crate::backends::Action;
use crate::envelope::Envelope;
use crate::error::AnalysisError;

/// Dispatch one request to the selected backend.
pub async fn dispatch(action: Action, code: String, lint: &LintBackend) -> (StatusCode, Envelope) {
    let result = match action {
        Action::Check => run_check(code).await,
        Action::Lint => run_lint(code, lint).await,
        #[cfg(feature = "format")]
        Action::Format => run_format(code).await,
        #[cfg(not(feature = "format"))]
        Action::Format => Err(AnalysisError::Unavailable(
            "Formatting is not available. The formatter backend is not enabled.".to_string(),
        )),
        #[cfg(feature = "complexity")]
        Action::Complexity => run_complexity(code).await,
        #[cfg(not(feature = "complexity"))]
        Action::Complexity => Err(AnalysisError::Unavailable(
            "Complexity analysis is not available. The complexity backend is not enabled."
                .to_string(),
        )),
    };

    match result {
        Ok(envelope) => (StatusCode::OK, envelope),
        Err(err) => (err.status_code(), Envelope::from(&err)),
    }
}

async fn run_check(code: String) -> Result<Envelope, AnalysisError> {
    let result = task::spawn_blocking(move || syntax::check(&code))
        .await
        .map_err(join_error)?;

    Ok(match result {
        SyntaxResult::Valid { lines, characters } => Envelope::success("Syntax is valid ✓")
            .with_details(json!({ "lines": lines, "characters": characters })),
        SyntaxResult::Invalid(diag) => {
            Envelope::error(format!("Syntax error on line {}: {}", diag.line, diag.message))
                .with_details(json!({
                    "line_number": diag.line,
                    "column": diag.column,
                    "error_type": "SyntaxError",
                }))
        }
    })
}

async fn run_lint(code: String, lint: &LintBackend) -> Result<Envelope, AnalysisError> {
    let lines_checked = code.lines().count();
    let outcome = lint.lint(&code).await?;

    if outcome.issues.is_empty() {
        return Ok(Envelope::success("No linting issues found ✓").with_details(json!({
            "issues_count": 0,
            "lines_checked": lines_checked,
        })));
    }

    let count = outcome.issues.len();
    Ok(Envelope::lint_errors(format!("Found {} linting issue(s)", count))
        .with_errors(outcome.issues)
        .with_details(json!({
            "issues_count": count,
            "lines_checked": lines_checked,
        })))
}

#[cfg(feature = "format")]
async fn run_format(code: String) -> Result<Envelope, AnalysisError> {
    use crate::backends::format;

    let original_lines = code.lines().count();
    let result = task::spawn_blocking(move || format::format_source(&code))
        .await
        .map_err(join_error)?;

    let formatted = match result {
        Err(diag) => {
            return Ok(Envelope::error(format!(
                "Cannot format due to syntax error on line {}: {}",
                diag.line, diag.message
            ))
            .with_details(json!({
                "line_number": diag.line,
                "error_type": "SyntaxError",
            })));
        }
        Ok(formatted) => formatted,
    };

    let formatted_lines = formatted.formatted_code.lines().count();
    Ok(if formatted.changed {
        Envelope::success("Code has been formatted successfully ✓")
            .with_formatted_code(formatted.formatted_code)
            .with_details(json!({
                "changed": true,
                "original_lines": original_lines,
                "formatted_lines": formatted_lines,
            }))
    } else {
        Envelope::success("Code is already properly formatted ✓")
            .with_formatted_code(formatted.formatted_code)
            .with_details(json!({
                "changed": false,
                "lines": formatted_lines,
            }))
    })
}

#[cfg(feature = "complexity")]
async fn run_complexity(code: String) -> Result<Envelope, AnalysisError> {
    use crate::backends::complexity;

    let lines_analyzed = code.lines().count();
    let result = task::spawn_blocking(move || complexity::analyze(&code))
        .await
        .map_err(join_error)?;

    let report = match result {
        Err(diag) => {
            return Ok(Envelope::error(format!(
                "Cannot analyze complexity due to syntax error on line {}: {}",
                diag.line, diag.message
            )));
        }
        Ok(report) => report,
    };

    let functions_analyzed = report.functions.len();
    let analysis = serde_json::to_value(&report)
        .map_err(|err| AnalysisError::Backend(format!("malformed complexity report: {err}")))?;

    Ok(Envelope::success("Complexity analysis completed ✓")
        .with_analysis(analysis)
        .with_details(json!({
            "functions_analyzed": functions_analyzed,
            "lines_analyzed": lines_analyzed,
        })))
}

fn join_error(err: task::JoinError) -> AnalysisError {
    AnalysisError::Internal(format!("analysis task failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Status;
    use std::time::Duration;

    fn no_lint() -> LintBackend {
        LintBackend::for_tests(None, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_check_valid_code_is_success() {
        let (status, envelope) =
            dispatch(Action::Check, "static X: i32 = 1;".to_string(), &no_lint()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.details.unwrap()["lines"], json!(1));
    }

    #[tokio::test]
    async fn test_check_invalid_code_is_in_band_error() {
        let (status, envelope) = dispatch(Action::Check, "fn f(".to_string(), &no_lint()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, Status::Error);
        let details = envelope.details.unwrap();
        assert_eq!(details["error_type"], json!("SyntaxError"));
        assert_eq!(details["line_number"], json!(1));
    }

    #[tokio::test]
    async fn test_lint_without_backend_is_503() {
        let (status, envelope) =
            dispatch(Action::Lint, "fn main() {}".to_string(), &no_lint()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(envelope.status, Status::Error);
        assert!(envelope.message.contains("not available"));
    }

    #[cfg(feature = "format")]
    #[tokio::test]
    async fn test_format_reports_changed_flag() {
        let (status, envelope) =
            dispatch(Action::Format, "fn main(){let x=1;}".to_string(), &no_lint()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.details.unwrap()["changed"], json!(true));

        let formatted = envelope.formatted_code.unwrap();
        let (_, second) = dispatch(Action::Format, formatted, &no_lint()).await;
        assert_eq!(second.details.unwrap()["changed"], json!(false));
    }

    #[cfg(feature = "format")]
    #[tokio::test]
    async fn test_format_refuses_unparsable_input_in_band() {
        let (status, envelope) = dispatch(Action::Format, "fn f(".to_string(), &no_lint()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, Status::Error);
        assert!(envelope.message.starts_with("Cannot format due to syntax error"));
        assert!(envelope.formatted_code.is_none());
    }

    #[cfg(feature = "complexity")]
    #[tokio::test]
    async fn test_complexity_payload_shape() {
        let code = "fn f(x: i32) -> i32 { if x > 0 { x } else { 0 } }".to_string();
        let (status, envelope) = dispatch(Action::Complexity, code, &no_lint()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, Status::Success);

        let analysis = envelope.analysis.unwrap();
        assert_eq!(analysis["total_complexity"], json!(2));
        assert_eq!(analysis["functions"][0]["name"], json!("f"));
        assert_eq!(analysis["functions"][0]["rank"], json!("A"));
        assert_eq!(envelope.details.unwrap()["functions_analyzed"], json!(1));
    }

    #[tokio::test]
    async fn test_minimal_input_succeeds_for_every_available_action() {
        let code = "static X: i32 = 1;";
        for action in [Action::Check, Action::Format, Action::Complexity] {
            let (status, envelope) = dispatch(action, code.to_string(), &no_lint()).await;
            if matches!(status, StatusCode::SERVICE_UNAVAILABLE) {
                continue; // feature compiled out
            }
            assert_eq!(status, StatusCode::OK, "action {:?}", action);
            assert_eq!(envelope.status, Status::Success, "action {:?}", action);
        }
    }
}
