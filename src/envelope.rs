//! The uniform response envelope returned for every request outcome.
//!
//! Every response from `/process_code` (success, in-band diagnostic, or
//! HTTP-level error) serializes to this one shape. Envelopes are built
//! fresh per request and never mutated after construction.

use serde::Serialize;
use serde_json::Value;

use crate::error::AnalysisError;

/// Top-level outcome marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The requested analysis completed and produced a clean result.
    Success,
    /// The request failed, or the submitted code carries a diagnostic
    /// (e.g. a syntax error) reported in-band.
    Error,
    /// Linting completed and found issues.
    LintErrors,
}

/// The response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: Status,
    pub message: String,

    /// Action-specific structured metadata (line counts, flags, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    /// Lint findings, one formatted line per issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,

    /// Reformatted source, present for format responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_code: Option<String>,

    /// Complexity report, present for complexity responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Status::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    pub fn lint_errors(message: impl Into<String>) -> Self {
        Self::new(Status::LintErrors, message)
    }

    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            errors: None,
            formatted_code: None,
            analysis: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_formatted_code(mut self, code: impl Into<String>) -> Self {
        self.formatted_code = Some(code.into());
        self
    }

    pub fn with_analysis(mut self, analysis: Value) -> Self {
        self.analysis = Some(analysis);
        self
    }
}

impl From<&AnalysisError> for Envelope {
    fn from(err: &AnalysisError) -> Self {
        Envelope::error(err.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(Status::LintErrors).unwrap(),
            json!("lint_errors")
        );
        assert_eq!(serde_json::to_value(Status::Success).unwrap(), json!("success"));
        assert_eq!(serde_json::to_value(Status::Error).unwrap(), json!("error"));
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let value = serde_json::to_value(Envelope::success("ok")).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["status"], json!("success"));
        assert_eq!(obj["message"], json!("ok"));
    }

    #[test]
    fn test_builder_attaches_payloads() {
        let value = serde_json::to_value(
            Envelope::lint_errors("Found 1 linting issue(s)")
                .with_errors(vec!["Line 1:0: warning [tab_indentation] tab".into()])
                .with_details(json!({"issues_count": 1})),
        )
        .unwrap();
        assert_eq!(value["status"], json!("lint_errors"));
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
        assert_eq!(value["details"]["issues_count"], json!(1));
    }

    #[test]
    fn test_error_envelope_uses_public_message() {
        let err = AnalysisError::Internal("private detail".into());
        let env = Envelope::from(&err);
        assert_eq!(env.status, Status::Error);
        assert!(!env.message.contains("private"));
    }
}
