//! Input validation for submitted code payloads.
//!
//! Size and emptiness checks gate the pipeline; the sensitive-pattern scan
//! is telemetry only. The service processes arbitrary user code, so pattern
//! detection is deliberately observational; isolation is the job of how
//! backends execute, not of this filter.

use tracing::warn;

/// Patterns worth flagging in submitted snippets. Matched
/// case-insensitively as plain substrings; hits are logged for audit and
/// never block the request.
const SENSITIVE_PATTERNS: &[&str] = &[
    "std::process",
    "std::fs",
    "std::net",
    "std::env",
    "unsafe",
    "transmute",
    "libc::",
    "asm!",
    "include_str!",
    "include_bytes!",
];

/// Outcome of validating one code payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(String),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

/// Validates code payloads before any backend is invoked.
pub struct InputValidator {
    max_code_chars: usize,
}

impl InputValidator {
    pub fn new(max_code_chars: usize) -> Self {
        Self { max_code_chars }
    }

    /// Check a payload. The rejection message for a given failure class is
    /// identical regardless of the requested action.
    pub fn validate(&self, code: &str) -> ValidationOutcome {
        if code.trim().is_empty() {
            return ValidationOutcome::Invalid("Code input cannot be empty".to_string());
        }

        if code.chars().count() > self.max_code_chars {
            return ValidationOutcome::Invalid(format!(
                "Code input is too large (max {} characters)",
                self.max_code_chars
            ));
        }

        self.scan_sensitive_patterns(code);

        ValidationOutcome::Valid
    }

    /// Log any sensitive patterns present in the payload. Never changes
    /// the validation outcome.
    fn scan_sensitive_patterns(&self, code: &str) {
        let lowered = code.to_lowercase();
        for pattern in SENSITIVE_PATTERNS {
            if lowered.contains(pattern) {
                warn!(pattern, "sensitive code pattern detected in submission");
            }
        }
    }
}
