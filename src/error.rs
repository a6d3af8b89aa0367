//! Error taxonomy for the analysis pipeline.
//!
//! Every failure the dispatcher can surface maps to exactly one variant
//! here, and every variant maps to exactly one HTTP status code. Syntax
//! errors in the *submitted* code are not represented here; those are an
//! expected analysis outcome and travel in-band as a 200 response.

use axum::http::StatusCode;
use thiserror::Error;

/// A failure produced while handling an analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The request payload failed validation, or the action is not
    /// recognized. Returned before any backend is invoked.
    #[error("{0}")]
    InvalidInput(String),

    /// The client exceeded its per-minute request budget.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded,

    /// The requested backend capability is not installed or enabled.
    #[error("{0}")]
    Unavailable(String),

    /// A backend exceeded its wall-clock budget and was terminated.
    #[error("{0}")]
    Timeout(String),

    /// The backend was invoked but failed, or produced output the
    /// service could not interpret.
    #[error("{0}")]
    Backend(String),

    /// Anything uncaught. The caller only ever sees the generic message.
    #[error("An unexpected error occurred while processing your code.")]
    Internal(String),
}

impl AnalysisError {
    /// The HTTP status code this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AnalysisError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to the caller. Internal detail never leaks: the
    /// `Internal` variant always reports its generic display text.
    pub fn public_message(&self) -> String {
        self.to_string()
    }
}
