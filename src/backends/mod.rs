//! The four analysis backends and their capability registry.
//!
//! Each backend is independently optional: the formatter and complexity
//! analyzer are Cargo features, the linter depends on an external binary
//! resolved at startup, and the syntax checker is always compiled in.
//! Availability is determined once at startup and exposed uniformly to
//! both the health endpoint and the dispatcher.

#[cfg(feature = "complexity")]
pub mod complexity;
#[cfg(feature = "format")]
pub mod format;
pub mod lint;
pub mod syntax;

use std::str::FromStr;

use serde::Serialize;

/// The analysis a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Check,
    Lint,
    Format,
    Complexity,
}

impl Action {
    /// The accepted selector values, in the order they are documented.
    pub const VALID_SET: &'static str = "check, lint, format, complexity";
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check" => Ok(Action::Check),
            "lint" => Ok(Action::Lint),
            "format" => Ok(Action::Format),
            "complexity" => Ok(Action::Complexity),
            other => Err(format!(
                "Invalid action '{}'. Must be one of: {}",
                other,
                Action::VALID_SET
            )),
        }
    }
}

/// Which backends are available in this process. Built once at startup.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capabilities {
    pub syntax_check: bool,
    pub linting: bool,
    pub formatting: bool,
    pub complexity_analysis: bool,
}

impl Capabilities {
    /// Detect capabilities. The syntax checker is always built in; the
    /// formatter and complexity analyzer follow compile-time features;
    /// linting follows the startup probe for the external binary.
    pub fn detect(lint_available: bool) -> Self {
        Self {
            syntax_check: true,
            linting: lint_available,
            formatting: cfg!(feature = "format"),
            complexity_analysis: cfg!(feature = "complexity"),
        }
    }
}
