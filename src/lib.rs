//! Quench - a stateless code analysis service for Rust snippets.
//!
//! This crate provides an HTTP service that accepts a snippet of Rust
//! source text and an action selector, and returns a syntax verdict, lint
//! findings, a reformatted version of the code, or a complexity report.
//! The style-rule engine is also available directly and powers the
//! `quench-lint` companion binary.
//!
//! # Usage
//!
//! ```rust
//! use quench::RuleEngine;
//!
//! let diagnostics = RuleEngine::new().analyze("fn f() { Some(1).unwrap(); }\n");
//!
//! for diag in &diagnostics {
//!     println!("{}:{}: [{}] {}", diag.line, diag.column, diag.rule_id, diag.message);
//! }
//! ```

pub mod backends;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod output;
pub mod rate_limit;
pub mod rules;
pub mod server;
pub mod validate;

pub use backends::{Action, Capabilities};
pub use config::{LintSettings, ServiceConfig};
pub use envelope::{Envelope, Status};
pub use error::AnalysisError;
pub use output::{format_diagnostics, OutputFormat};
pub use rate_limit::RateLimiter;
pub use rules::{RuleEngine, RuleSeverity, StyleDiagnostic};
pub use validate::{InputValidator, ValidationOutcome};
