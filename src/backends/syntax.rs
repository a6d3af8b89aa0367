//! Syntax checking via `syn`.
//!
//! The snippet is parsed as a full Rust module. Nothing is ever executed:
//! `syn` builds an AST or reports the first parse error with its location.

use syn::parse_file;

/// Result of a syntax check.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxResult {
    /// The snippet parses. Counts describe the submitted text.
    Valid { lines: usize, characters: usize },
    /// The snippet does not parse.
    Invalid(SyntaxDiagnostic),
}

/// Location and message of a parse failure. The same shape is reused by
/// the formatter and complexity backends for their parse precheck.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxDiagnostic {
    /// 1-indexed line of the failure.
    pub line: usize,
    /// 0-indexed column offset of the failure.
    pub column: usize,
    /// The parser's human-readable message.
    pub message: String,
}

/// Parse the snippet without executing it.
pub fn check(code: &str) -> SyntaxResult {
    match parse(code) {
        Ok(()) => SyntaxResult::Valid {
            lines: code.lines().count(),
            characters: code.chars().count(),
        },
        Err(diag) => SyntaxResult::Invalid(diag),
    }
}

/// Parse precheck shared with the formatter and complexity backends.
pub fn parse(code: &str) -> Result<(), SyntaxDiagnostic> {
    parse_ast(code).map(|_| ())
}

pub(crate) fn parse_ast(code: &str) -> Result<syn::File, SyntaxDiagnostic> {
    parse_file(code).map_err(|err| {
        let start = err.span().start();
        SyntaxDiagnostic {
            line: start.line.max(1),
            column: start.column,
            message: err.to_string(),
        }
    })
}
