//! Code formatting via `prettyplease`.
//!
//! A pure function over text: parse the snippet as a full module, then
//! pretty-print it with the fixed house style. Formatting is never
//! attempted on unparsable input; the parse precheck reuses the syntax
//! checker's diagnostic shape.

use crate::backends::syntax::{self, SyntaxDiagnostic};

/// Result of formatting a snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatResult {
    /// Whether formatting changed anything beyond leading/trailing
    /// whitespace.
    pub changed: bool,
    pub formatted_code: String,
}

/// Format the snippet, or report why it cannot be parsed.
pub fn format_source(code: &str) -> Result<FormatResult, SyntaxDiagnostic> {
    let ast = syntax::parse_ast(code)?;
    let formatted_code = prettyplease::unparse(&ast);

    // Trailing/leading whitespace differences alone are not a change.
    let changed = formatted_code.trim() != code.trim();

    Ok(FormatResult {
        changed,
        formatted_code,
    })
}
