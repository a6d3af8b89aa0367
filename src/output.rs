//! Output formatters for lint diagnostics.
//!
//! The compact format is the machine contract consumed by the service's
//! lint backend; pretty is for humans, json for tooling.

use std::path::Path;

use colored::Colorize;

use crate::rules::{RuleSeverity, StyleDiagnostic};

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored output.
    Pretty,
    /// One line per diagnostic: `path:line:col: severity [rule] message`.
    Compact,
    /// JSON array for tooling integration.
    Json,
}

/// Format diagnostics for one file.
pub fn format_diagnostics(
    file: &Path,
    diagnostics: &[StyleDiagnostic],
    format: OutputFormat,
    show_fixes: bool,
) -> String {
    match format {
        OutputFormat::Pretty => format_pretty(file, diagnostics, show_fixes),
        OutputFormat::Compact => format_compact(file, diagnostics),
        OutputFormat::Json => format_json(file, diagnostics),
    }
}

fn format_pretty(file: &Path, diagnostics: &[StyleDiagnostic], show_fixes: bool) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "\n{}\n",
        file.display().to_string().bold().underline()
    ));

    for diag in diagnostics {
        let severity_str = match diag.severity {
            RuleSeverity::Error => "error".red().bold(),
            RuleSeverity::Warning => "warning".yellow().bold(),
            RuleSeverity::Info => "info".blue().bold(),
            RuleSeverity::Hint => "hint".dimmed(),
        };

        output.push_str(&format!(
            "  {} {} [{}] {}\n",
            format!("{}:{}", diag.line, diag.column).dimmed(),
            severity_str,
            diag.rule_id.cyan(),
            diag.message
        ));

        if show_fixes {
            if let Some(ref fix) = diag.fix_hint {
                output.push_str(&format!("    {} {}\n", "fix:".dimmed(), fix));
            }
        }
    }

    output
}

fn format_compact(file: &Path, diagnostics: &[StyleDiagnostic]) -> String {
    let mut output = String::new();
    for diag in diagnostics {
        output.push_str(&format!(
            "{}:{}:{}: {} [{}] {}\n",
            file.display(),
            diag.line,
            diag.column,
            diag.severity,
            diag.rule_id,
            diag.message
        ));
    }
    output
}

fn format_json(file: &Path, diagnostics: &[StyleDiagnostic]) -> String {
    let entries: Vec<serde_json::Value> = diagnostics
        .iter()
        .map(|diag| {
            serde_json::json!({
                "file": file.display().to_string(),
                "line": diag.line,
                "column": diag.column,
                "end_column": diag.end_column,
                "severity": diag.severity.to_string(),
                "rule_id": diag.rule_id,
                "rule_name": diag.rule_name,
                "message": diag.message,
                "fix": diag.fix_hint,
            })
        })
        .collect();
    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleEngine;

    fn sample() -> Vec<StyleDiagnostic> {
        RuleEngine::new().analyze("fn f() { Some(5).unwrap(); }\n")
    }

    #[test]
    fn test_compact_format_is_the_machine_contract() {
        let diags = sample();
        let output = format_compact(Path::new("/tmp/snippet.rs"), &diags);
        let first = output.lines().next().unwrap();
        assert!(first.starts_with("/tmp/snippet.rs:1:"));
        assert!(first.contains("warning [unwrap_used]"));
    }

    #[test]
    fn test_json_format_parses_back() {
        let diags = sample();
        let output = format_json(Path::new("snippet.rs"), &diags);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), diags.len());
        assert_eq!(parsed[0]["file"], "snippet.rs");
        assert_eq!(parsed[0]["rule_id"], "unwrap_used");
    }

    #[test]
    fn test_pretty_format_empty_is_silent() {
        assert!(format_pretty(Path::new("clean.rs"), &[], true).is_empty());
    }
}
