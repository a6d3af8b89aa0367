//! Style rules and the lint engine that applies them.
//!
//! Rules come in two kinds: textual rules (regex over code lines, with
//! string-literal and comment awareness) and layout rules (line width,
//! trailing whitespace, end-of-file shape). The engine is shared by the
//! `quench-lint` CLI and, through it, by the service's lint backend.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

/// Severity of a style finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Suggestions for improvement.
    Hint = 0,
    /// Informational guidance.
    Info = 1,
    /// Code may have issues.
    Warning = 2,
    /// Code violates a hard rule.
    Error = 3,
}

impl RuleSeverity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hint" => Some(RuleSeverity::Hint),
            "info" => Some(RuleSeverity::Info),
            "warning" => Some(RuleSeverity::Warning),
            "error" => Some(RuleSeverity::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuleSeverity::Hint => "hint",
            RuleSeverity::Info => "info",
            RuleSeverity::Warning => "warning",
            RuleSeverity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A textual style rule with associated metadata.
#[derive(Debug)]
pub struct Rule {
    /// Unique identifier, stable across releases.
    pub id: &'static str,

    /// Human-readable name.
    pub name: &'static str,

    pub severity: RuleSeverity,

    /// What the finding means.
    pub description: &'static str,

    /// Regex matched against each code line.
    pub pattern: Regex,

    /// Suggested replacement, when one exists.
    pub fix_hint: Option<&'static str>,

    /// Whether findings are suppressed inside `#[cfg(test)]` code.
    pub skip_in_tests: bool,
}

/// A single style finding.
#[derive(Debug, Clone, Serialize)]
pub struct StyleDiagnostic {
    /// 1-indexed line number.
    pub line: usize,

    /// 0-indexed column range of the match.
    pub column: usize,
    pub end_column: usize,

    pub severity: RuleSeverity,
    pub rule_id: String,
    pub rule_name: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
}

/// The lint engine: all rules, a disabled set, and the layout limits.
pub struct RuleEngine {
    rules: Vec<Rule>,
    disabled: HashSet<String>,
    max_line_width: usize,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rules: textual_rules(),
            disabled: HashSet::new(),
            max_line_width: crate::config::DEFAULT_MAX_LINE_WIDTH,
        }
    }

    pub fn with_max_line_width(mut self, width: usize) -> Self {
        self.max_line_width = width;
        self
    }

    pub fn with_disabled<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled = ids.into_iter().map(Into::into).collect();
        self
    }

    /// IDs of every known rule, layout rules included.
    pub fn known_rule_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.rules.iter().map(|r| r.id).collect();
        ids.extend([
            "line_too_long",
            "trailing_whitespace",
            "tab_indentation",
            "missing_newline_eof",
            "blank_lines_eof",
        ]);
        ids
    }

    /// Analyze source content and return findings ordered by line.
    pub fn analyze(&self, content: &str) -> Vec<StyleDiagnostic> {
        let mut diagnostics = Vec::new();
        let test_boundary = first_test_attribute_line(content);

        for (line_idx, line) in content.lines().enumerate() {
            self.check_layout(line_idx, line, &mut diagnostics);

            // Textual rules skip comment lines entirely.
            let trimmed = line.trim_start();
            if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
                continue;
            }

            for rule in &self.rules {
                if self.disabled.contains(rule.id) {
                    continue;
                }
                if rule.skip_in_tests
                    && test_boundary.is_some_and(|boundary| line_idx + 1 >= boundary)
                {
                    continue;
                }
                if let Some(mat) = rule.pattern.find(line) {
                    let offset = byte_offset_of(content, line_idx, mat.start());
                    if is_inside_string_literal(content, offset) {
                        continue;
                    }
                    diagnostics.push(StyleDiagnostic {
                        line: line_idx + 1,
                        column: mat.start(),
                        end_column: mat.end(),
                        severity: rule.severity,
                        rule_id: rule.id.to_string(),
                        rule_name: rule.name.to_string(),
                        message: rule.description.to_string(),
                        fix_hint: rule.fix_hint.map(String::from),
                    });
                }
            }
        }

        self.check_eof(content, &mut diagnostics);
        diagnostics.sort_by_key(|d| (d.line, d.column));
        diagnostics
    }

    /// Layout rules applied to every line, comments and strings included.
    fn check_layout(&self, line_idx: usize, line: &str, out: &mut Vec<StyleDiagnostic>) {
        let width = line.chars().count();
        if !self.disabled.contains("line_too_long") && width > self.max_line_width {
            out.push(StyleDiagnostic {
                line: line_idx + 1,
                column: self.max_line_width,
                end_column: width,
                severity: RuleSeverity::Warning,
                rule_id: "line_too_long".to_string(),
                rule_name: "Line Too Long".to_string(),
                message: format!("Line exceeds {} characters ({})", self.max_line_width, width),
                fix_hint: None,
            });
        }

        if !self.disabled.contains("trailing_whitespace")
            && line != line.trim_end()
            && !line.trim_end().is_empty()
        {
            let start = line.trim_end().chars().count();
            out.push(StyleDiagnostic {
                line: line_idx + 1,
                column: start,
                end_column: width,
                severity: RuleSeverity::Hint,
                rule_id: "trailing_whitespace".to_string(),
                rule_name: "Trailing Whitespace".to_string(),
                message: "Trailing whitespace".to_string(),
                fix_hint: None,
            });
        }

        if !self.disabled.contains("tab_indentation") && line.starts_with('\t') {
            out.push(StyleDiagnostic {
                line: line_idx + 1,
                column: 0,
                end_column: line.chars().take_while(|&c| c == '\t').count(),
                severity: RuleSeverity::Warning,
                rule_id: "tab_indentation".to_string(),
                rule_name: "Tab Indentation".to_string(),
                message: "Indentation uses tabs; use four spaces".to_string(),
                fix_hint: None,
            });
        }
    }

    /// End-of-file shape rules.
    fn check_eof(&self, content: &str, out: &mut Vec<StyleDiagnostic>) {
        if content.is_empty() {
            return;
        }
        let last_line = content.lines().count();

        if !self.disabled.contains("missing_newline_eof") && !content.ends_with('\n') {
            out.push(StyleDiagnostic {
                line: last_line,
                column: 0,
                end_column: 0,
                severity: RuleSeverity::Hint,
                rule_id: "missing_newline_eof".to_string(),
                rule_name: "Missing Newline At EOF".to_string(),
                message: "File does not end with a newline".to_string(),
                fix_hint: None,
            });
        }

        if !self.disabled.contains("blank_lines_eof") && content.ends_with("\n\n") {
            out.push(StyleDiagnostic {
                line: last_line,
                column: 0,
                end_column: 0,
                severity: RuleSeverity::Hint,
                rule_id: "blank_lines_eof".to_string(),
                rule_name: "Blank Lines At EOF".to_string(),
                message: "Blank line at end of file".to_string(),
                fix_hint: None,
            });
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// All textual rules.
fn textual_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "unwrap_used",
            name: "Unwrap Used",
            severity: RuleSeverity::Warning,
            description: "Avoid .unwrap(); propagate errors with ? or handle the None/Err case.",
            pattern: Regex::new(r"\.unwrap\(\)").unwrap(),
            fix_hint: Some("value?"),
            skip_in_tests: true,
        },
        Rule {
            id: "expect_used",
            name: "Expect Used",
            severity: RuleSeverity::Warning,
            description: "Avoid .expect(); propagate errors with ? or handle the failure case.",
            pattern: Regex::new(r"\.expect\(").unwrap(),
            fix_hint: Some("value?"),
            skip_in_tests: true,
        },
        Rule {
            id: "panic_macro",
            name: "Panic Macro",
            severity: RuleSeverity::Warning,
            description: "panic! aborts the caller; return a Result instead.",
            pattern: Regex::new(r"\bpanic!\s*\(").unwrap(),
            fix_hint: Some("return Err(...)"),
            skip_in_tests: true,
        },
        Rule {
            id: "todo_macro",
            name: "Placeholder Macro",
            severity: RuleSeverity::Warning,
            description: "todo!/unimplemented! placeholder left in code.",
            pattern: Regex::new(r"\b(todo|unimplemented)!").unwrap(),
            fix_hint: None,
            skip_in_tests: false,
        },
        Rule {
            id: "dbg_macro",
            name: "Debug Macro",
            severity: RuleSeverity::Warning,
            description: "dbg! output left in code.",
            pattern: Regex::new(r"\bdbg!\s*\(").unwrap(),
            fix_hint: None,
            skip_in_tests: false,
        },
        Rule {
            id: "print_macro",
            name: "Print Macro",
            severity: RuleSeverity::Info,
            description: "print/println output left in code; prefer structured logging.",
            pattern: Regex::new(r"\b(println|print|eprintln|eprint)!\s*\(").unwrap(),
            fix_hint: None,
            skip_in_tests: true,
        },
        Rule {
            id: "static_mut",
            name: "Mutable Static",
            severity: RuleSeverity::Error,
            description: "static mut is unsound under concurrent access; use interior mutability.",
            pattern: Regex::new(r"\bstatic\s+mut\b").unwrap(),
            fix_hint: Some("static X: Mutex<T> / AtomicT"),
            skip_in_tests: false,
        },
    ]
}

/// 1-indexed line of the first `#[cfg(test)]` attribute, when present.
/// Findings from test-skipping rules are suppressed from that line on.
fn first_test_attribute_line(content: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.trim_start().starts_with("#[cfg(test)]"))
        .map(|idx| idx + 1)
}

/// Byte offset of column `col` on 0-indexed line `line_idx`.
fn byte_offset_of(content: &str, line_idx: usize, col: usize) -> usize {
    let mut offset = 0;
    for (idx, line) in content.lines().enumerate() {
        if idx == line_idx {
            return offset + col.min(line.len());
        }
        offset += line.len() + 1;
    }
    offset
}

/// Whether a byte offset falls inside a string literal. Handles regular
/// strings with escapes and raw strings (`r"..."`, `r#"..."#`), and skips
/// `//` comments while scanning.
fn is_inside_string_literal(content: &str, byte_offset: usize) -> bool {
    let bytes = content.as_bytes();
    let mut i = 0;

    while i < byte_offset && i < bytes.len() {
        if i + 1 < bytes.len() && bytes[i] == b'/' && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        // Raw string: r"..." or r#"..."# with any hash count.
        if bytes[i] == b'r' && i + 1 < bytes.len() {
            let mut hash_count = 0;
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] == b'#' {
                hash_count += 1;
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'"' {
                j += 1;
                while j < bytes.len() {
                    if bytes[j] == b'"' {
                        let mut closing = 0;
                        let mut k = j + 1;
                        while k < bytes.len() && bytes[k] == b'#' && closing < hash_count {
                            closing += 1;
                            k += 1;
                        }
                        if closing == hash_count {
                            if byte_offset > i && byte_offset < k {
                                return true;
                            }
                            i = k;
                            break;
                        }
                    }
                    j += 1;
                }
                continue;
            }
        }

        // Regular string with escape handling.
        if bytes[i] == b'"' {
            let start = i;
            i += 1;
            while i < bytes.len() {
                if bytes[i] == b'\\' && i + 1 < bytes.len() {
                    i += 2;
                    continue;
                }
                if bytes[i] == b'"' {
                    if byte_offset > start && byte_offset <= i {
                        return true;
                    }
                    i += 1;
                    break;
                }
                i += 1;
            }
            continue;
        }

        i += 1;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(diags: &[StyleDiagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.rule_id.as_str()).collect()
    }

    #[test]
    fn test_detects_unwrap() {
        let diags = RuleEngine::new().analyze("fn f() { Some(5).unwrap(); }\n");
        assert!(ids(&diags).contains(&"unwrap_used"));
        let diag = diags.iter().find(|d| d.rule_id == "unwrap_used").unwrap();
        assert_eq!(diag.line, 1);
        assert_eq!(diag.severity, RuleSeverity::Warning);
    }

    #[test]
    fn test_detects_static_mut_as_error() {
        let diags = RuleEngine::new().analyze("static mut COUNTER: u32 = 0;\n");
        let diag = diags.iter().find(|d| d.rule_id == "static_mut").unwrap();
        assert_eq!(diag.severity, RuleSeverity::Error);
    }

    #[test]
    fn test_detects_line_too_long_with_configured_width() {
        let line = format!("{};\n", "a".repeat(100));
        let diags = RuleEngine::new().with_max_line_width(88).analyze(&line);
        assert!(ids(&diags).contains(&"line_too_long"));

        let diags = RuleEngine::new().with_max_line_width(120).analyze(&line);
        assert!(!ids(&diags).contains(&"line_too_long"));
    }

    #[test]
    fn test_detects_eof_shape() {
        let diags = RuleEngine::new().analyze("fn f() {}");
        assert!(ids(&diags).contains(&"missing_newline_eof"));

        let diags = RuleEngine::new().analyze("fn f() {}\n\n");
        assert!(ids(&diags).contains(&"blank_lines_eof"));

        let diags = RuleEngine::new().analyze("fn f() {}\n");
        assert!(!ids(&diags).contains(&"missing_newline_eof"));
        assert!(!ids(&diags).contains(&"blank_lines_eof"));
    }

    #[test]
    fn test_string_literal_matches_are_suppressed() {
        let diags = RuleEngine::new().analyze("fn f() { let s = \"call .unwrap() later\"; }\n");
        assert!(!ids(&diags).contains(&"unwrap_used"));
    }

    #[test]
    fn test_comment_lines_are_skipped_for_textual_rules() {
        let diags = RuleEngine::new().analyze("// Some(5).unwrap() would be bad\n");
        assert!(!ids(&diags).contains(&"unwrap_used"));
    }

    #[test]
    fn test_disable_suppresses_rule() {
        let code = "fn f() { Some(5).unwrap(); }\n";
        let diags = RuleEngine::new().with_disabled(["unwrap_used"]).analyze(code);
        assert!(!ids(&diags).contains(&"unwrap_used"));
    }

    #[test]
    fn test_unwrap_allowed_after_test_attribute() {
        let code = "#[cfg(test)]\nmod tests {\n    fn t() { Some(5).unwrap(); }\n}\n";
        let diags = RuleEngine::new().analyze(code);
        assert!(!ids(&diags).contains(&"unwrap_used"));
    }

    #[test]
    fn test_diagnostics_sorted_by_line() {
        let code = "fn f() { Some(5).unwrap(); }\nstatic mut X: u32 = 0;\n";
        let diags = RuleEngine::new().analyze(code);
        let lines: Vec<usize> = diags.iter().map(|d| d.line).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
    }

    #[test]
    fn test_tab_indentation_detected() {
        let diags = RuleEngine::new().analyze("\tlet x = 1;\n");
        assert!(ids(&diags).contains(&"tab_indentation"));
    }
}
