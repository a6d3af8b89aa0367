//! Cyclomatic complexity and maintainability analysis.
//!
//! A `syn` visitor records every function and method with its cyclomatic
//! complexity (1 + branch points). The maintainability index uses the
//! classic formula over Halstead volume, total complexity and line count,
//! with token counts taken from the `proc-macro2` token stream.

use std::collections::HashSet;

use proc_macro2::{TokenStream, TokenTree};
use serde::Serialize;
use syn::visit::{self, Visit};
use syn::BinOp;

use crate::backends::syntax::{self, SyntaxDiagnostic};

/// Total-complexity band above which decomposition advice is emitted.
const DECOMPOSE_THRESHOLD: u32 = 20;

/// Per-function complexity above which the function is called out by name.
const HIGH_FUNCTION_THRESHOLD: u32 = 10;

/// Function count above which modularization advice is emitted.
const MANY_FUNCTIONS_THRESHOLD: usize = 10;

/// Complexity of one function or method.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionComplexity {
    pub name: String,
    /// `"function"` for free functions, `"method"` for impl/trait items.
    pub kind: &'static str,
    pub complexity: u32,
    /// 1-indexed line of the definition.
    pub line: usize,
    /// Letter grade for this score.
    pub rank: char,
}

/// Maintainability index: a score, or unavailable for this input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Maintainability {
    Index(f64),
    Unavailable(&'static str),
}

impl Maintainability {
    pub fn unavailable() -> Self {
        Maintainability::Unavailable("N/A")
    }
}

/// The full complexity report for one snippet.
#[derive(Debug, Clone, Serialize)]
pub struct ComplexityReport {
    pub total_complexity: u32,
    pub maintainability_index: Maintainability,
    pub functions: Vec<FunctionComplexity>,
    pub assessment: &'static str,
    pub recommendations: Vec<String>,
}

/// Analyze the snippet, or report why it cannot be parsed.
pub fn analyze(code: &str) -> Result<ComplexityReport, SyntaxDiagnostic> {
    let ast = syntax::parse_ast(code)?;

    let mut collector = FnCollector::default();
    collector.visit_file(&ast);
    let functions = collector.functions;

    let total_complexity: u32 = functions.iter().map(|f| f.complexity).sum();
    let maintainability_index = maintainability_index(code, total_complexity);
    let recommendations = recommendations_for(total_complexity, &functions);

    Ok(ComplexityReport {
        total_complexity,
        maintainability_index,
        functions,
        assessment: assessment_for(total_complexity),
        recommendations,
    })
}

/// Deterministic banding of total complexity. Boundaries are inclusive.
pub fn assessment_for(total_complexity: u32) -> &'static str {
    if total_complexity <= 10 {
        "Low complexity - Easy to maintain"
    } else if total_complexity <= 20 {
        "Moderate complexity - Generally maintainable"
    } else if total_complexity <= 50 {
        "High complexity - Consider refactoring"
    } else {
        "Very high complexity - Refactoring recommended"
    }
}

/// Letter grade for a single function's score.
fn rank_letter(complexity: u32) -> char {
    match complexity {
        0..=5 => 'A',
        6..=10 => 'B',
        11..=20 => 'C',
        21..=30 => 'D',
        31..=40 => 'E',
        _ => 'F',
    }
}

/// Fixed recommendation rules, evaluated in order, each appended
/// independently; the positive fallback fires only when nothing else did.
fn recommendations_for(total_complexity: u32, functions: &[FunctionComplexity]) -> Vec<String> {
    let mut recommendations = Vec::new();

    if total_complexity > DECOMPOSE_THRESHOLD {
        recommendations
            .push("Consider breaking down complex functions into smaller ones".to_string());
    }

    let high: Vec<&str> = functions
        .iter()
        .filter(|f| f.complexity > HIGH_FUNCTION_THRESHOLD)
        .map(|f| f.name.as_str())
        .collect();
    if !high.is_empty() {
        recommendations.push(format!("Functions with high complexity: {}", high.join(", ")));
    }

    if functions.len() > MANY_FUNCTIONS_THRESHOLD {
        recommendations.push("Consider organizing code into smaller modules".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Code complexity looks good! Keep up the good work.".to_string());
    }

    recommendations
}

// ---------------------------------------------------------------------------
// Cyclomatic complexity
// ---------------------------------------------------------------------------

/// Collects every function-like item with its complexity score.
#[derive(Default)]
struct FnCollector {
    functions: Vec<FunctionComplexity>,
}

impl FnCollector {
    fn record(&mut self, name: String, kind: &'static str, line: usize, block: &syn::Block) {
        let mut counter = BranchCounter::default();
        counter.visit_block(block);
        let complexity = 1 + counter.branches;
        self.functions.push(FunctionComplexity {
            name,
            kind,
            complexity,
            line,
            rank: rank_letter(complexity),
        });
    }
}

impl<'ast> Visit<'ast> for FnCollector {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.record(
            node.sig.ident.to_string(),
            "function",
            node.sig.ident.span().start().line,
            &node.block,
        );
        visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.record(
            node.sig.ident.to_string(),
            "method",
            node.sig.ident.span().start().line,
            &node.block,
        );
        visit::visit_impl_item_fn(self, node);
    }

    fn visit_trait_item_fn(&mut self, node: &'ast syn::TraitItemFn) {
        if let Some(block) = &node.default {
            self.record(
                node.sig.ident.to_string(),
                "method",
                node.sig.ident.span().start().line,
                block,
            );
        }
        visit::visit_trait_item_fn(self, node);
    }
}

/// Counts branch points inside one function body. Nested items are
/// skipped, since they are scored as functions of their own; closures
/// count toward the enclosing function.
#[derive(Default)]
struct BranchCounter {
    branches: u32,
}

impl<'ast> Visit<'ast> for BranchCounter {
    fn visit_expr_if(&mut self, node: &'ast syn::ExprIf) {
        self.branches += 1;
        visit::visit_expr_if(self, node);
    }

    fn visit_expr_match(&mut self, node: &'ast syn::ExprMatch) {
        self.branches += node.arms.len().saturating_sub(1) as u32;
        visit::visit_expr_match(self, node);
    }

    fn visit_expr_while(&mut self, node: &'ast syn::ExprWhile) {
        self.branches += 1;
        visit::visit_expr_while(self, node);
    }

    fn visit_expr_for_loop(&mut self, node: &'ast syn::ExprForLoop) {
        self.branches += 1;
        visit::visit_expr_for_loop(self, node);
    }

    fn visit_expr_loop(&mut self, node: &'ast syn::ExprLoop) {
        self.branches += 1;
        visit::visit_expr_loop(self, node);
    }

    fn visit_expr_try(&mut self, node: &'ast syn::ExprTry) {
        self.branches += 1;
        visit::visit_expr_try(self, node);
    }

    fn visit_expr_binary(&mut self, node: &'ast syn::ExprBinary) {
        if matches!(node.op, BinOp::And(_) | BinOp::Or(_)) {
            self.branches += 1;
        }
        visit::visit_expr_binary(self, node);
    }

    fn visit_item(&mut self, _node: &'ast syn::Item) {}
}

// ---------------------------------------------------------------------------
// Maintainability index
// ---------------------------------------------------------------------------

/// `max(0, (171 − 5.2·ln V − 0.23·G − 16.2·ln L) · 100 / 171)`, rounded to
/// two decimals. Unavailable when the Halstead volume cannot be computed.
fn maintainability_index(code: &str, total_complexity: u32) -> Maintainability {
    let lines = code.lines().filter(|l| !l.trim().is_empty()).count();
    let volume = match halstead_volume(code) {
        Some(v) if v > 0.0 && lines > 0 => v,
        _ => return Maintainability::unavailable(),
    };

    let raw = 171.0
        - 5.2 * volume.ln()
        - 0.23 * f64::from(total_complexity)
        - 16.2 * (lines as f64).ln();
    let scaled = (raw * 100.0 / 171.0).clamp(0.0, 100.0);
    Maintainability::Index((scaled * 100.0).round() / 100.0)
}

/// Halstead volume `N · log2(n)` with operators taken from punctuation and
/// group delimiters, operands from identifiers and literals.
fn halstead_volume(code: &str) -> Option<f64> {
    let stream: TokenStream = code.parse().ok()?;
    let mut tally = TokenTally::default();
    tally.consume(stream);

    let distinct = tally.distinct_operators.len() + tally.distinct_operands.len();
    let total = tally.total_operators + tally.total_operands;
    if distinct < 2 || total == 0 {
        return None;
    }
    Some(total as f64 * (distinct as f64).log2())
}

#[derive(Default)]
struct TokenTally {
    distinct_operators: HashSet<String>,
    distinct_operands: HashSet<String>,
    total_operators: usize,
    total_operands: usize,
}

impl TokenTally {
    fn consume(&mut self, stream: TokenStream) {
        for token in stream {
            match token {
                TokenTree::Ident(ident) => self.operand(ident.to_string()),
                TokenTree::Literal(literal) => self.operand(literal.to_string()),
                TokenTree::Punct(punct) => self.operator(punct.as_char().to_string()),
                TokenTree::Group(group) => {
                    self.operator(format!("{:?}", group.delimiter()));
                    self.consume(group.stream());
                }
            }
        }
    }

    fn operand(&mut self, token: String) {
        self.total_operands += 1;
        self.distinct_operands.insert(token);
    }

    fn operator(&mut self, token: String) {
        self.total_operators += 1;
        self.distinct_operators.insert(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_with_branches(name: &str, branches: usize) -> String {
        let mut body = String::new();
        for i in 0..branches {
            body.push_str(&format!("    if x > {} {{ return {}; }}\n", i, i));
        }
        format!("fn {}(x: i32) -> i32 {{\n{}    0\n}}\n", name, body)
    }

    #[test]
    fn test_straight_line_function_scores_one() {
        let report = analyze("fn f() { let x = 1; }").unwrap();
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.functions[0].complexity, 1);
        assert_eq!(report.functions[0].kind, "function");
        assert_eq!(report.functions[0].rank, 'A');
        assert_eq!(report.total_complexity, 1);
    }

    #[test]
    fn test_branch_points_are_counted() {
        let code = r#"
fn f(x: i32) -> i32 {
    if x > 0 {
        while x < 10 {}
    }
    for _ in 0..x {}
    match x {
        0 => 0,
        1 => 1,
        _ => 2,
    }
}
"#;
        let report = analyze(code).unwrap();
        // 1 + if + while + for + (3 arms - 1) = 6
        assert_eq!(report.functions[0].complexity, 6);
        assert_eq!(report.functions[0].rank, 'B');
    }

    #[test]
    fn test_short_circuit_and_try_count() {
        let code = r#"
fn f(a: bool, b: bool) -> Result<bool, ()> {
    let v = some_call()?;
    Ok(a && b || v)
}
fn some_call() -> Result<bool, ()> { Ok(true) }
"#;
        let report = analyze(code).unwrap();
        let f = report.functions.iter().find(|f| f.name == "f").unwrap();
        // 1 + ? + && + || = 4
        assert_eq!(f.complexity, 4);
    }

    #[test]
    fn test_impl_methods_are_reported_as_methods() {
        let code = r#"
struct S;
impl S {
    fn m(&self, x: i32) -> i32 {
        if x > 0 { x } else { -x }
    }
}
"#;
        let report = analyze(code).unwrap();
        assert_eq!(report.functions.len(), 1);
        assert_eq!(report.functions[0].kind, "method");
        assert_eq!(report.functions[0].complexity, 2);
    }

    #[test]
    fn test_nested_functions_are_scored_separately() {
        let code = r#"
fn outer() {
    fn inner(x: i32) -> i32 {
        if x > 0 { x } else { 0 }
    }
    inner(1);
}
"#;
        let report = analyze(code).unwrap();
        let outer = report.functions.iter().find(|f| f.name == "outer").unwrap();
        let inner = report.functions.iter().find(|f| f.name == "inner").unwrap();
        assert_eq!(outer.complexity, 1);
        assert_eq!(inner.complexity, 2);
        assert_eq!(report.total_complexity, 3);
    }

    #[test]
    fn test_total_is_exact_sum_of_functions() {
        let code = format!(
            "{}{}{}",
            function_with_branches("a", 2),
            function_with_branches("b", 4),
            function_with_branches("c", 6)
        );
        let report = analyze(&code).unwrap();
        let sum: u32 = report.functions.iter().map(|f| f.complexity).sum();
        assert_eq!(report.total_complexity, sum);
        assert_eq!(sum, 3 + 5 + 7);
    }

    #[test]
    fn test_assessment_band_boundaries() {
        assert_eq!(assessment_for(10), "Low complexity - Easy to maintain");
        assert_eq!(assessment_for(11), "Moderate complexity - Generally maintainable");
        assert_eq!(assessment_for(20), "Moderate complexity - Generally maintainable");
        assert_eq!(assessment_for(21), "High complexity - Consider refactoring");
        assert_eq!(assessment_for(50), "High complexity - Consider refactoring");
        assert_eq!(assessment_for(51), "Very high complexity - Refactoring recommended");
    }

    #[test]
    fn test_rank_letter_bands() {
        assert_eq!(rank_letter(1), 'A');
        assert_eq!(rank_letter(5), 'A');
        assert_eq!(rank_letter(6), 'B');
        assert_eq!(rank_letter(10), 'B');
        assert_eq!(rank_letter(11), 'C');
        assert_eq!(rank_letter(20), 'C');
        assert_eq!(rank_letter(21), 'D');
        assert_eq!(rank_letter(31), 'E');
        assert_eq!(rank_letter(41), 'F');
    }

    #[test]
    fn test_positive_recommendation_when_nothing_fires() {
        let report = analyze("fn f() { let x = 1; }").unwrap();
        assert_eq!(
            report.recommendations,
            vec!["Code complexity looks good! Keep up the good work.".to_string()]
        );
    }

    #[test]
    fn test_recommendations_fire_independently_and_in_order() {
        // One function with 14 branches: total 15, per-function 15.
        let code = function_with_branches("busy", 14);
        let report = analyze(&code).unwrap();
        assert_eq!(
            report.recommendations,
            vec!["Functions with high complexity: busy".to_string()]
        );

        // Two such functions: total 30 > 20, both named.
        let code = format!(
            "{}{}",
            function_with_branches("busy_a", 14),
            function_with_branches("busy_b", 14)
        );
        let report = analyze(&code).unwrap();
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(
            report.recommendations[0],
            "Consider breaking down complex functions into smaller ones"
        );
        assert_eq!(
            report.recommendations[1],
            "Functions with high complexity: busy_a, busy_b"
        );
    }

    #[test]
    fn test_many_functions_recommendation() {
        let code: String = (0..11).map(|i| format!("fn f{}() {{}}\n", i)).collect();
        let report = analyze(&code).unwrap();
        assert!(report
            .recommendations
            .contains(&"Consider organizing code into smaller modules".to_string()));
    }

    #[test]
    fn test_maintainability_index_available_for_normal_code() {
        let report = analyze("fn f(x: i32) -> i32 { x + 1 }").unwrap();
        match report.maintainability_index {
            Maintainability::Index(score) => {
                assert!(score > 0.0);
                assert!(score <= 100.0);
            }
            other => panic!("expected index, got {:?}", other),
        }
    }

    #[test]
    fn test_maintainability_unavailable_for_empty_module() {
        // An empty module parses but has no tokens to measure.
        let report = analyze("").unwrap();
        assert_eq!(report.maintainability_index, Maintainability::unavailable());
        assert_eq!(report.total_complexity, 0);
    }

    #[test]
    fn test_unparsable_input_reports_syntax_diagnostic() {
        let err = analyze("fn f(").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
