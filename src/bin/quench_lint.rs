//! quench-lint - command-line interface for the quench style rules.
//!
//! Lints files or directories and prints findings in one of several
//! formats. The service's lint backend invokes this binary with
//! `--format compact` against a temp artifact.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use walkdir::WalkDir;

use quench::output::{format_diagnostics, OutputFormat};
use quench::rules::{RuleEngine, RuleSeverity, StyleDiagnostic};

/// Lint Rust sources with the quench style rules.
#[derive(Parser, Debug)]
#[command(name = "quench-lint")]
#[command(version)]
#[command(about = "Lint Rust code with the quench style rules", long_about = None)]
struct Args {
    /// Files or directories to lint.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "pretty")]
    format: OutputFormatArg,

    /// Minimum severity to report.
    #[arg(short, long, value_enum, default_value = "hint")]
    severity: SeverityArg,

    /// Rules to disable (repeatable, or comma-separated rule IDs).
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Maximum allowed line width.
    #[arg(long, default_value_t = 88)]
    max_line_width: usize,

    /// Show fix suggestions.
    #[arg(long, default_value = "true")]
    show_fixes: bool,

    /// Only show files with diagnostics.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SeverityArg {
    Error,
    Warning,
    Info,
    Hint,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Pretty => OutputFormat::Pretty,
            OutputFormatArg::Compact => OutputFormat::Compact,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

impl From<SeverityArg> for RuleSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Error => RuleSeverity::Error,
            SeverityArg::Warning => RuleSeverity::Warning,
            SeverityArg::Info => RuleSeverity::Info,
            SeverityArg::Hint => RuleSeverity::Hint,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let engine = RuleEngine::new()
        .with_max_line_width(args.max_line_width)
        .with_disabled(args.disable.unwrap_or_default());
    let min_severity: RuleSeverity = args.severity.into();
    let format: OutputFormat = args.format.into();

    // Collect all Rust files.
    let files: Vec<PathBuf> = args
        .paths
        .iter()
        .flat_map(|path| {
            if path.is_dir() {
                WalkDir::new(path)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| {
                        entry.path().extension().map_or(false, |ext| ext == "rs")
                    })
                    .map(|entry| entry.path().to_path_buf())
                    .collect::<Vec<_>>()
            } else {
                vec![path.clone()]
            }
        })
        .collect();

    if files.is_empty() {
        eprintln!("{}", "No Rust files found to lint.".yellow());
        return ExitCode::SUCCESS;
    }

    // Lint files in parallel.
    let results: Vec<(PathBuf, Vec<StyleDiagnostic>)> = files
        .par_iter()
        .filter_map(|file| match std::fs::read_to_string(file) {
            Ok(content) => {
                let diagnostics: Vec<StyleDiagnostic> = engine
                    .analyze(&content)
                    .into_iter()
                    .filter(|diag| diag.severity >= min_severity)
                    .collect();
                Some((file.clone(), diagnostics))
            }
            Err(err) => {
                eprintln!("{}: {} - {}", "Error".red().bold(), file.display(), err);
                None
            }
        })
        .collect();

    let mut total_errors = 0usize;
    let mut total_warnings = 0usize;
    let mut total_other = 0usize;

    for (file, diagnostics) in &results {
        for diag in diagnostics {
            match diag.severity {
                RuleSeverity::Error => total_errors += 1,
                RuleSeverity::Warning => total_warnings += 1,
                _ => total_other += 1,
            }
        }

        if diagnostics.is_empty() && args.quiet {
            continue;
        }
        if !diagnostics.is_empty() || !args.quiet {
            let output = format_diagnostics(file, diagnostics, format, args.show_fixes);
            print!("{}", output);
        }
    }

    let total = total_errors + total_warnings + total_other;
    if matches!(format, OutputFormat::Pretty) {
        if total > 0 {
            println!();
            println!(
                "{} {} ({} errors, {} warnings, {} other)",
                "Found".bold(),
                format!("{} issues", total).bold(),
                total_errors.to_string().red().bold(),
                total_warnings.to_string().yellow().bold(),
                total_other
            );
        } else {
            println!("{}", "✓ No issues found!".green().bold());
        }
    }

    if total_errors > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
