//! Common display utilities for CLI commands.

use archgate::{Finding, FindingKind, Severity, SourceLocation};
use colored::Colorize;

/// Print findings in production order, compiler style.
pub fn print_findings(findings: &[Finding]) {
    for finding in findings {
        let severity = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };

        match &finding.kind {
            FindingKind::IllegalDependency { location, .. } => {
                println!("{}: {severity}: {}", location_label(location), finding.kind);
            }
            _ => println!("{severity}: {}", finding.kind),
        }
    }
}

/// Print a one-line tally of findings.
pub fn print_summary(findings: &[Finding]) {
    let errors = findings.iter().filter(|f| f.is_error()).count();
    let warnings = findings.len() - errors;

    if findings.is_empty() {
        println!("{}", "No architecture violations found.".green());
        return;
    }

    println!(
        "Found {} error(s) and {} warning(s).",
        errors.to_string().red().bold(),
        warnings.to_string().yellow().bold()
    );
}

fn location_label(location: &SourceLocation) -> String {
    if location.file.is_empty() {
        "<unknown>".to_string()
    } else {
        location.to_string()
    }
}
