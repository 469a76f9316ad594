//! Output formatting utilities

use std::path::PathBuf;

use console::{style, Style};
use depalign_resolver::{AlignReport, AlignStatus};
use serde::Serialize;

use crate::cli::{Cli, OutputFormat};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for version numbers
pub fn version_style() -> Style {
    Style::new().green().bold()
}

/// Style for paths
pub fn path_style() -> Style {
    Style::new().cyan()
}

/// Outcome of one package, as emitted with `--format json`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PackageResult {
    Report(AlignReport),
    Failed {
        path: PathBuf,
        error: String,
        #[serde(rename = "exitCode")]
        exit_code: i32,
    },
}

/// Collects per-package results and prints them in the selected format
pub struct Reporter<'a> {
    cli: &'a Cli,
    results: Vec<PackageResult>,
}

impl<'a> Reporter<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            results: Vec::new(),
        }
    }

    /// Record a report; text output is printed immediately
    pub fn report(&mut self, report: AlignReport) {
        if self.cli.format == OutputFormat::Text && !self.cli.quiet {
            print_report(&report, self.cli.verbose);
        }
        self.results.push(PackageResult::Report(report));
    }

    /// Record a package that could not be processed
    pub fn failure(&mut self, path: PathBuf, message: String, exit_code: i32) {
        if self.cli.format == OutputFormat::Text {
            error(&format!("{}: {}", path.display(), message));
        }
        self.results.push(PackageResult::Failed {
            path,
            error: message,
            exit_code,
        });
    }

    /// Print the collected results in JSON format, if selected
    pub fn finish(self) -> anyhow::Result<()> {
        if self.cli.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&self.results)?);
        }
        Ok(())
    }
}

/// Summary line for a report
pub fn summary(report: &AlignReport) -> String {
    let errors = report.error_count();
    let warnings = report.warning_count();
    let mut line = match (errors, warnings) {
        (0, 0) => "no issues found".to_string(),
        (e, 0) => format!("{} error(s)", e),
        (0, w) => format!("{} warning(s)", w),
        (e, w) => format!("{} error(s), {} warning(s)", e, w),
    };
    if report.changes > 0 {
        line.push_str(&format!(", {} change(s) written", report.changes));
    }
    line
}

fn print_report(report: &AlignReport, verbose: bool) {
    let name = if report.package.is_empty() {
        report.path.display().to_string()
    } else {
        report.package.clone()
    };

    match report.status {
        AlignStatus::NotConfigured => {
            if verbose {
                info(&format!("{}: not configured", name));
            }
            return;
        }
        AlignStatus::Excluded => {
            if verbose {
                info(&format!("{}: excluded", name));
            }
            return;
        }
        AlignStatus::Success | AlignStatus::Unsatisfied => {}
    }

    println!("{}", header(&name));
    if verbose {
        println!(
            "{}",
            key_value("path", &path_style().apply_to(report.path.display()).to_string())
        );
        if let Some(kit_type) = report.kit_type {
            println!("{}", key_value("kit type", kit_type.as_str()));
        }
        let versions = |profiles: &[String]| {
            version_style()
                .apply_to(profiles.join(", "))
                .to_string()
        };
        if !report.production_profiles.is_empty() {
            println!("{}", key_value("production", &versions(&report.production_profiles)));
        }
        if !report.development_profiles.is_empty() {
            println!("{}", key_value("development", &versions(&report.development_profiles)));
        }
    }

    for bad in &report.bad_packages {
        println!(
            "  {} {}@{}: {}",
            style("!").yellow(),
            bad.name,
            bad.version,
            bad.reason
        );
    }

    for finding in &report.findings {
        if finding.is_error() {
            println!("  {} {}", style("✗").red(), finding);
        } else {
            println!("  {} {}", style("!").yellow(), finding);
        }
    }

    match report.status {
        AlignStatus::Unsatisfied => println!(
            "{} {}",
            style("✗ Unsatisfied:").red().bold(),
            summary(report)
        ),
        _ => success(&summary(report)),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use depalign_core::{DependencySection, Finding, FindingKind};

    fn report() -> AlignReport {
        AlignReport {
            package: "lib".to_string(),
            path: PathBuf::from("lib/package.json"),
            status: AlignStatus::Unsatisfied,
            kit_type: None,
            production_profiles: vec!["0.74".to_string()],
            development_profiles: vec!["0.74".to_string()],
            findings: vec![
                Finding::in_section(
                    FindingKind::Missing {
                        section: DependencySection::PeerDependencies,
                        package: "react".to_string(),
                        expected: "18.2.0".to_string(),
                    },
                    Some("react".to_string()),
                ),
                Finding::in_section(
                    FindingKind::Missing {
                        section: DependencySection::DevDependencies,
                        package: "react".to_string(),
                        expected: "18.2.0".to_string(),
                    },
                    Some("react".to_string()),
                ),
            ],
            bad_packages: Vec::new(),
            changes: 0,
        }
    }

    #[test]
    fn test_summary() {
        let mut report = report();
        assert_eq!(summary(&report), "1 error(s), 1 warning(s)");

        report.findings.clear();
        report.changes = 2;
        assert_eq!(summary(&report), "no issues found, 2 change(s) written");
    }

    #[test]
    fn test_json_results() {
        let results = vec![
            PackageResult::Report(report()),
            PackageResult::Failed {
                path: PathBuf::from("broken/package.json"),
                error: "Invalid manifest".to_string(),
                exit_code: 2,
            },
        ];
        let value = serde_json::to_value(&results).unwrap();

        assert_eq!(value[0]["package"], "lib");
        assert_eq!(value[0]["status"], "unsatisfied");
        assert_eq!(value[0]["findings"][0]["type"], "missing");
        assert_eq!(value[1]["exitCode"], 2);
        assert_eq!(value[1]["error"], "Invalid manifest");
    }
}
