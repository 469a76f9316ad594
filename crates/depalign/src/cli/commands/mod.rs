//! CLI commands

pub mod check;
pub mod init;
pub mod set_version;

use std::path::PathBuf;

use depalign_core::{AlignError, ManifestError};
use depalign_manifest::PackageCache;
use depalign_resolver::{AlignStatus, AlignWorkflow};
use tracing::warn;

use crate::cli::manifests::collect_manifests;
use crate::cli::output::{self, Reporter};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Manifests selected by the package arguments, relative to the working directory
pub(crate) fn selected_manifests(cli: &Cli) -> Result<Vec<PathBuf>, AlignError> {
    let cwd = std::env::current_dir()?;
    let manifests = collect_manifests(&cli.packages, &cwd)?;
    if manifests.is_empty() && !cli.quiet {
        output::warning("No packages found");
    }
    Ok(manifests)
}

/// Print a fatal error and turn it into an exit code
pub(crate) fn fail(error: &AlignError) -> i32 {
    output::error(&error.to_string());
    exit_codes::for_error(error)
}

/// Run the alignment workflow over every manifest and report the results.
///
/// Packages are independent; the worst exit code wins.
pub(crate) fn run_workflow(
    cli: &Cli,
    workflow: &AlignWorkflow,
    manifests: &[PathBuf],
    packages: &mut PackageCache,
) -> anyhow::Result<i32> {
    let mut reporter = Reporter::new(cli);
    let mut code = exit_codes::SUCCESS;

    for manifest in manifests {
        match workflow.execute(manifest, packages) {
            Ok(report) => {
                if report.status == AlignStatus::Unsatisfied {
                    code = exit_codes::worst(code, exit_codes::UNSATISFIED);
                }
                reporter.report(report);
            }
            Err(AlignError::Manifest(ManifestError::NotFound(path))) => {
                warn!(path = %path.display(), "skipping missing manifest");
                if !cli.quiet && cli.format == OutputFormat::Text {
                    output::warning(&format!("{}: no such file", path.display()));
                }
            }
            Err(e) => {
                let exit_code = exit_codes::for_error(&e);
                code = exit_codes::worst(code, exit_code);
                reporter.failure(manifest.clone(), e.to_string(), exit_code);
            }
        }
    }

    reporter.finish()?;
    Ok(code)
}
