//! Set-version command: bump the react-native requirements of configured packages

use std::path::Path;

use depalign_core::config::{is_configured, read_kit_config, PLATFORM_PACKAGE};
use depalign_core::{ProfileVersion, Result};
use depalign_manifest::{PackageCache, PackageManifest};
use depalign_presets::builtin::react_native;
use depalign_resolver::{
    parse_versions, set_version, AlignOptions, AlignReport, AlignStatus, AlignWorkflow,
    VersionSelection,
};
use dialoguer::{MultiSelect, Select};
use tracing::{debug, info};

use super::{fail, selected_manifests};
use crate::cli::output::{self, Reporter};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Ask which versions are supported, and which one is used for development
fn prompt_versions(known: &[ProfileVersion]) -> anyhow::Result<Option<VersionSelection>> {
    let items: Vec<String> = known.iter().map(ToString::to_string).collect();
    let Some(selected) = MultiSelect::new()
        .with_prompt(format!("Select all supported versions of `{}`", PLATFORM_PACKAGE))
        .items(&items)
        .interact_opt()?
    else {
        return Ok(None);
    };
    let supported: Vec<ProfileVersion> = selected.iter().map(|&i| known[i].clone()).collect();

    let target = match supported.len() {
        0 => return Ok(None),
        1 => supported[0].clone(),
        _ => {
            let choices: Vec<String> = supported.iter().map(ToString::to_string).collect();
            let Some(index) = Select::new()
                .with_prompt(format!("Select development version of `{}`", PLATFORM_PACKAGE))
                .items(&choices)
                .default(choices.len() - 1)
                .interact_opt()?
            else {
                return Ok(None);
            };
            supported[index].clone()
        }
    };

    let mut versions = vec![target];
    versions.extend(supported);
    Ok(VersionSelection::new(versions))
}

/// Outcome of updating one package
enum Update {
    /// The package has no alignment configuration
    Skipped,
    /// The package was checked, and updated if the check passed
    Checked(AlignReport),
}

/// Check a package, then rewrite its requirements and align it to them.
///
/// Packages that do not pass the check are left untouched.
fn update_package(
    manifest_path: &Path,
    selection: &VersionSelection,
    check: &AlignWorkflow,
    write: &AlignWorkflow,
    packages: &mut PackageCache,
) -> Result<Update> {
    let mut manifest = PackageManifest::load(manifest_path)?;
    manifest.ensure_valid()?;
    let package_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let Some(kit) = read_kit_config(package_dir, &manifest.to_value())?.filter(is_configured)
    else {
        debug!(path = %manifest_path.display(), "skipping unconfigured package");
        return Ok(Update::Skipped);
    };

    let report = check.execute(manifest_path, packages)?;
    if report.status != AlignStatus::Success {
        return Ok(Update::Checked(report));
    }

    set_version(&mut manifest, &kit, selection)?;
    manifest.save()?;
    packages.invalidate();

    Ok(Update::Checked(write.execute(manifest_path, packages)?))
}

/// Execute the set-version command
pub fn execute(cli: &Cli, versions: Option<&str>) -> anyhow::Result<i32> {
    info!(versions = versions, "executing set-version command");

    let known = react_native::preset().versions();
    let selection = match versions.filter(|v| !v.is_empty()) {
        Some(versions) => match parse_versions(versions, &known) {
            Ok(selection) => selection,
            Err(e) => return Ok(fail(&e)),
        },
        None => match prompt_versions(&known)? {
            Some(selection) => selection,
            None => {
                if !cli.quiet {
                    output::warning("Cancelled");
                }
                return Ok(exit_codes::CANCELLED);
            }
        },
    };
    debug!(development = %selection.target, supported = ?selection.supported, "selected versions");

    let manifests = match selected_manifests(cli) {
        Ok(manifests) => manifests,
        Err(e) => return Ok(fail(&e)),
    };

    let base = AlignOptions {
        diff_mode: cli.diff_mode.into(),
        exclude_packages: cli.exclude_packages.clone(),
        custom_profiles: cli.custom_profiles.clone(),
        ..Default::default()
    };
    let check = AlignWorkflow::new(base.clone());
    let write = AlignWorkflow::new(AlignOptions {
        write: true,
        ..base
    });

    let mut packages = PackageCache::new();
    let mut reporter = Reporter::new(cli);
    let mut code = exit_codes::SUCCESS;

    for manifest_path in &manifests {
        match update_package(manifest_path, &selection, &check, &write, &mut packages) {
            Ok(Update::Skipped) => {
                if cli.verbose && cli.format == OutputFormat::Text {
                    output::info(&format!("{}: not configured", manifest_path.display()));
                }
            }
            Ok(Update::Checked(report)) => {
                if report.status == AlignStatus::Unsatisfied {
                    code = exit_codes::worst(code, exit_codes::UNSATISFIED);
                }
                reporter.report(report);
            }
            Err(e) => {
                let exit_code = exit_codes::for_error(&e);
                code = exit_codes::worst(code, exit_code);
                reporter.failure(manifest_path.clone(), e.to_string(), exit_code);
            }
        }
    }

    reporter.finish()?;
    Ok(code)
}
