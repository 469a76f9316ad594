//! Init command: write a configuration for packages that have none

use std::path::Path;

use console::style;
use depalign_core::config::default_presets;
use depalign_core::{KitType, Result};
use depalign_manifest::{PackageCache, PackageManifest};
use depalign_resolver::{initialize_config, AlignOptions, AlignWorkflow, InitOutcome};
use tracing::info;

use super::{fail, selected_manifests};
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Initialize the package at `manifest_path`, writing the result to disk
fn initialize(
    manifest_path: &Path,
    kit_type: KitType,
    cli: &Cli,
    workflow: &AlignWorkflow,
    packages: &mut PackageCache,
) -> Result<InitOutcome> {
    let manifest = PackageManifest::load(manifest_path)?;
    manifest.ensure_valid()?;
    let project_root = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let presets = if cli.presets.is_empty() {
        default_presets()
    } else {
        cli.presets.clone()
    };
    let store = workflow.load_store(&presets, project_root, packages)?;

    let outcome = initialize_config(
        &manifest,
        kit_type,
        &presets,
        store.merged(),
        &cli.capabilities,
    )?;
    if let InitOutcome::Initialized(updated) = &outcome {
        updated.save()?;
    }
    Ok(outcome)
}

/// Execute the init command
pub fn execute(cli: &Cli, kit_type: KitType) -> anyhow::Result<i32> {
    info!(kit_type = %kit_type, capabilities = ?cli.capabilities, "executing init command");

    let manifests = match selected_manifests(cli) {
        Ok(manifests) => manifests,
        Err(e) => return Ok(fail(&e)),
    };

    let workflow = AlignWorkflow::new(AlignOptions {
        custom_profiles: cli.custom_profiles.clone(),
        ..Default::default()
    });
    let mut packages = PackageCache::new();
    let mut code = exit_codes::SUCCESS;
    let mut results = Vec::new();

    for manifest_path in &manifests {
        let display = manifest_path.display().to_string();
        let (status, exit_code) = match initialize(manifest_path, kit_type, cli, &workflow, &mut packages) {
            Ok(InitOutcome::Initialized(_)) => ("initialized", exit_codes::SUCCESS),
            Ok(InitOutcome::AlreadyConfigured) => ("already-configured", exit_codes::SUCCESS),
            Ok(InitOutcome::MissingPlatform) => ("missing-react-native", exit_codes::CONFIG_ERROR),
            Err(e) => {
                if cli.format == OutputFormat::Text {
                    output::error(&format!("{}: {}", display, e));
                }
                results.push(serde_json::json!({
                    "path": display,
                    "status": "failed",
                    "error": e.to_string()
                }));
                code = exit_codes::worst(code, exit_codes::for_error(&e));
                continue;
            }
        };
        code = exit_codes::worst(code, exit_code);

        if cli.format == OutputFormat::Text && !cli.quiet {
            match status {
                "initialized" => output::success(&format!(
                    "{}: initialized as {}",
                    style(&display).cyan(),
                    kit_type
                )),
                "already-configured" => output::info(&format!("{}: already configured", display)),
                _ => output::warning(&format!(
                    "{}: does not depend on react-native",
                    display
                )),
            }
        }
        results.push(serde_json::json!({
            "path": display,
            "status": status,
        }));
    }

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("depalign").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_initialize_writes_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        std::fs::write(
            &path,
            r#"{ "name": "lib", "version": "1.0.0", "peerDependencies": { "react-native": "^0.74.0" } }"#,
        )
        .unwrap();

        let cli = cli(&["--init", "library", "--capabilities", "svg"]);
        let workflow = AlignWorkflow::new(AlignOptions::default());
        let outcome = initialize(
            &path,
            KitType::Library,
            &cli,
            &workflow,
            &mut PackageCache::new(),
        )
        .unwrap();
        assert!(matches!(outcome, InitOutcome::Initialized(_)));

        let written = PackageManifest::load(&path).unwrap();
        let config = written.kit_config().unwrap();
        assert_eq!(config["kitType"], "library");
        assert_eq!(
            config["alignDeps"]["requirements"]["production"],
            json!(["react-native@0.74"])
        );
        assert!(config["alignDeps"]["capabilities"]
            .as_array()
            .unwrap()
            .contains(&json!("svg")));
    }

    #[test]
    fn test_initialize_without_platform() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        let content = r#"{ "name": "tool", "version": "1.0.0" }"#;
        std::fs::write(&path, content).unwrap();

        let cli = cli(&["--init", "app"]);
        let workflow = AlignWorkflow::new(AlignOptions::default());
        let outcome =
            initialize(&path, KitType::App, &cli, &workflow, &mut PackageCache::new()).unwrap();

        assert_eq!(outcome, InitOutcome::MissingPlatform);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }
}
