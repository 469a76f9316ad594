//! Check command: verify, and optionally fix, the dependencies of packages

use depalign_core::config::PLATFORM_PACKAGE;
use depalign_core::{Requirement, Result};
use depalign_manifest::PackageCache;
use depalign_resolver::{AlignOptions, AlignWorkflow, VigilantRequirements};
use tracing::info;

use super::{fail, run_workflow, selected_manifests};
use crate::cli::Cli;

/// Requirements for vigilant inspection.
///
/// `--vigilant 0.74,0.73` yields `react-native@0.74 || 0.73` for production
/// and `react-native@0.74` for development; `--requirements` are added to
/// both. Returns `None` when neither flag is given.
pub fn vigilant_requirements(
    versions: Option<&str>,
    requirements: &[String],
) -> Result<Option<VigilantRequirements>> {
    let versions: Vec<&str> = versions
        .map(|v| v.split(',').map(str::trim).filter(|v| !v.is_empty()).collect())
        .unwrap_or_default();
    if versions.is_empty() && requirements.is_empty() {
        return Ok(None);
    }

    let extra = Requirement::parse_all(requirements)?;
    let mut production = Vec::new();
    let mut development = Vec::new();
    if let Some(target) = versions.first() {
        production.push(Requirement::parse(&format!(
            "{}@{}",
            PLATFORM_PACKAGE,
            versions.join(" || ")
        ))?);
        development.push(Requirement::parse(&format!("{}@{}", PLATFORM_PACKAGE, target))?);
    }
    production.extend(extra.iter().cloned());
    development.extend(extra);

    Ok(Some(VigilantRequirements {
        production,
        development,
    }))
}

/// Build workflow options from the command line
pub fn align_options(cli: &Cli) -> Result<AlignOptions> {
    let vigilant = vigilant_requirements(cli.vigilant.as_deref(), &cli.requirements)?;
    Ok(AlignOptions {
        write: cli.write,
        loose: cli.loose,
        diff_mode: cli.diff_mode.into(),
        remove_misplaced: cli.remove_misplaced,
        migrate_config: cli.migrate_config,
        exclude_packages: cli.exclude_packages.clone(),
        custom_profiles: cli.custom_profiles.clone(),
        presets: (!cli.presets.is_empty()).then(|| cli.presets.clone()),
        vigilant,
    })
}

/// Execute the check command
pub fn execute(cli: &Cli) -> anyhow::Result<i32> {
    info!(
        write = cli.write,
        vigilant = cli.vigilant.as_deref(),
        packages = cli.packages.len(),
        "executing check command"
    );

    let options = match align_options(cli) {
        Ok(options) => options,
        Err(e) => return Ok(fail(&e)),
    };
    let manifests = match selected_manifests(cli) {
        Ok(manifests) => manifests,
        Err(e) => return Ok(fail(&e)),
    };

    let workflow = AlignWorkflow::new(options);
    let mut packages = PackageCache::new();
    run_workflow(cli, &workflow, &manifests, &mut packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use depalign_core::DiffMode;

    #[test]
    fn test_vigilant_requirements() {
        let requirements = vigilant_requirements(Some("0.74, 0.73"), &[])
            .unwrap()
            .unwrap();
        assert_eq!(
            requirements.production,
            vec![Requirement::parse("react-native@0.74 || 0.73").unwrap()]
        );
        assert_eq!(
            requirements.development,
            vec![Requirement::parse("react-native@0.74").unwrap()]
        );
    }

    #[test]
    fn test_vigilant_with_extra_requirements() {
        let requirements =
            vigilant_requirements(Some("0.73"), &["react@18".to_string()])
                .unwrap()
                .unwrap();
        assert_eq!(requirements.production.len(), 2);
        assert_eq!(
            requirements.development[1],
            Requirement::parse("react@18").unwrap()
        );
    }

    #[test]
    fn test_no_vigilant_requirements() {
        assert!(vigilant_requirements(None, &[]).unwrap().is_none());
        assert!(vigilant_requirements(Some(""), &[]).unwrap().is_none());
        assert!(vigilant_requirements(None, &["react".to_string()]).is_err());
    }

    #[test]
    fn test_align_options_from_flags() {
        let cli = Cli::try_parse_from([
            "depalign",
            "--write",
            "--remove-misplaced",
            "--loose",
            "--diff-mode",
            "strict",
            "--presets",
            "microsoft/react-native,./profiles.json",
            "--vigilant",
            "0.74",
        ])
        .unwrap();
        let options = align_options(&cli).unwrap();

        assert!(options.write);
        assert!(options.remove_misplaced);
        assert!(options.loose);
        assert_eq!(options.diff_mode, DiffMode::Strict);
        assert_eq!(
            options.presets,
            Some(vec![
                "microsoft/react-native".to_string(),
                "./profiles.json".to_string()
            ])
        );
        assert!(options.vigilant.is_some());
    }
}
