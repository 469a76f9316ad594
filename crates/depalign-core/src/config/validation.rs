//! Configuration validation

use tracing::debug;

use crate::error::{AlignError, ConfigError, Result};
use crate::requirement::Requirement;

use super::defaults::default_presets;
use super::types::{AlignConfig, AlignDepsConfig, KitConfig, Requirements};

/// Validate an `alignDeps` section and turn it into a resolved config
pub fn validate_config(kit: &KitConfig, align_deps: &AlignDepsConfig) -> Result<AlignConfig> {
    debug!("validating configuration");
    validate_presets(align_deps)?;
    let requirements = validate_requirements(align_deps)?;

    let production = parse_requirements("alignDeps.requirements", requirements.production())?;
    let development = parse_requirements("alignDeps.requirements", requirements.development())?;

    debug!("configuration validation passed");
    Ok(AlignConfig {
        kit_type: kit.kit_type,
        presets: align_deps.presets.clone().unwrap_or_else(default_presets),
        production,
        development,
        capabilities: align_deps.capabilities.clone(),
    })
}

fn validate_presets(align_deps: &AlignDepsConfig) -> Result<()> {
    if align_deps.presets.as_ref().is_some_and(|p| p.is_empty()) {
        return Err(ConfigError::InvalidValue {
            field: "alignDeps.presets".to_string(),
            message: "cannot be empty".to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate_requirements(align_deps: &AlignDepsConfig) -> Result<&Requirements> {
    let empty = |field: &str| ConfigError::InvalidValue {
        field: field.to_string(),
        message: "cannot be empty".to_string(),
    };

    match &align_deps.requirements {
        None => Err(empty("alignDeps.requirements").into()),
        Some(Requirements::Flat(reqs)) if reqs.is_empty() => {
            Err(empty("alignDeps.requirements").into())
        }
        Some(Requirements::Split { development, .. }) if development.is_empty() => {
            Err(empty("alignDeps.requirements.development").into())
        }
        Some(Requirements::Split { production, .. }) if production.is_empty() => {
            Err(empty("alignDeps.requirements.production").into())
        }
        Some(requirements) => Ok(requirements),
    }
}

fn parse_requirements(field: &str, requirements: &[String]) -> Result<Vec<Requirement>> {
    requirements
        .iter()
        .map(|r| {
            Requirement::parse(r).map_err(|e| {
                AlignError::from(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: e.to_string(),
                })
            })
        })
        .collect()
}
