//! Generating an initial configuration for a package

use depalign_core::config::{default_presets, AlignDepsConfig, Requirements, PLATFORM_PACKAGE};
use depalign_core::error::{RangeError, Result};
use depalign_core::range::{drop_patch, VersionRange};
use depalign_core::requirement::Requirement;
use depalign_core::types::{Capability, DependencySection, KitType, Preset};
use depalign_manifest::PackageManifest;
use depalign_presets::filter_preset;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::discovery::capabilities_for;

/// Outcome of initializing a package
#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    /// The manifest now carries a configuration
    Initialized(PackageManifest),
    /// The package already has an `alignDeps` section
    AlreadyConfigured,
    /// The package does not depend on the platform package
    MissingPlatform,
}

/// Oldest `major.minor` allowed by a range
fn min_minor(range: &str) -> Result<String> {
    let version = VersionRange::parse(range)?
        .min_version()
        .ok_or_else(|| RangeError::InvalidRange(range.to_string()))?;
    Ok(format!("{}.{}", version.major, version.minor))
}

fn platform_requirement(version: &str) -> String {
    format!("{}@{}", PLATFORM_PACKAGE, version)
}

/// Build a configuration for a package by looking at what it depends on.
///
/// The platform version is taken from `peerDependencies`, `dependencies` or
/// `devDependencies`, in that order. `preset` is the merged view of
/// `presets`; `extra` capabilities are added to the discovered ones.
pub fn initialize_config(
    manifest: &PackageManifest,
    kit_type: KitType,
    presets: &[String],
    preset: &Preset,
    extra: &[Capability],
) -> Result<InitOutcome> {
    if manifest
        .kit_config()
        .and_then(|kit| kit.get("alignDeps"))
        .is_some()
    {
        return Ok(InitOutcome::AlreadyConfigured);
    }

    let target = [
        DependencySection::PeerDependencies,
        DependencySection::Dependencies,
        DependencySection::DevDependencies,
    ]
    .into_iter()
    .find_map(|section| manifest.dependency(section, PLATFORM_PACKAGE));
    let Some(target) = target else {
        return Ok(InitOutcome::MissingPlatform);
    };

    let production = vec![platform_requirement(&drop_patch(target)?)];
    let filtered = filter_preset(preset, &Requirement::parse_all(&production)?);

    let mut capabilities = capabilities_for(manifest, &filtered);
    for capability in extra {
        if !capabilities.contains(capability) {
            capabilities.push(capability.clone());
        }
    }
    capabilities.sort();

    let requirements = match kit_type {
        KitType::App => Requirements::Flat(production),
        KitType::Library => {
            let declared_dev =
                manifest.dependency(DependencySection::DevDependencies, PLATFORM_PACKAGE);
            let development = match declared_dev {
                Some(dev) => drop_patch(dev)?,
                None => min_minor(target)?,
            };
            Requirements::Split {
                production,
                development: vec![platform_requirement(&development)],
            }
        }
    };

    let align_deps = AlignDepsConfig {
        presets: (presets != default_presets().as_slice()).then(|| presets.to_vec()),
        requirements: Some(requirements),
        capabilities,
    };
    debug!(capabilities = ?align_deps.capabilities, "discovered capabilities");

    let align_deps = serde_json::to_value(&align_deps)?;
    let mut updated = manifest.clone();
    let kit = updated.kit_config_mut();
    if !kit.is_object() {
        *kit = Value::Object(Map::new());
    }
    if let Value::Object(kit) = kit {
        kit.insert("kitType".to_string(), Value::String(kit_type.to_string()));
        kit.insert("alignDeps".to_string(), align_deps);
    }

    info!(
        package = manifest.name().unwrap_or_default(),
        kit_type = %kit_type,
        "initialized configuration"
    );
    Ok(InitOutcome::Initialized(updated))
}
