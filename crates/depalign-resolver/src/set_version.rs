//! Rewriting the platform requirements of configured packages

use std::sync::LazyLock;

use depalign_core::config::{
    default_presets, migrate_config, write_migrated_config, AlignDepsConfig, KitConfig,
    Requirements, PLATFORM_PACKAGE,
};
use depalign_core::error::{ConfigError, Result};
use depalign_core::types::{KitType, ProfileVersion};
use depalign_manifest::PackageManifest;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?(\d+)\.(\d+)(?:\.\d+)?").expect("Invalid regex"));

/// Versions to write, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSelection {
    /// Version used for development; the first one given
    pub target: ProfileVersion,
    /// All supported versions, ascending
    pub supported: Vec<ProfileVersion>,
}

impl VersionSelection {
    /// Select from versions, the first being the development version
    pub fn new(versions: Vec<ProfileVersion>) -> Option<Self> {
        let target = versions.first()?.clone();
        let mut supported = versions;
        supported.sort();
        supported.dedup();
        Some(Self { target, supported })
    }
}

/// Parse a comma-separated list such as `0.74,0.73`.
///
/// Each entry is reduced to `major.minor` and must be one of `known`.
pub fn parse_versions(input: &str, known: &[ProfileVersion]) -> Result<VersionSelection> {
    let invalid = |message: String| ConfigError::InvalidValue {
        field: "--set-version".to_string(),
        message,
    };

    let mut versions = Vec::new();
    for raw in input.split(',').map(str::trim).filter(|v| !v.is_empty()) {
        let captures = VERSION_REGEX
            .captures(raw)
            .ok_or_else(|| invalid(format!("'{}' is not a valid version number", raw)))?;
        let version = ProfileVersion::new(format!("{}.{}", &captures[1], &captures[2]));
        if !known.contains(&version) {
            return Err(invalid(format!(
                "'{}' is not a supported {} version",
                version, PLATFORM_PACKAGE
            ))
            .into());
        }
        versions.push(version);
    }

    VersionSelection::new(versions)
        .ok_or_else(|| invalid("at least one version is required".to_string()).into())
}

/// Replace the range of an existing platform requirement
fn set_requirement(requirements: &mut [String], range: &str) {
    let prefix = format!("{}@", PLATFORM_PACKAGE);
    if let Some(requirement) = requirements.iter_mut().find(|r| r.starts_with(&prefix)) {
        *requirement = format!("{}{}", prefix, range);
    }
}

fn update_requirements(align_deps: &mut AlignDepsConfig, production: &str, development: &str) {
    match &mut align_deps.requirements {
        Some(Requirements::Flat(requirements)) => set_requirement(requirements, production),
        Some(Requirements::Split {
            production: prod,
            development: dev,
        }) => {
            set_requirement(prod, production);
            set_requirement(dev, development);
        }
        None => {}
    }
}

/// Write new platform versions into a package's configuration.
///
/// Apps get the development version only. Libraries get the development
/// version for development and all supported versions for production. A
/// legacy configuration is migrated on the way.
pub fn set_version(
    manifest: &mut PackageManifest,
    kit: &KitConfig,
    selection: &VersionSelection,
) -> Result<()> {
    let location = manifest
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "package.json".to_string());
    let mut align_deps = migrate_config(kit, &location)?;

    let target = selection.target.to_string();
    match kit.kit_type {
        KitType::App => update_requirements(&mut align_deps, &target, &target),
        KitType::Library => {
            let supported: Vec<String> = selection.supported.iter().map(ToString::to_string).collect();
            update_requirements(&mut align_deps, &supported.join(" || "), &target);
        }
    }
    if align_deps.presets.as_deref() == Some(default_presets().as_slice()) {
        align_deps.presets = None;
    }
    debug!(requirements = ?align_deps.requirements, "updated requirements");

    let kit_config = manifest.kit_config_mut();
    if !kit_config.is_object() {
        *kit_config = Value::Object(Default::default());
    }
    write_migrated_config(kit_config, &align_deps)?;
    if let Value::Object(object) = kit_config {
        object.insert("kitType".to_string(), Value::String(kit.kit_type.to_string()));
    }
    Ok(())
}
