//! Configuration loading

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::compat::migrate_config;
use super::defaults::{config_file_names, CONFIG_KEY};
use super::types::{AlignConfig, KitConfig};
use super::validation::validate_config;

/// Load kit configuration from a standalone file
pub fn load_config(path: &Path) -> Result<KitConfig> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: KitConfig = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Find a standalone configuration file in a package directory
pub fn find_config(package_dir: &Path) -> Option<PathBuf> {
    let found = config_file_names()
        .into_iter()
        .map(|name| package_dir.join(name))
        .find(|path| path.exists());
    if let Some(path) = &found {
        debug!(path = %path.display(), "found config file");
    }
    found
}

/// Read the kit configuration of a package.
///
/// The `depalign` key of the manifest takes precedence over config files.
/// Returns `None` when the package is not configured.
pub fn read_kit_config(package_dir: &Path, manifest: &Value) -> Result<Option<KitConfig>> {
    if let Some(value) = manifest.get(CONFIG_KEY) {
        let config = serde_json::from_value(value.clone()).map_err(|e| {
            ConfigError::ParseError(format!("'{}' in package.json: {}", CONFIG_KEY, e))
        })?;
        return Ok(Some(config));
    }

    find_config(package_dir).map(|path| load_config(&path)).transpose()
}

/// Whether the config carries anything alignment can use
pub fn is_configured(kit: &KitConfig) -> bool {
    kit.align_deps.is_some() || !kit.legacy_keys().is_empty()
}

/// Load, migrate and validate the alignment config of a package.
///
/// Returns `None` when the package has no alignment configuration.
pub fn load_align_config(package_dir: &Path, manifest: &Value) -> Result<Option<AlignConfig>> {
    let Some(kit) = read_kit_config(package_dir, manifest)? else {
        return Ok(None);
    };
    if !is_configured(&kit) {
        return Ok(None);
    }

    let location = package_dir.join("package.json");
    let align_deps = migrate_config(&kit, &location.display().to_string())?;
    validate_config(&kit, &align_deps).map(Some)
}
