//! Migration of the legacy configuration schema

use serde_json::Value;
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::range::drop_patch;
use crate::types::KitType;

use super::defaults::{default_presets, PLATFORM_PACKAGE};
use super::types::{AlignDepsConfig, KitConfig, Requirements};

/// Transform a legacy config (`reactNativeVersion` and friends) into an `alignDeps` section
pub fn transform_legacy_config(kit: &KitConfig) -> Result<AlignDepsConfig> {
    let prod_range = kit
        .react_native_version
        .as_deref()
        .ok_or_else(|| ConfigError::InvalidValue {
            field: "alignDeps.requirements".to_string(),
            message: "cannot be empty".to_string(),
        })?;
    let dev_range = kit.react_native_dev_version.as_deref().unwrap_or(prod_range);

    let prod_version = drop_patch(prod_range)?;
    let dev_version = drop_patch(dev_range)?;

    let mut presets = default_presets();
    if let Some(custom) = &kit.custom_profiles {
        presets.push(custom.clone());
    }

    let requirements = match kit.kit_type {
        KitType::App => Requirements::Flat(vec![format!("{}@{}", PLATFORM_PACKAGE, prod_version)]),
        KitType::Library => Requirements::Split {
            production: vec![format!("{}@{}", PLATFORM_PACKAGE, prod_version)],
            development: vec![format!("{}@{}", PLATFORM_PACKAGE, dev_version)],
        },
    };

    Ok(AlignDepsConfig {
        presets: Some(presets),
        requirements: Some(requirements),
        capabilities: kit.capabilities.clone().unwrap_or_default(),
    })
}

/// Returns the `alignDeps` section to use, migrating legacy keys if needed.
///
/// `location` names the config in warnings.
pub fn migrate_config(kit: &KitConfig, location: &str) -> Result<AlignDepsConfig> {
    let legacy = kit.legacy_keys();

    if let Some(align_deps) = &kit.align_deps {
        if !legacy.is_empty() {
            let keys: Vec<String> = legacy.iter().map(|k| format!("'{}'", k)).collect();
            warn!(
                location,
                "The following keys are no longer supported: {}",
                keys.join(", ")
            );
        }
        return Ok(align_deps.clone());
    }

    let migrated = transform_legacy_config(kit)?;
    warn!(location, keys = ?legacy, "config uses the legacy schema");
    Ok(migrated)
}

/// Rewrite a kit config object in place: drop legacy keys and store `alignDeps`
pub fn write_migrated_config(config: &mut Value, align_deps: &AlignDepsConfig) -> Result<()> {
    let object = config
        .as_object_mut()
        .ok_or_else(|| ConfigError::ParseError("kit config is not an object".to_string()))?;

    let keys = ["capabilities", "customProfiles", "reactNativeDevVersion", "reactNativeVersion"];
    *object = std::mem::take(object)
        .into_iter()
        .filter(|(key, _)| !keys.contains(&key.as_str()))
        .collect();
    object.insert("alignDeps".to_string(), serde_json::to_value(align_deps)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy(kit_type: KitType) -> KitConfig {
        KitConfig {
            kit_type,
            react_native_version: Some("^0.73.4".to_string()),
            react_native_dev_version: Some("0.74.1".to_string()),
            capabilities: Some(vec!["core-android".to_string()]),
            custom_profiles: Some("./profiles.json".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_transform_library() {
        let config = transform_legacy_config(&legacy(KitType::Library)).unwrap();
        assert_eq!(
            config.presets,
            Some(vec![
                "microsoft/react-native".to_string(),
                "./profiles.json".to_string()
            ])
        );
        let requirements = config.requirements.unwrap();
        assert_eq!(requirements.production(), ["react-native@0.73".to_string()]);
        assert_eq!(requirements.development(), ["react-native@0.74".to_string()]);
        assert_eq!(config.capabilities, vec!["core-android"]);
    }

    #[test]
    fn test_transform_app_uses_flat_requirements() {
        let config = transform_legacy_config(&legacy(KitType::App)).unwrap();
        assert_eq!(
            config.requirements,
            Some(Requirements::Flat(vec!["react-native@0.73".to_string()]))
        );
    }

    #[test]
    fn test_transform_without_version_fails() {
        let kit = KitConfig {
            capabilities: Some(vec!["core".to_string()]),
            ..Default::default()
        };
        assert!(transform_legacy_config(&kit).is_err());
    }

    #[test]
    fn test_migrate_prefers_align_deps() {
        let mut kit = legacy(KitType::Library);
        kit.align_deps = Some(AlignDepsConfig {
            requirements: Some(Requirements::Flat(vec!["react-native@0.70".to_string()])),
            ..Default::default()
        });
        let config = migrate_config(&kit, "package.json").unwrap();
        assert_eq!(config.presets, None);
        assert_eq!(config.requirements.unwrap().production(), ["react-native@0.70".to_string()]);
    }

    #[test]
    fn test_write_migrated_config() {
        let mut value = json!({
            "kitType": "library",
            "reactNativeVersion": "^0.73.0",
            "capabilities": ["core"],
            "bundle": true
        });
        let align_deps = transform_legacy_config(&KitConfig {
            react_native_version: Some("^0.73.0".to_string()),
            capabilities: Some(vec!["core".to_string()]),
            ..Default::default()
        })
        .unwrap();

        write_migrated_config(&mut value, &align_deps).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["kitType", "bundle", "alignDeps"]);
        assert_eq!(
            value["alignDeps"]["requirements"]["production"][0],
            "react-native@0.73"
        );
    }
}
