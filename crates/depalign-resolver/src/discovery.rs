//! Discovering capabilities from declared dependencies

use std::collections::BTreeSet;

use depalign_core::types::{Capability, DependencySection, PackageEntry, Preset};
use depalign_manifest::PackageManifest;

/// Capabilities whose package is declared anywhere in the manifest.
///
/// Every profile of the preset is consulted, so a capability only present in
/// some versions is still found. The result is sorted.
pub fn capabilities_for(manifest: &PackageManifest, preset: &Preset) -> Vec<Capability> {
    let declared: BTreeSet<&str> = DependencySection::ALL
        .into_iter()
        .flat_map(|section| manifest.dependencies(section))
        .map(|(name, _)| name)
        .collect();
    if declared.is_empty() {
        return Vec::new();
    }

    let mut found = BTreeSet::new();
    for profile in preset.profiles.values() {
        for (capability, entry) in profile {
            if let PackageEntry::Direct(direct) = entry {
                if declared.contains(direct.name.as_str()) {
                    found.insert(capability.clone());
                }
            }
        }
    }
    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use depalign_presets::builtin::react_native;
    use serde_json::json;

    #[test]
    fn test_no_dependencies() {
        let manifest = PackageManifest::from_value(json!({ "name": "pkg", "version": "1.0.0" }));
        assert!(capabilities_for(&manifest, &react_native::preset()).is_empty());
    }

    #[test]
    fn test_capabilities_from_all_sections() {
        let manifest = PackageManifest::from_value(json!({
            "name": "pkg",
            "version": "1.0.0",
            "dependencies": { "react-native-svg": "^14.0.0" },
            "peerDependencies": { "react-native": "^0.73.0" },
            "devDependencies": { "react-native": "^0.73.0", "jest": "^29.0.0", "lodash": "^4.0.0" }
        }));

        assert_eq!(
            capabilities_for(&manifest, &react_native::preset()),
            vec!["core", "core-android", "core-ios", "jest", "svg"]
        );
    }

    #[test]
    fn test_capability_from_single_profile() {
        let manifest = PackageManifest::from_value(json!({
            "dependencies": { "hermes-engine": "~0.11.0" }
        }));
        assert_eq!(capabilities_for(&manifest, &react_native::preset()), vec!["hermes"]);
    }
}
