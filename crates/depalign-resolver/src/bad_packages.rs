//! Known-incompatible packages

use depalign_core::range::parse_pair;
use depalign_core::types::DependencySection;
use depalign_manifest::PackageManifest;
use serde::Serialize;

/// A denylist entry
struct KnownBadPackage {
    name: &'static str,
    range: &'static str,
    reason: &'static str,
}

const KNOWN_BAD_PACKAGES: &[KnownBadPackage] = &[
    KnownBadPackage {
        name: "react-native-linear-gradient",
        range: "<2.6.0",
        reason: "This package declares a dependency on 'react-native', which causes duplicate copies to be installed; please upgrade to 2.6.0 or later",
    },
    KnownBadPackage {
        name: "react-native-netinfo",
        range: "*",
        reason: "This package is deprecated; please use '@react-native-community/netinfo' instead",
    },
];

/// A declared package found on the denylist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadPackage {
    pub name: String,
    /// Range as declared in the manifest
    pub version: String,
    pub reason: String,
}

fn is_affected(declared: &str, bad: &KnownBadPackage) -> bool {
    match parse_pair(declared, bad.range) {
        Some((declared, bad)) => declared.intersects(&bad),
        None => bad.range == "*",
    }
}

/// Find denylisted packages among the declared dependencies.
///
/// Looks at `dependencies`, `peerDependencies` and `devDependencies`; a
/// package declared in several of them is reported once. Returns `None`
/// when nothing is found.
pub fn find_bad_packages(manifest: &PackageManifest) -> Option<Vec<BadPackage>> {
    let mut found: Vec<BadPackage> = Vec::new();
    for section in DependencySection::ALL {
        for (name, declared) in manifest.dependencies(section) {
            if found.iter().any(|b| b.name == name) {
                continue;
            }
            let Some(bad) = KNOWN_BAD_PACKAGES.iter().find(|b| b.name == name) else {
                continue;
            };
            if is_affected(declared, bad) {
                found.push(BadPackage {
                    name: name.to_string(),
                    version: declared.to_string(),
                    reason: bad.reason.to_string(),
                });
            }
        }
    }
    (!found.is_empty()).then_some(found)
}
