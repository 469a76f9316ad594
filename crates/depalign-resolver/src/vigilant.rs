//! Inspecting packages against every capability of a profile.
//!
//! Used when a package has no configuration, or on top of the regular check
//! in vigilant mode. Without knowing which capabilities a package uses, we
//! can only verify that packages already declared are on the right version;
//! nothing is added and nothing is moved between sections.

use std::collections::{BTreeMap, BTreeSet};

use depalign_core::config::AlignConfig;
use depalign_core::error::Result;
use depalign_core::findings::{Finding, FindingKind};
use depalign_core::range::parse_pair;
use depalign_core::types::{Capability, DependencySection, KitType, Preset};
use depalign_manifest::PackageManifest;
use depalign_presets::select_profiles;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::capabilities::resolve_preset;
use crate::plan::merge;

/// Expected range and owning capability of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    pub range: String,
    pub capability: Option<Capability>,
}

/// Expected ranges for all packages known to the selected profiles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VigilantProfile {
    /// Used for `dependencies` and `devDependencies`
    pub direct: BTreeMap<String, ProfileEntry>,
    /// Used for `peerDependencies`
    pub peer: BTreeMap<String, ProfileEntry>,
}

impl VigilantProfile {
    fn entries(&self, section: DependencySection) -> &BTreeMap<String, ProfileEntry> {
        match section {
            DependencySection::PeerDependencies => &self.peer,
            DependencySection::Dependencies | DependencySection::DevDependencies => &self.direct,
        }
    }
}

fn all_capabilities(preset: &Preset) -> BTreeSet<&Capability> {
    preset.profiles.values().flat_map(|profile| profile.keys()).collect()
}

/// Build the expected ranges for every capability the package does not
/// manage itself.
///
/// Direct dependencies are checked against the oldest target profile,
/// development-only packages included. Peer dependencies are checked against
/// the union of the supported profiles. Fails with `NoMatchingVersion` when
/// either set of requirements selects no profile.
pub fn build_vigilant_profile(config: &AlignConfig, preset: &Preset) -> Result<VigilantProfile> {
    let support = select_profiles(preset, &config.production)?;
    let target = match config.kit_type {
        KitType::App => support.clone(),
        KitType::Library => select_profiles(preset, &config.development)?,
    };

    let unmanaged: Vec<Capability> = all_capabilities(&target)
        .into_iter()
        .filter(|capability| !config.capabilities.contains(capability))
        .cloned()
        .collect();
    debug!(capabilities = unmanaged.len(), "inspecting unmanaged capabilities");

    let mut profile = VigilantProfile::default();
    for package in merge(&resolve_preset(&unmanaged, &target)?) {
        profile.direct.insert(
            package.name,
            ProfileEntry {
                range: package.versions[0].clone(),
                capability: package.capability,
            },
        );
    }
    for package in merge(&resolve_preset(&unmanaged, &support)?) {
        if package.dev_only {
            continue;
        }
        profile.peer.insert(
            package.name,
            ProfileEntry {
                range: package.versions.join(" || "),
                capability: package.capability,
            },
        );
    }
    Ok(profile)
}

/// Direct dependencies must match exactly. A peer range is fine as long as it
/// covers the expected one.
fn is_misaligned(section: DependencySection, declared: &str, expected: &str) -> bool {
    if declared == expected {
        return false;
    }
    match section {
        DependencySection::PeerDependencies => match parse_pair(expected, declared) {
            Some((expected, declared)) => !expected.is_subset_of(&declared),
            None => true,
        },
        DependencySection::Dependencies | DependencySection::DevDependencies => true,
    }
}

/// Compare declared dependencies against a vigilant profile.
///
/// Only packages present in the manifest are looked at, so no `Missing`
/// findings are produced.
pub fn inspect(
    manifest: &PackageManifest,
    profile: &VigilantProfile,
    excluded: &[String],
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for section in DependencySection::ALL {
        let expected = profile.entries(section);
        for (name, declared) in manifest.dependencies(section) {
            if excluded.iter().any(|e| e == name) {
                continue;
            }
            let Some(entry) = expected.get(name) else {
                continue;
            };
            if is_misaligned(section, declared, &entry.range) {
                findings.push(Finding::in_section(
                    FindingKind::Mismatched {
                        section,
                        package: name.to_string(),
                        expected: entry.range.clone(),
                        actual: declared.to_string(),
                    },
                    entry.capability.clone(),
                ));
            }
        }
    }
    findings
}

/// Inspect a package against all capabilities of the selected profiles
#[instrument(skip_all, fields(package = manifest.name().unwrap_or_default()))]
pub fn inspect_unconfigured(
    manifest: &PackageManifest,
    config: &AlignConfig,
    preset: &Preset,
    excluded: &[String],
) -> Result<Vec<Finding>> {
    let profile = build_vigilant_profile(config, preset)?;
    let findings = inspect(manifest, &profile, excluded);
    debug!(findings = findings.len(), "vigilant inspection done");
    Ok(findings)
}
