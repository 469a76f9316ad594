//! Selecting profiles that satisfy requirements

use depalign_core::error::{AlignError, Result};
use depalign_core::range::VersionRange;
use depalign_core::requirement::Requirement;
use depalign_core::types::{capability_order, CapabilityMap, DirectEntry, PackageEntry, Preset};
use tracing::debug;

/// The entry a profile uses for a package: the first direct entry with that
/// name, visiting core capabilities first and the rest alphabetically
pub fn canonical_entry<'a>(profile: &'a CapabilityMap, package: &str) -> Option<&'a DirectEntry> {
    let mut entries: Vec<(&String, &DirectEntry)> = profile
        .iter()
        .filter_map(|(capability, entry)| match entry {
            PackageEntry::Direct(direct) if direct.name == package => Some((capability, direct)),
            _ => None,
        })
        .collect();
    entries.sort_by(|(a, _), (b, _)| capability_order(a, b));
    entries.first().map(|(_, entry)| *entry)
}

/// Whether every requirement is met by the profile's entry for that package
pub fn satisfies(profile: &CapabilityMap, requirements: &[Requirement]) -> bool {
    requirements.iter().all(|requirement| {
        canonical_entry(profile, &requirement.package)
            .and_then(|entry| VersionRange::parse(&entry.version).ok())
            .is_some_and(|range| range.intersects(&requirement.range))
    })
}

/// Keep the profiles satisfying all requirements; may be empty
pub fn filter_preset(preset: &Preset, requirements: &[Requirement]) -> Preset {
    let versions: Vec<_> = preset
        .profiles
        .iter()
        .filter(|(_, profile)| satisfies(profile, requirements))
        .map(|(version, _)| version.clone())
        .collect();
    preset.retain_versions(&versions)
}

/// Like [`filter_preset`], but fails with `NoMatchingVersion` when nothing is left
pub fn select_profiles(preset: &Preset, requirements: &[Requirement]) -> Result<Preset> {
    let filtered = filter_preset(preset, requirements);
    if filtered.is_empty() {
        return Err(AlignError::NoMatchingVersion {
            requirements: requirements.iter().map(ToString::to_string).collect(),
        });
    }
    debug!(
        versions = ?filtered.versions().iter().map(ToString::to_string).collect::<Vec<_>>(),
        "selected profiles"
    );
    Ok(filtered)
}
