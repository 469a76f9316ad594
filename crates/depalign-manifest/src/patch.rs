//! Applying findings to a manifest

use depalign_core::findings::{Finding, FindingKind};
use depalign_core::types::DependencySection;
use serde_json::{Map, Value};
use tracing::debug;

use crate::manifest::PackageManifest;

/// Options controlling what the patcher may change
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchOptions {
    /// Apply `Misplaced` findings by removing the dependency
    pub remove_misplaced: bool,
}

/// Applies fixable findings to a manifest.
///
/// Only the dependency sections named by the findings are touched. Applying the
/// same findings twice changes nothing the second time.
#[derive(Debug, Clone, Default)]
pub struct Patcher {
    options: PatchOptions,
}

impl Patcher {
    /// Create a patcher with the given options
    pub fn new(options: PatchOptions) -> Self {
        Self { options }
    }

    /// Apply findings in place; returns the number of changed entries
    pub fn apply(&self, manifest: &mut PackageManifest, findings: &[Finding]) -> usize {
        let mut changed = 0;
        for finding in findings {
            let applied = match &finding.kind {
                FindingKind::Missing {
                    section,
                    package,
                    expected,
                }
                | FindingKind::Mismatched {
                    section,
                    package,
                    expected,
                    ..
                } => set_dependency(manifest, *section, package, expected),
                FindingKind::Misplaced {
                    section, package, ..
                } if self.options.remove_misplaced => {
                    remove_dependency(manifest, *section, package)
                }
                _ => false,
            };
            if applied {
                debug!(finding = %finding, "applied");
                changed += 1;
            }
        }
        changed
    }

    /// Return a patched copy, leaving the input untouched
    pub fn patched(&self, manifest: &PackageManifest, findings: &[Finding]) -> PackageManifest {
        let mut patched = manifest.clone();
        self.apply(&mut patched, findings);
        patched
    }
}

fn is_sorted(deps: &Map<String, Value>) -> bool {
    deps.keys()
        .zip(deps.keys().skip(1))
        .all(|(a, b)| a <= b)
}

/// Set a dependency range. Existing entries are replaced in place; new ones
/// keep an already sorted section sorted and are appended otherwise.
fn set_dependency(
    manifest: &mut PackageManifest,
    section: DependencySection,
    package: &str,
    range: &str,
) -> bool {
    if manifest.dependency(section, package) == Some(range) {
        return false;
    }

    let deps = manifest.section_mut(section);
    let value = Value::String(range.to_string());
    if deps.contains_key(package) || !is_sorted(deps) {
        deps.insert(package.to_string(), value);
        return true;
    }

    let mut entries: Vec<(String, Value)> = std::mem::take(deps).into_iter().collect();
    let at = entries.partition_point(|(name, _)| name.as_str() < package);
    entries.insert(at, (package.to_string(), value));
    *deps = entries.into_iter().collect();
    true
}

/// Remove a dependency; a section left empty is removed as well
fn remove_dependency(manifest: &mut PackageManifest, section: DependencySection, package: &str) -> bool {
    if manifest.dependency(section, package).is_none() {
        return false;
    }

    let deps = manifest.section_mut(section);
    *deps = std::mem::take(deps)
        .into_iter()
        .filter(|(name, _)| name != package)
        .collect();
    if deps.is_empty() {
        manifest.remove_field(section.as_str());
    }
    true
}
