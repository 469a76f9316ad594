//! Capability resolution

use std::collections::{BTreeMap, HashSet};

use depalign_core::error::{AlignError, Result};
use depalign_core::range::parse_pair;
use depalign_core::types::{
    capability_order, Capability, CapabilityMap, PackageEntry, Preset, ProfileVersion,
    ResolutionIssue, ResolutionResult, ResolvedPackage,
};
use tracing::{debug, trace, warn};

#[derive(Debug)]
struct Accumulated {
    version: String,
    dev_only: bool,
    capabilities: Vec<Capability>,
    sources: Vec<(Capability, String)>,
    conflicting: bool,
}

/// Expands capabilities into packages against a single profile
struct Expansion<'a> {
    profile: &'a CapabilityMap,
    version: &'a ProfileVersion,
    packages: BTreeMap<String, Accumulated>,
    unknown: Vec<Capability>,
    stack: Vec<Capability>,
    done: HashSet<(Capability, bool)>,
}

impl<'a> Expansion<'a> {
    fn new(profile: &'a CapabilityMap, version: &'a ProfileVersion) -> Self {
        Self {
            profile,
            version,
            packages: BTreeMap::new(),
            unknown: Vec::new(),
            stack: Vec::new(),
            done: HashSet::new(),
        }
    }

    /// Depth-first expansion. `stack` holds the capabilities on the current
    /// path; meeting one of them again is a cycle. Reaching a capability
    /// through two separate paths is fine.
    fn visit(&mut self, capability: &str, dev_path: bool) -> Result<()> {
        if let Some(start) = self.stack.iter().position(|c| c == capability) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(capability.to_string());
            return Err(AlignError::CyclicCapability {
                version: self.version.to_string(),
                cycle,
            });
        }
        // A runtime visit covers everything a development-only visit would record
        if self.done.contains(&(capability.to_string(), dev_path))
            || self.done.contains(&(capability.to_string(), false))
        {
            return Ok(());
        }

        let Some(entry) = self.profile.get(capability) else {
            if !self.unknown.iter().any(|c| c == capability) {
                self.unknown.push(capability.to_string());
            }
            return Ok(());
        };

        let dev_only = dev_path || entry.is_dev_only();
        trace!(capability, dev_only, "visiting capability");

        self.stack.push(capability.to_string());
        for child in entry.capabilities() {
            self.visit(child, dev_only)?;
        }
        self.stack.pop();

        if let PackageEntry::Direct(direct) = entry {
            self.record(capability, &direct.name, &direct.version, dev_only);
        }
        self.done.insert((capability.to_string(), dev_path));
        Ok(())
    }

    fn record(&mut self, capability: &str, name: &str, range: &str, dev_only: bool) {
        let Some(existing) = self.packages.get_mut(name) else {
            self.packages.insert(
                name.to_string(),
                Accumulated {
                    version: range.to_string(),
                    dev_only,
                    capabilities: vec![capability.to_string()],
                    sources: vec![(capability.to_string(), range.to_string())],
                    conflicting: false,
                },
            );
            return;
        };

        existing.dev_only &= dev_only;
        if !existing.capabilities.iter().any(|c| c == capability) {
            existing.capabilities.push(capability.to_string());
        }
        if !existing.sources.iter().any(|(c, r)| c == capability && r == range) {
            existing.sources.push((capability.to_string(), range.to_string()));
        }
        if existing.version == range || existing.conflicting {
            return;
        }

        match parse_pair(&existing.version, range) {
            Some((current, required)) => match current.intersect(&required) {
                Some(narrowed) => existing.version = narrowed.to_string(),
                None => existing.conflicting = true,
            },
            // Non-semver specifiers only agree when identical
            None => existing.conflicting = true,
        }
    }

    fn finish(self) -> ResolutionResult {
        let mut issues: Vec<ResolutionIssue> = self
            .unknown
            .into_iter()
            .map(|capability| ResolutionIssue::UnknownCapability {
                capability,
                version: self.version.to_string(),
            })
            .collect();

        let mut packages: Vec<ResolvedPackage> = Vec::with_capacity(self.packages.len());
        for (name, mut acc) in self.packages {
            if acc.conflicting {
                issues.push(ResolutionIssue::ConflictingVersion {
                    package: name.clone(),
                    version: self.version.to_string(),
                    ranges: acc.sources.clone(),
                });
            }
            acc.capabilities.sort_by(|a, b| capability_order(a, b));
            packages.push(ResolvedPackage {
                name,
                version: acc.version,
                dev_only: acc.dev_only,
                capabilities: acc.capabilities,
            });
        }

        packages.sort_by(|a, b| {
            let first = |p: &ResolvedPackage| p.capabilities.first().cloned().unwrap_or_default();
            capability_order(&first(a), &first(b)).then_with(|| a.name.cmp(&b.name))
        });

        ResolutionResult {
            profile: self.version.clone(),
            packages,
            issues,
        }
    }
}

/// Resolve capabilities against one profile.
///
/// Unknown capabilities and conflicting ranges are collected as issues on the
/// result; a cycle between meta capabilities aborts with `CyclicCapability`.
pub fn resolve_capabilities(
    capabilities: &[Capability],
    profile: &CapabilityMap,
    version: &ProfileVersion,
) -> Result<ResolutionResult> {
    let mut requested: Vec<&Capability> = Vec::new();
    for capability in capabilities {
        if !requested.contains(&capability) {
            requested.push(capability);
        }
    }
    requested.sort_by(|a, b| capability_order(a, b));

    let mut expansion = Expansion::new(profile, version);
    for capability in requested {
        expansion.visit(capability, false)?;
    }

    let result = expansion.finish();
    for issue in &result.issues {
        warn!(profile = %version, "{}", issue);
    }
    debug!(profile = %version, packages = result.len(), "capabilities resolved");
    Ok(result)
}

/// Resolve capabilities against every profile of a preset, in ascending version order
pub fn resolve_preset(capabilities: &[Capability], preset: &Preset) -> Result<Vec<ResolutionResult>> {
    preset
        .profiles
        .iter()
        .map(|(version, profile)| resolve_capabilities(capabilities, profile, version))
        .collect()
}
