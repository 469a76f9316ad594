//! Comparing a manifest against the planned dependencies

use depalign_core::findings::{DiffMode, Finding, FindingKind};
use depalign_core::range::parse_pair;
use depalign_core::types::{KitType, ResolutionResult};
use depalign_manifest::PackageManifest;
use tracing::debug;

use crate::plan::{plan_dependencies, DependencyPlan};

/// Whether a declared range satisfies the expected one under a diff mode.
///
/// Specifiers that are not semver ranges only match when identical.
pub fn satisfies(declared: &str, expected: &str, mode: DiffMode) -> bool {
    if declared == expected {
        return true;
    }
    let Some((declared, expected)) = parse_pair(declared, expected) else {
        return false;
    };
    match mode {
        DiffMode::Strict => false,
        DiffMode::AllowSubset => declared.is_subset_of(&expected),
        DiffMode::Intersect => declared.intersects(&expected),
    }
}

/// Reports gaps between a manifest and a dependency plan
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    mode: DiffMode,
    excluded: Vec<String>,
}

impl ConflictDetector {
    /// Create a detector using the given diff mode
    pub fn new(mode: DiffMode) -> Self {
        Self {
            mode,
            excluded: Vec::new(),
        }
    }

    /// Skip the named packages entirely
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    fn is_excluded(&self, package: &str) -> bool {
        self.excluded.iter().any(|e| e == package)
    }

    /// Compare the manifest against a plan.
    ///
    /// Packages the plan does not mention are never reported. Satisfied
    /// entries produce no finding.
    pub fn detect(&self, manifest: &PackageManifest, plan: &DependencyPlan) -> Vec<Finding> {
        let mut findings = Vec::new();

        for expected in &plan.expected {
            if self.is_excluded(&expected.package) {
                continue;
            }
            let kind = match manifest.dependency(expected.section, &expected.package) {
                None => FindingKind::Missing {
                    section: expected.section,
                    package: expected.package.clone(),
                    expected: expected.range.clone(),
                },
                Some(actual) if !satisfies(actual, &expected.range, self.mode) => {
                    FindingKind::Mismatched {
                        section: expected.section,
                        package: expected.package.clone(),
                        expected: expected.range.clone(),
                        actual: actual.to_string(),
                    }
                }
                Some(_) => continue,
            };
            findings.push(Finding::in_section(kind, expected.capability.clone()));
        }

        for unwanted in &plan.unwanted {
            if self.is_excluded(&unwanted.package) {
                continue;
            }
            if let Some(actual) = manifest.dependency(unwanted.section, &unwanted.package) {
                findings.push(Finding::in_section(
                    FindingKind::Misplaced {
                        section: unwanted.section,
                        package: unwanted.package.clone(),
                        actual: actual.to_string(),
                    },
                    None,
                ));
            }
        }

        debug!(
            package = manifest.name().unwrap_or_default(),
            findings = findings.len(),
            "conflict detection done"
        );
        findings
    }

    /// Compare the manifest against a single resolution result
    pub fn detect_result(
        &self,
        manifest: &PackageManifest,
        kit_type: KitType,
        result: &ResolutionResult,
    ) -> Vec<Finding> {
        let results = std::slice::from_ref(result);
        let plan = plan_dependencies(kit_type, results, results);
        self.detect(manifest, &plan)
    }
}
