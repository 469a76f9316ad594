//! Where resolved packages belong in a manifest

use depalign_core::types::{Capability, DependencySection, KitType, ResolutionResult};
use serde::Serialize;

/// A package that must be declared in a section with a given range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedDependency {
    pub section: DependencySection,
    pub package: String,
    pub range: String,
    pub capability: Option<Capability>,
}

/// A package that must not be declared in a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnwantedDependency {
    pub section: DependencySection,
    pub package: String,
}

/// Expected layout of the dependency sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyPlan {
    pub expected: Vec<ExpectedDependency>,
    pub unwanted: Vec<UnwantedDependency>,
}

/// A package merged across several profiles
#[derive(Debug)]
pub(crate) struct MergedPackage {
    pub(crate) name: String,
    /// Distinct ranges, in ascending profile order
    pub(crate) versions: Vec<String>,
    /// Taken from the oldest profile containing the package
    pub(crate) dev_only: bool,
    pub(crate) capability: Option<Capability>,
}

pub(crate) fn merge(results: &[ResolutionResult]) -> Vec<MergedPackage> {
    let mut merged: Vec<MergedPackage> = Vec::new();
    for result in results {
        for package in &result.packages {
            match merged.iter_mut().find(|m| m.name == package.name) {
                Some(existing) => {
                    if !existing.versions.contains(&package.version) {
                        existing.versions.push(package.version.clone());
                    }
                }
                None => merged.push(MergedPackage {
                    name: package.name.clone(),
                    versions: vec![package.version.clone()],
                    dev_only: package.dev_only,
                    capability: package.capabilities.first().cloned(),
                }),
            }
        }
    }
    merged
}

fn expect(
    plan: &mut DependencyPlan,
    section: DependencySection,
    package: &MergedPackage,
    range: String,
) {
    plan.expected.push(ExpectedDependency {
        section,
        package: package.name.clone(),
        range,
        capability: package.capability.clone(),
    });
}

fn unwanted(plan: &mut DependencyPlan, section: DependencySection, package: &MergedPackage) {
    plan.unwanted.push(UnwantedDependency {
        section,
        package: package.name.clone(),
    });
}

/// Plan the dependency sections for a package.
///
/// `production` holds one result per production profile and `development`
/// one per development profile, both in ascending version order.
///
/// Apps declare runtime packages in `dependencies` using the newest range and
/// development-only packages in `devDependencies` using the oldest one.
/// Libraries declare runtime packages in `peerDependencies` as the union of all
/// ranges, and every package in `devDependencies` using the development range.
pub fn plan_dependencies(
    kit_type: KitType,
    production: &[ResolutionResult],
    development: &[ResolutionResult],
) -> DependencyPlan {
    let mut plan = DependencyPlan::default();
    let packages = merge(production);

    match kit_type {
        KitType::App => {
            for package in &packages {
                unwanted(&mut plan, DependencySection::PeerDependencies, package);
                if package.dev_only {
                    expect(&mut plan, DependencySection::DevDependencies, package, package.versions[0].clone());
                } else {
                    let newest = package.versions[package.versions.len() - 1].clone();
                    expect(&mut plan, DependencySection::Dependencies, package, newest);
                    unwanted(&mut plan, DependencySection::DevDependencies, package);
                }
            }
        }
        KitType::Library => {
            for package in &packages {
                unwanted(&mut plan, DependencySection::Dependencies, package);
                if !package.dev_only {
                    expect(
                        &mut plan,
                        DependencySection::PeerDependencies,
                        package,
                        package.versions.join(" || "),
                    );
                }
            }
            for package in &merge(development) {
                expect(&mut plan, DependencySection::DevDependencies, package, package.versions[0].clone());
            }
        }
    }

    plan
}

impl DependencyPlan {
    /// Expected entries for one section
    pub fn section(&self, section: DependencySection) -> impl Iterator<Item = &ExpectedDependency> {
        self.expected.iter().filter(move |e| e.section == section)
    }

    /// Whether the plan expects nothing
    pub fn is_empty(&self) -> bool {
        self.expected.is_empty() && self.unwanted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depalign_core::types::{ProfileVersion, ResolvedPackage};

    fn result(version: &str, packages: &[(&str, &str, bool)]) -> ResolutionResult {
        let mut result = ResolutionResult::new(ProfileVersion::from(version));
        result.packages = packages
            .iter()
            .map(|(name, range, dev_only)| ResolvedPackage {
                name: name.to_string(),
                version: range.to_string(),
                dev_only: *dev_only,
                capabilities: vec![name.to_string()],
            })
            .collect();
        result
    }

    fn expected(plan: &DependencyPlan, section: DependencySection) -> Vec<(String, String)> {
        plan.section(section)
            .map(|e| (e.package.clone(), e.range.clone()))
            .collect()
    }

    fn pair(name: &str, range: &str) -> (String, String) {
        (name.to_string(), range.to_string())
    }

    #[test]
    fn test_app_plan() {
        let production = vec![
            result("0.73", &[("react-native", "^0.73.0", false), ("metro", "^0.80.0", true)]),
            result("0.74", &[("react-native", "^0.74.0", false), ("metro", "^0.80.3", true)]),
        ];
        let plan = plan_dependencies(KitType::App, &production, &[]);

        assert_eq!(
            expected(&plan, DependencySection::Dependencies),
            vec![pair("react-native", "^0.74.0")]
        );
        assert_eq!(
            expected(&plan, DependencySection::DevDependencies),
            vec![pair("metro", "^0.80.0")]
        );
        assert!(expected(&plan, DependencySection::PeerDependencies).is_empty());
        assert!(plan.unwanted.contains(&UnwantedDependency {
            section: DependencySection::DevDependencies,
            package: "react-native".to_string(),
        }));
        assert!(!plan.unwanted.contains(&UnwantedDependency {
            section: DependencySection::DevDependencies,
            package: "metro".to_string(),
        }));
    }

    #[test]
    fn test_library_plan() {
        let production = vec![
            result("0.73", &[("react-native", "^0.73.0", false), ("metro", "^0.80.0", true)]),
            result("0.74", &[("react-native", "^0.74.0", false), ("metro", "^0.80.3", true)]),
        ];
        let development = vec![result(
            "0.74",
            &[("react-native", "^0.74.0", false), ("metro", "^0.80.3", true)],
        )];
        let plan = plan_dependencies(KitType::Library, &production, &development);

        assert_eq!(
            expected(&plan, DependencySection::PeerDependencies),
            vec![pair("react-native", "^0.73.0 || ^0.74.0")]
        );
        assert_eq!(
            expected(&plan, DependencySection::DevDependencies),
            vec![pair("react-native", "^0.74.0"), pair("metro", "^0.80.3")]
        );
        assert!(expected(&plan, DependencySection::Dependencies).is_empty());
        assert_eq!(plan.unwanted.len(), 2);
    }

    #[test]
    fn test_same_range_is_not_repeated() {
        let production = vec![
            result("0.73", &[("react", "18.2.0", false)]),
            result("0.74", &[("react", "18.2.0", false)]),
        ];
        let plan = plan_dependencies(KitType::Library, &production, &production);
        assert_eq!(
            expected(&plan, DependencySection::PeerDependencies),
            vec![pair("react", "18.2.0")]
        );
        assert_eq!(
            expected(&plan, DependencySection::DevDependencies),
            vec![pair("react", "18.2.0")]
        );
    }
}
