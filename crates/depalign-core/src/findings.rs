//! Findings reported when a manifest disagrees with the resolved dependencies

use serde::{Deserialize, Serialize};

use crate::types::{Capability, DependencySection, ResolutionIssue};

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails the check
    Error,
    /// Reported only
    Warning,
}

impl Severity {
    /// Severity for a gap in the given section: production sections are errors
    pub fn for_section(section: DependencySection) -> Self {
        match section {
            DependencySection::Dependencies | DependencySection::PeerDependencies => Self::Error,
            DependencySection::DevDependencies => Self::Warning,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// How a declared range is compared against the expected one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffMode {
    /// Ranges must be identical strings
    Strict,
    /// Declared range must be a subset of the expected range
    AllowSubset,
    /// Declared range must share at least one version with the expected range
    #[default]
    Intersect,
}

impl std::str::FromStr for DiffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "allow-subset" => Ok(Self::AllowSubset),
            "intersect" => Ok(Self::Intersect),
            _ => Err(format!("Invalid diff mode: '{}'", s)),
        }
    }
}

/// What is wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FindingKind {
    /// Expected package is not declared in the section
    Missing {
        section: DependencySection,
        package: String,
        expected: String,
    },
    /// Declared range does not satisfy the expected range
    Mismatched {
        section: DependencySection,
        package: String,
        expected: String,
        actual: String,
    },
    /// Package is declared in a section it does not belong in
    Misplaced {
        section: DependencySection,
        package: String,
        actual: String,
    },
    /// Capability is unknown to the selected profile
    UnknownCapability { capability: Capability, profile: String },
    /// Capabilities require non-intersecting ranges of one package
    ConflictingVersion {
        package: String,
        profile: String,
        ranges: Vec<(Capability, String)>,
    },
}

/// A single problem found in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Severity
    pub severity: Severity,
    /// Capability through which the package was required, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,
    /// The problem
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl Finding {
    /// Create a finding for a dependency section, deriving its severity from the section
    pub fn in_section(kind: FindingKind, capability: Option<Capability>) -> Self {
        let severity = match &kind {
            FindingKind::Missing { section, .. }
            | FindingKind::Mismatched { section, .. }
            | FindingKind::Misplaced { section, .. } => Severity::for_section(*section),
            _ => Severity::Error,
        };
        Self {
            severity,
            capability,
            kind,
        }
    }

    /// The package concerned, if any
    pub fn package(&self) -> Option<&str> {
        match &self.kind {
            FindingKind::Missing { package, .. }
            | FindingKind::Mismatched { package, .. }
            | FindingKind::Misplaced { package, .. }
            | FindingKind::ConflictingVersion { package, .. } => Some(package),
            FindingKind::UnknownCapability { .. } => None,
        }
    }

    /// The dependency section concerned, if any
    pub fn section(&self) -> Option<DependencySection> {
        match &self.kind {
            FindingKind::Missing { section, .. }
            | FindingKind::Mismatched { section, .. }
            | FindingKind::Misplaced { section, .. } => Some(*section),
            _ => None,
        }
    }

    /// Whether the patcher can fix this finding
    pub fn is_fixable(&self) -> bool {
        self.section().is_some()
    }

    /// Whether the finding fails the check
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<ResolutionIssue> for Finding {
    fn from(issue: ResolutionIssue) -> Self {
        match issue {
            ResolutionIssue::UnknownCapability {
                capability,
                version,
            } => Self {
                severity: Severity::Error,
                capability: Some(capability.clone()),
                kind: FindingKind::UnknownCapability {
                    capability,
                    profile: version,
                },
            },
            ResolutionIssue::ConflictingVersion {
                package,
                version,
                ranges,
            } => Self {
                severity: Severity::Error,
                capability: ranges.first().map(|(capability, _)| capability.clone()),
                kind: FindingKind::ConflictingVersion {
                    package,
                    profile: version,
                    ranges,
                },
            },
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FindingKind::Missing {
                section,
                package,
                expected,
            } => write!(f, "{}: missing \"{}\" (expected {})", section, package, expected)?,
            FindingKind::Mismatched {
                section,
                package,
                expected,
                actual,
            } => write!(
                f,
                "{}: \"{}\" has {}, expected {}",
                section, package, actual, expected
            )?,
            FindingKind::Misplaced {
                section,
                package,
                actual,
            } => write!(f, "{}: \"{}\" ({}) should be removed", section, package, actual)?,
            FindingKind::UnknownCapability {
                capability,
                profile,
            } => write!(f, "unknown capability '{}' in profile {}", capability, profile)?,
            FindingKind::ConflictingVersion {
                package,
                profile,
                ranges,
            } => {
                let ranges: Vec<String> = ranges
                    .iter()
                    .map(|(capability, range)| format!("'{}' requires {}", capability, range))
                    .collect();
                write!(
                    f,
                    "conflicting ranges for \"{}\" in profile {}: {}",
                    package,
                    profile,
                    ranges.join(", ")
                )?
            }
        }

        match (&self.kind, &self.capability) {
            (FindingKind::Missing { .. } | FindingKind::Mismatched { .. }, Some(capability)) => {
                write!(f, " [{}]", capability)
            }
            _ => Ok(()),
        }
    }
}
