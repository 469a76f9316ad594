//! Core types for depalign

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named unit of platform functionality, e.g. `core-android` or `storage`
pub type Capability = String;

/// Capabilities that must always be declared by the hosting app: `core` and `core-*`
pub fn is_core_capability(capability: &str) -> bool {
    capability == "core" || capability.starts_with("core-")
}

/// Output ordering for capabilities: core capabilities first, alphabetical thereafter
pub fn capability_order(a: &str, b: &str) -> Ordering {
    is_core_capability(b)
        .cmp(&is_core_capability(a))
        .then_with(|| a.cmp(b))
}

/// Whether a package consumes capabilities (library) or provides them (app)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KitType {
    /// Provides capabilities; dependencies are declared directly
    App,
    /// Consumes capabilities; dependencies are declared as peers
    #[default]
    Library,
}

impl KitType {
    /// Returns the string representation of the kit type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Library => "library",
        }
    }
}

impl std::fmt::Display for KitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for KitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" => Ok(Self::App),
            "library" => Ok(Self::Library),
            _ => Err(format!("Invalid kit type: '{}'", s)),
        }
    }
}

/// Platform version keying a profile, e.g. `0.73`.
///
/// Ordered numerically component by component, so `0.9 < 0.70 < 0.100`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileVersion(String);

impl ProfileVersion {
    /// Create a profile version from its key
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The version key as written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key looks like a version (`0.73`, `1`, `0.73.0`)
    pub fn is_version_key(key: &str) -> bool {
        !key.is_empty()
            && key
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
    }

    fn components(&self) -> Vec<u64> {
        self.0
            .split('.')
            .map(|part| part.parse::<u64>().unwrap_or(0))
            .collect()
    }
}

impl Ord for ProfileVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components()
            .cmp(&other.components())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ProfileVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProfileVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One concrete package and the range a capability requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectEntry {
    /// Package name
    pub name: String,
    /// npm version range
    pub version: String,
    /// Only needed during development
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dev_only: bool,
    /// Capabilities this package pulls in, e.g. `react-native` pulls in `react`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
}

impl DirectEntry {
    /// Create a runtime entry
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dev_only: false,
            capabilities: Vec::new(),
        }
    }

    /// Mark the entry as development-only
    pub fn dev_only(mut self) -> Self {
        self.dev_only = true;
        self
    }

    /// Add capabilities this package pulls in
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Capability>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }
}

/// A capability that expands into other capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaEntry {
    /// Capabilities to install instead of a package
    pub capabilities: Vec<Capability>,
    /// Everything reached through this entry is development-only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dev_only: bool,
}

impl MetaEntry {
    /// Create a meta entry expanding into the given capabilities
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Capability>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            dev_only: false,
        }
    }
}

/// What a capability resolves to within one profile version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PackageEntry {
    /// A concrete package
    Direct(DirectEntry),
    /// A bundle of other capabilities
    Meta(MetaEntry),
}

impl PackageEntry {
    /// Whether the entry is flagged development-only
    pub fn is_dev_only(&self) -> bool {
        match self {
            Self::Direct(entry) => entry.dev_only,
            Self::Meta(entry) => entry.dev_only,
        }
    }

    /// Capabilities the entry expands into
    pub fn capabilities(&self) -> &[Capability] {
        match self {
            Self::Direct(entry) => &entry.capabilities,
            Self::Meta(entry) => &entry.capabilities,
        }
    }

    /// The package name for direct entries
    pub fn package_name(&self) -> Option<&str> {
        match self {
            Self::Direct(entry) => Some(&entry.name),
            Self::Meta(_) => None,
        }
    }
}

impl From<DirectEntry> for PackageEntry {
    fn from(entry: DirectEntry) -> Self {
        Self::Direct(entry)
    }
}

impl From<MetaEntry> for PackageEntry {
    fn from(entry: MetaEntry) -> Self {
        Self::Meta(entry)
    }
}

/// Capability -> entry mapping for one profile version
pub type CapabilityMap = BTreeMap<Capability, PackageEntry>;

/// A named collection of profiles keyed by platform version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// Preset identifier, e.g. `microsoft/react-native` or a file path
    pub id: String,
    /// Profiles by version
    pub profiles: BTreeMap<ProfileVersion, CapabilityMap>,
}

impl Preset {
    /// Create an empty preset
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profiles: BTreeMap::new(),
        }
    }

    /// Add or replace a profile
    pub fn with_profile(mut self, version: impl Into<ProfileVersion>, profile: CapabilityMap) -> Self {
        self.profiles.insert(version.into(), profile);
        self
    }

    /// All profile versions, ascending
    pub fn versions(&self) -> Vec<ProfileVersion> {
        self.profiles.keys().cloned().collect()
    }

    /// Look up the profile for a version
    pub fn profile(&self, version: &ProfileVersion) -> Option<&CapabilityMap> {
        self.profiles.get(version)
    }

    /// Keep only the given versions
    pub fn retain_versions(&self, versions: &[ProfileVersion]) -> Preset {
        Preset {
            id: self.id.clone(),
            profiles: self
                .profiles
                .iter()
                .filter(|(version, _)| versions.contains(version))
                .map(|(version, profile)| (version.clone(), profile.clone()))
                .collect(),
        }
    }

    /// Whether the preset has no profiles
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Which dependency field of a manifest a package belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencySection {
    /// `dependencies`
    #[serde(rename = "dependencies")]
    Dependencies,
    /// `peerDependencies`
    #[serde(rename = "peerDependencies")]
    PeerDependencies,
    /// `devDependencies`
    #[serde(rename = "devDependencies")]
    DevDependencies,
}

impl DependencySection {
    /// All sections in manifest order
    pub const ALL: [DependencySection; 3] = [
        Self::Dependencies,
        Self::PeerDependencies,
        Self::DevDependencies,
    ];

    /// The `package.json` key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::PeerDependencies => "peerDependencies",
            Self::DevDependencies => "devDependencies",
        }
    }
}

impl std::fmt::Display for DependencySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete package computed by the capability resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPackage {
    /// Package name
    pub name: String,
    /// Required npm version range
    pub version: String,
    /// True only if every path reaching the package is development-only
    pub dev_only: bool,
    /// Capabilities through which the package was reached, in output order
    pub capabilities: Vec<Capability>,
}

/// Non-fatal problem found while resolving capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResolutionIssue {
    /// No loaded profile knows the capability
    UnknownCapability { capability: Capability, version: String },
    /// Two capabilities demand non-intersecting ranges for one package
    ConflictingVersion {
        package: String,
        version: String,
        ranges: Vec<(Capability, String)>,
    },
}

impl std::fmt::Display for ResolutionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCapability {
                capability,
                version,
            } => write!(f, "unknown capability '{}' (profile {})", capability, version),
            Self::ConflictingVersion {
                package, ranges, ..
            } => {
                let ranges: Vec<String> = ranges
                    .iter()
                    .map(|(capability, range)| format!("{} via '{}'", range, capability))
                    .collect();
                write!(f, "conflicting ranges for '{}': {}", package, ranges.join(", "))
            }
        }
    }
}

/// Flattened package map computed for one profile version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Profile version the result was computed against
    pub profile: ProfileVersion,
    /// Packages, ordered by their first capability (core first, then alphabetical)
    pub packages: Vec<ResolvedPackage>,
    /// Non-fatal problems encountered during resolution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ResolutionIssue>,
}

impl ResolutionResult {
    /// Create an empty result for a profile version
    pub fn new(profile: ProfileVersion) -> Self {
        Self {
            profile,
            packages: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Look up a package by name
    pub fn get(&self, name: &str) -> Option<&ResolvedPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Package names in output order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|p| p.name.as_str())
    }

    /// Number of resolved packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns true if nothing was resolved
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_capability() {
        assert!(is_core_capability("core"));
        assert!(is_core_capability("core-android"));
        assert!(!is_core_capability("core/metro-config"));
        assert!(!is_core_capability("corelike"));
    }

    #[test]
    fn test_capability_order() {
        let mut caps = vec!["storage", "core-ios", "animation", "core", "core-android"];
        caps.sort_by(|a, b| capability_order(a, b));
        assert_eq!(caps, vec!["core", "core-android", "core-ios", "animation", "storage"]);
    }

    #[test]
    fn test_profile_version_ordering() {
        let mut versions: Vec<ProfileVersion> = ["0.70", "0.100", "0.9", "0.69"]
            .into_iter()
            .map(ProfileVersion::from)
            .collect();
        versions.sort();
        let keys: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(keys, vec!["0.9", "0.69", "0.70", "0.100"]);
    }

    #[test]
    fn test_version_key_detection() {
        assert!(ProfileVersion::is_version_key("0.73"));
        assert!(ProfileVersion::is_version_key("1"));
        assert!(!ProfileVersion::is_version_key("core"));
        assert!(!ProfileVersion::is_version_key("0.x"));
        assert!(!ProfileVersion::is_version_key(""));
    }

    #[test]
    fn test_package_entry_serialization() {
        let entry: PackageEntry = DirectEntry::new("react-native", "^0.73.0")
            .with_capabilities(["react"])
            .into();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "direct");
        assert_eq!(json["capabilities"][0], "react");
        assert!(json.get("devOnly").is_none());

        let meta: PackageEntry = serde_json::from_str(r#"{"kind":"meta","capabilities":["a","b"]}"#).unwrap();
        assert_eq!(meta, PackageEntry::Meta(MetaEntry::new(["a", "b"])));
    }

    #[test]
    fn test_kit_type_parse() {
        assert_eq!("app".parse::<KitType>().unwrap(), KitType::App);
        assert!("service".parse::<KitType>().is_err());
        assert_eq!(KitType::default(), KitType::Library);
    }
}
