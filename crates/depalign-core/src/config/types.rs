//! Configuration types

use serde::{Deserialize, Serialize};

use crate::requirement::Requirement;
use crate::types::{Capability, KitType};

/// Kit configuration as written by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitConfig {
    /// Whether the package is an app or a library
    #[serde(default)]
    pub kit_type: KitType,

    /// Alignment configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_deps: Option<AlignDepsConfig>,

    /// Legacy: target platform version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub react_native_version: Option<String>,

    /// Legacy: platform version used during development
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub react_native_dev_version: Option<String>,

    /// Legacy: capabilities outside of `alignDeps`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<Capability>>,

    /// Legacy: single custom profile source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_profiles: Option<String>,
}

impl KitConfig {
    /// Legacy keys present in this config, as written in the manifest
    pub fn legacy_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.capabilities.is_some() {
            keys.push("capabilities");
        }
        if self.custom_profiles.is_some() {
            keys.push("customProfiles");
        }
        if self.react_native_dev_version.is_some() {
            keys.push("reactNativeDevVersion");
        }
        if self.react_native_version.is_some() {
            keys.push("reactNativeVersion");
        }
        keys
    }
}

/// The `alignDeps` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignDepsConfig {
    /// Preset identifiers or paths, applied in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presets: Option<Vec<String>>,

    /// Requirements used to select profiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Requirements>,

    /// Capabilities the package depends on
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// Requirements, either shared or split by environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirements {
    /// Same requirements for development and production
    Flat(Vec<String>),
    /// Separate requirements per environment
    Split {
        #[serde(default)]
        production: Vec<String>,
        #[serde(default)]
        development: Vec<String>,
    },
}

impl Requirements {
    /// Production requirements
    pub fn production(&self) -> &[String] {
        match self {
            Self::Flat(reqs) => reqs,
            Self::Split { production, .. } => production,
        }
    }

    /// Development requirements
    pub fn development(&self) -> &[String] {
        match self {
            Self::Flat(reqs) => reqs,
            Self::Split { development, .. } => development,
        }
    }
}

/// Validated configuration ready for resolution
#[derive(Debug, Clone, PartialEq)]
pub struct AlignConfig {
    /// Kit type
    pub kit_type: KitType,
    /// Preset identifiers, applied in order
    pub presets: Vec<String>,
    /// Requirements selecting the production profiles
    pub production: Vec<Requirement>,
    /// Requirements selecting the development profile
    pub development: Vec<Requirement>,
    /// Declared capabilities
    pub capabilities: Vec<Capability>,
}

impl AlignConfig {
    /// Whether both environments use the same requirements
    pub fn has_shared_requirements(&self) -> bool {
        self.production == self.development
    }
}
