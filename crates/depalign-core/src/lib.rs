//! depalign core - shared types for dependency alignment
//!
//! This crate provides the error taxonomy, the capability/profile data model,
//! npm-style version ranges and kit configuration loading used by the other
//! depalign crates.

pub mod config;
pub mod error;
pub mod findings;
pub mod range;
pub mod requirement;
pub mod types;

pub use config::{AlignConfig, KitConfig};
pub use error::{AlignError, ConfigError, ManifestError, RangeError, Result};
pub use findings::{DiffMode, Finding, FindingKind, Severity};
pub use range::VersionRange;
pub use requirement::Requirement;
pub use types::{
    Capability, CapabilityMap, DependencySection, DirectEntry, KitType, MetaEntry, PackageEntry,
    Preset, ProfileVersion, ResolutionIssue, ResolutionResult, ResolvedPackage,
};
