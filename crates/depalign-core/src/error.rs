//! Error types for depalign

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AlignError
pub type Result<T> = std::result::Result<T, AlignError>;

/// Main error type for alignment operations
#[derive(Debug, Error)]
pub enum AlignError {
    /// Malformed or unreadable configuration or profile source
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Package manifest errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Version range errors
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Requested profile version is missing from a preset
    #[error("Profile '{version}' not found in preset '{preset}'")]
    NotFound { preset: String, version: String },

    /// Meta capability expansion looped back on itself
    #[error("Cyclic capability in profile {version}: {}", .cycle.join(" -> "))]
    CyclicCapability { version: String, cycle: Vec<String> },

    /// No profile version satisfies the requirements
    #[error("No profiles could satisfy requirements: {}", .requirements.join(", "))]
    NoMatchingVersion { requirements: Vec<String> },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// A profile source could not be turned into a preset
    #[error("Invalid profile source '{source_id}': {message}")]
    InvalidProfile { source_id: String, message: String },

    /// A profile module could not be located
    #[error("Cannot resolve module '{module}' from {}", .root.display())]
    UnresolvedModule { module: String, root: PathBuf },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Package manifest errors
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Package manifest not found
    #[error("Package manifest not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse manifest
    #[error("Failed to parse manifest {}: {message}", .path.display())]
    ParseError { path: PathBuf, message: String },

    /// Manifest is missing `name` or `version`
    #[error("'{}' does not contain a valid package manifest - please make sure it's not missing 'name' or 'version'", .0.display())]
    Invalid(PathBuf),

    /// Failed to write manifest
    #[error("Failed to write manifest {}: {message}", .path.display())]
    WriteFailed { path: PathBuf, message: String },
}

/// Version range errors
#[derive(Debug, Error)]
pub enum RangeError {
    /// Range could not be parsed
    #[error("Invalid version range '{0}'")]
    InvalidRange(String),

    /// Requirement is not of the form `name@range`
    #[error("Invalid requirement '{0}'")]
    InvalidRequirement(String),
}
