//! Default configuration values

/// Key holding the kit configuration in `package.json`
pub const CONFIG_KEY: &str = "depalign";

/// Preset used when none is configured
pub const DEFAULT_PRESET: &str = "microsoft/react-native";

/// Package whose version selects the profile
pub const PLATFORM_PACKAGE: &str = "react-native";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "depalign.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "depalign.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".depalign.yaml",
        ".depalign.toml",
    ]
}

/// Presets used when `alignDeps.presets` is omitted
pub fn default_presets() -> Vec<String> {
    vec![DEFAULT_PRESET.to_string()]
}
