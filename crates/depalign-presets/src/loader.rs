//! Loading presets from their sources

use std::path::{Path, PathBuf};

use depalign_core::error::{ConfigError, Result};
use depalign_core::types::{
    CapabilityMap, DirectEntry, MetaEntry, PackageEntry, Preset, ProfileVersion,
};
use depalign_manifest::PackageCache;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::builtin::builtin_preset;

/// Name marking a meta entry in the legacy profile format
const LEGACY_META_NAME: &str = "#meta";

/// File extensions a profile file may have
const PROFILE_EXTENSIONS: [&str; 4] = ["json", "yaml", "yml", "toml"];

/// Where a preset comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileSource {
    /// A preset shipped with this tool
    Builtin(String),
    /// A JSON, YAML or TOML file
    FilePath(PathBuf),
    /// An installed package, looked up through `node_modules` from `root`
    ModuleName { name: String, root: PathBuf },
    /// An already parsed preset object
    Inline { id: String, value: Value },
}

impl ProfileSource {
    /// Interpret a preset identifier from configuration or the command line
    pub fn from_spec(spec: &str, project_root: &Path) -> Self {
        if builtin_preset(spec).is_some() {
            return Self::Builtin(spec.to_string());
        }

        let path = Path::new(spec);
        let is_profile_file = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| PROFILE_EXTENSIONS.contains(&e));
        if spec.starts_with('.')
            || path.is_absolute()
            || (is_profile_file && project_root.join(path).is_file())
        {
            return Self::FilePath(project_root.join(path));
        }

        Self::ModuleName {
            name: spec.to_string(),
            root: project_root.to_path_buf(),
        }
    }

    /// Identifier used for the loaded preset
    pub fn id(&self) -> String {
        match self {
            Self::Builtin(id) => id.clone(),
            Self::FilePath(path) => path.display().to_string(),
            Self::ModuleName { name, .. } => name.clone(),
            Self::Inline { id, .. } => id.clone(),
        }
    }
}

impl std::fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

fn invalid(source_id: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidProfile {
        source_id: source_id.to_string(),
        message: message.into(),
    }
}

/// Load a preset from its source
pub fn load_preset(source: &ProfileSource, packages: &mut PackageCache) -> Result<Preset> {
    info!(source = %source, "loading preset");
    match source {
        ProfileSource::Builtin(id) => {
            builtin_preset(id).ok_or_else(|| invalid(id, "no such built-in preset").into())
        }
        ProfileSource::FilePath(path) => {
            let value = read_profile_file(path)?;
            parse_preset(&source.id(), value)
        }
        ProfileSource::ModuleName { name, root } => {
            let path = resolve_module(name, root, packages)?;
            debug!(module = %name, path = %path.display(), "resolved profile module");
            let value = read_profile_file(&path)?;
            parse_preset(name, value)
        }
        ProfileSource::Inline { id, value } => parse_preset(id, value.clone()),
    }
}

/// Read a JSON, YAML or TOML file into a JSON value
fn read_profile_file(path: &Path) -> Result<Value> {
    let source_id = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| invalid(&source_id, e.to_string()))?;

    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| invalid(&source_id, e.to_string()))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?,
        Some("toml") => toml::from_str(&content).map_err(ConfigError::TomlError)?,
        _ => return Err(invalid(&source_id, "unsupported profile format").into()),
    };
    Ok(value)
}

/// Split `@scope/pkg/sub/path` into the package name and the subpath
fn split_module(spec: &str) -> (&str, Option<&str>) {
    let segments = if spec.starts_with('@') { 2 } else { 1 };
    match spec.match_indices('/').nth(segments - 1) {
        Some((at, _)) => (&spec[..at], Some(&spec[at + 1..])),
        None => (spec, None),
    }
}

/// Find the profile file a module points to
fn resolve_module(spec: &str, root: &Path, packages: &mut PackageCache) -> Result<PathBuf> {
    let (name, subpath) = split_module(spec);
    let dir = packages
        .find_package_dir(name, root)
        .ok_or_else(|| ConfigError::UnresolvedModule {
            module: spec.to_string(),
            root: root.to_path_buf(),
        })?;

    if let Some(subpath) = subpath {
        return Ok(dir.join(subpath));
    }

    let manifest = packages.read_manifest(&dir.join("package.json"))?;
    if let Some(main) = manifest.get("main").and_then(Value::as_str) {
        let main_path = dir.join(main);
        let is_data = main_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| PROFILE_EXTENSIONS.contains(&e));
        if is_data {
            return Ok(main_path);
        }
    }

    ["profiles.json", "index.json"]
        .iter()
        .map(|file| dir.join(file))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            invalid(
                spec,
                "module does not export profiles as JSON, YAML or TOML; JavaScript modules are not supported",
            )
            .into()
        })
}

/// Turn a parsed profile object into a preset.
///
/// Keys that look like versions hold capability maps; any other key is a
/// capability applied to every version in the source.
pub fn parse_preset(source_id: &str, value: Value) -> Result<Preset> {
    let Value::Object(root) = value else {
        return Err(invalid(source_id, "expected an object of profiles").into());
    };

    let mut preset = Preset::new(source_id);
    let mut shared = CapabilityMap::new();

    for (key, value) in root {
        if ProfileVersion::is_version_key(&key) {
            let Value::Object(entries) = value else {
                return Err(invalid(source_id, format!("profile '{}' is not an object", key)).into());
            };
            preset
                .profiles
                .insert(ProfileVersion::new(key), parse_profile(source_id, entries)?);
        } else {
            shared.insert(key.clone(), parse_entry(source_id, &key, value)?);
        }
    }

    if !shared.is_empty() {
        for profile in preset.profiles.values_mut() {
            profile.extend(shared.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    debug!(source = source_id, versions = preset.profiles.len(), "preset parsed");
    Ok(preset)
}

fn parse_profile(source_id: &str, entries: Map<String, Value>) -> Result<CapabilityMap> {
    entries
        .into_iter()
        .map(|(capability, value)| {
            let entry = parse_entry(source_id, &capability, value)?;
            Ok((capability, entry))
        })
        .collect()
}

/// Decide once whether an entry is direct or meta.
///
/// An explicit `kind` wins. Otherwise the legacy shape applies: a `name` of
/// `#meta` marks a meta entry and anything else must carry a `version`.
fn parse_entry(source_id: &str, capability: &str, value: Value) -> Result<PackageEntry> {
    let bad_entry = |message: String| invalid(source_id, format!("capability '{}': {}", capability, message));

    let Value::Object(fields) = value else {
        return Err(bad_entry("expected an object".to_string()).into());
    };

    if fields.contains_key("kind") {
        return serde_json::from_value(Value::Object(fields))
            .map_err(|e| bad_entry(e.to_string()).into());
    }

    let dev_only = fields
        .get("devOnly")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let capabilities = match fields.get("capabilities") {
        None => Vec::new(),
        Some(value) => serde_json::from_value::<Vec<String>>(value.clone())
            .map_err(|e| bad_entry(e.to_string()))?,
    };

    let name = fields.get("name").and_then(Value::as_str);
    if name == Some(LEGACY_META_NAME) {
        if !fields.contains_key("capabilities") {
            return Err(bad_entry("meta entry without 'capabilities'".to_string()).into());
        }
        return Ok(PackageEntry::Meta(MetaEntry {
            capabilities,
            dev_only,
        }));
    }

    let name = name.ok_or_else(|| bad_entry("missing 'name'".to_string()))?;
    let version = fields
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_entry("missing 'version'".to_string()))?;

    Ok(PackageEntry::Direct(DirectEntry {
        name: name.to_string(),
        version: version.to_string(),
        dev_only,
        capabilities,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn profile(preset: &Preset, version: &str) -> CapabilityMap {
        preset.profile(&ProfileVersion::from(version)).unwrap().clone()
    }

    #[test]
    fn test_parse_tagged_entries() {
        let preset = parse_preset(
            "inline",
            json!({
                "0.72": {
                    "x": { "kind": "meta", "capabilities": ["a", "b"] },
                    "a": { "kind": "direct", "name": "pkg-a", "version": "^1.0.0", "devOnly": true }
                }
            }),
        )
        .unwrap();

        let map = profile(&preset, "0.72");
        assert_eq!(map["x"], PackageEntry::Meta(MetaEntry::new(["a", "b"])));
        assert_eq!(
            map["a"],
            PackageEntry::Direct(DirectEntry::new("pkg-a", "^1.0.0").dev_only())
        );
    }

    #[test]
    fn test_parse_legacy_entries() {
        let preset = parse_preset(
            "inline",
            json!({
                "0.70": {
                    "hermes": { "name": "#meta", "capabilities": [] },
                    "core": { "name": "react-native", "version": "^0.70.0", "capabilities": ["react"] }
                }
            }),
        )
        .unwrap();

        let map = profile(&preset, "0.70");
        assert_eq!(map["hermes"], PackageEntry::Meta(MetaEntry::default()));
        assert_eq!(map["core"].capabilities(), ["react".to_string()]);
    }

    #[test]
    fn test_kind_overrides_legacy_shape() {
        // Both shapes would fit; the explicit discriminant decides
        let preset = parse_preset(
            "inline",
            json!({
                "1.0": {
                    "bundle": { "kind": "meta", "name": "bundle", "version": "1.0.0", "capabilities": ["x"] }
                }
            }),
        );
        // `name`/`version` are unknown fields for a meta entry and are ignored
        let map = profile(&preset.unwrap(), "1.0");
        assert!(matches!(map["bundle"], PackageEntry::Meta(_)));
    }

    #[test]
    fn test_root_level_capability_applies_to_all_versions() {
        let preset = parse_preset(
            "custom",
            json!({
                "0.73": { "core": { "name": "react-native", "version": "^0.73.0" } },
                "0.74": { "core": { "name": "react-native", "version": "^0.74.0" } },
                "my-capability": { "name": "my-package", "version": "^2.0.0" }
            }),
        )
        .unwrap();

        for version in ["0.73", "0.74"] {
            assert_eq!(
                profile(&preset, version)["my-capability"].package_name(),
                Some("my-package")
            );
        }
    }

    #[test]
    fn test_invalid_sources() {
        assert!(parse_preset("bad", json!(["0.73"])).is_err());
        assert!(parse_preset("bad", json!({ "0.73": "react-native" })).is_err());

        let err = parse_preset(
            "bad",
            json!({ "0.73": { "core": { "name": "react-native" } } }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing 'version'"));
    }

    #[test]
    fn test_from_spec() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("profiles.json"), "{}").unwrap();

        assert_eq!(
            ProfileSource::from_spec("microsoft/react-native", temp.path()),
            ProfileSource::Builtin("microsoft/react-native".to_string())
        );
        assert_eq!(
            ProfileSource::from_spec("./custom.yaml", temp.path()),
            ProfileSource::FilePath(temp.path().join("./custom.yaml"))
        );
        assert_eq!(
            ProfileSource::from_spec("profiles.json", temp.path()),
            ProfileSource::FilePath(temp.path().join("profiles.json"))
        );
        assert!(matches!(
            ProfileSource::from_spec("@acme/profiles", temp.path()),
            ProfileSource::ModuleName { .. }
        ));
    }

    #[test]
    fn test_load_from_files() {
        let temp = TempDir::new().unwrap();
        let yaml = temp.path().join("custom.yaml");
        std::fs::write(
            &yaml,
            "\"0.73\":\n  storage:\n    name: my-storage\n    version: ^1.0.0\n",
        )
        .unwrap();
        let toml_path = temp.path().join("custom.toml");
        std::fs::write(
            &toml_path,
            "[\"0.73\".storage]\nname = \"my-storage\"\nversion = \"^2.0.0\"\n",
        )
        .unwrap();

        let mut packages = PackageCache::new();
        let from_yaml = load_preset(&ProfileSource::FilePath(yaml), &mut packages).unwrap();
        let from_toml = load_preset(&ProfileSource::FilePath(toml_path), &mut packages).unwrap();
        assert_eq!(
            profile(&from_yaml, "0.73")["storage"],
            PackageEntry::Direct(DirectEntry::new("my-storage", "^1.0.0"))
        );
        assert_eq!(
            profile(&from_toml, "0.73")["storage"],
            PackageEntry::Direct(DirectEntry::new("my-storage", "^2.0.0"))
        );
    }

    #[test]
    fn test_load_from_module() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("node_modules").join("@acme").join("profiles");
        std::fs::create_dir_all(&module).unwrap();
        std::fs::write(
            module.join("package.json"),
            r#"{"name": "@acme/profiles", "version": "1.0.0", "main": "profiles.yaml"}"#,
        )
        .unwrap();
        std::fs::write(
            module.join("profiles.yaml"),
            "\"0.74\":\n  test-app:\n    name: react-native-test-app\n    version: ^3.0.0\n    devOnly: true\n",
        )
        .unwrap();

        let mut packages = PackageCache::new();
        let source = ProfileSource::from_spec("@acme/profiles", temp.path());
        let preset = load_preset(&source, &mut packages).unwrap();
        assert_eq!(preset.id, "@acme/profiles");
        assert!(profile(&preset, "0.74")["test-app"].is_dev_only());
    }

    #[test]
    fn test_javascript_module_rejected() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("node_modules").join("js-profiles");
        std::fs::create_dir_all(&module).unwrap();
        std::fs::write(
            module.join("package.json"),
            r#"{"name": "js-profiles", "version": "1.0.0", "main": "index.js"}"#,
        )
        .unwrap();

        let mut packages = PackageCache::new();
        let source = ProfileSource::from_spec("js-profiles", temp.path());
        let err = load_preset(&source, &mut packages).unwrap_err();
        assert!(err.to_string().contains("JavaScript modules are not supported"));

        let missing = ProfileSource::from_spec("not-installed", temp.path());
        assert!(load_preset(&missing, &mut packages).is_err());
    }

    #[test]
    fn test_split_module() {
        assert_eq!(split_module("@acme/profiles"), ("@acme/profiles", None));
        assert_eq!(
            split_module("@acme/profiles/lib/rn.json"),
            ("@acme/profiles", Some("lib/rn.json"))
        );
        assert_eq!(split_module("profiles/x.toml"), ("profiles", Some("x.toml")));
    }
}
