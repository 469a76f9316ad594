//! package.json handling

use std::io::Write;
use std::path::{Path, PathBuf};

use depalign_core::config::CONFIG_KEY;
use depalign_core::error::{ManifestError, Result};
use depalign_core::types::DependencySection;
use serde_json::{Map, Value};
use tracing::debug;

/// A package manifest.
///
/// Keeps the full JSON object so that keys this tool does not know about,
/// and the order of all keys, survive a write-back.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    path: Option<PathBuf>,
    fields: Map<String, Value>,
}

impl PackageManifest {
    /// Load package.json from path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ManifestError::NotFound(path.to_path_buf()))?;
        let mut manifest = Self::parse(&content, path)?;
        manifest.path = Some(path.to_path_buf());
        Ok(manifest)
    }

    /// Parse manifest content; `path` is used for error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| ManifestError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        match value {
            Value::Object(fields) => Ok(Self { path: None, fields }),
            _ => Err(ManifestError::ParseError {
                path: path.to_path_buf(),
                message: "expected a JSON object".to_string(),
            }
            .into()),
        }
    }

    /// Build a manifest from a JSON value; non-objects yield an empty manifest
    pub fn from_value(value: Value) -> Self {
        let fields = match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        Self { path: None, fields }
    }

    /// Path the manifest was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Directory containing the manifest
    pub fn dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    /// Package name
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Package version
    pub fn version(&self) -> Option<&str> {
        self.fields.get("version").and_then(Value::as_str)
    }

    /// Whether the manifest has both `name` and `version`
    pub fn is_valid(&self) -> bool {
        self.name().is_some() && self.version().is_some()
    }

    /// Fail with `ManifestError::Invalid` unless the manifest is valid
    pub fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let path = self
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from("package.json"));
            Err(ManifestError::Invalid(path).into())
        }
    }

    /// Dependencies declared in a section, in manifest order
    pub fn dependencies(&self, section: DependencySection) -> Vec<(&str, &str)> {
        self.section(section)
            .map(|deps| {
                deps.iter()
                    .filter_map(|(name, version)| Some((name.as_str(), version.as_str()?)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Declared range of a package in a section
    pub fn dependency(&self, section: DependencySection, name: &str) -> Option<&str> {
        self.section(section)?.get(name)?.as_str()
    }

    /// Whether the package is declared in any section
    pub fn declares(&self, name: &str) -> bool {
        DependencySection::ALL
            .iter()
            .any(|section| self.dependency(*section, name).is_some())
    }

    /// Dependency section object
    pub fn section(&self, section: DependencySection) -> Option<&Map<String, Value>> {
        self.fields.get(section.as_str())?.as_object()
    }

    /// Mutable dependency section, created at the end of the manifest if absent
    pub fn section_mut(&mut self, section: DependencySection) -> &mut Map<String, Value> {
        let entry = self
            .fields
            .entry(section.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("section was just made an object"),
        }
    }

    /// Remove a top-level key, keeping the order of the remaining ones
    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        let removed = self.fields.get(key).cloned()?;
        self.fields = std::mem::take(&mut self.fields)
            .into_iter()
            .filter(|(k, _)| k != key)
            .collect();
        Some(removed)
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a top-level field; existing keys keep their position
    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// The kit configuration object, if present
    pub fn kit_config(&self) -> Option<&Value> {
        self.fields.get(CONFIG_KEY)
    }

    /// Mutable kit configuration object, created if absent
    pub fn kit_config_mut(&mut self) -> &mut Value {
        self.fields
            .entry(CONFIG_KEY)
            .or_insert_with(|| Value::Object(Map::new()))
    }

    /// Workspace globs from `workspaces` (array or `{ packages: [...] }`)
    pub fn workspaces(&self) -> Vec<String> {
        let patterns = match self.fields.get("workspaces") {
            Some(Value::Array(patterns)) => patterns,
            Some(Value::Object(config)) => match config.get("packages") {
                Some(Value::Array(patterns)) => patterns,
                _ => return Vec::new(),
            },
            _ => return Vec::new(),
        };
        patterns
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }

    /// The whole manifest as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Serialize with two-space indentation and a trailing newline
    pub fn to_json_string(&self) -> Result<String> {
        let content = serde_json::to_string_pretty(&self.fields)?;
        Ok(format!("{}\n", content))
    }

    /// Write the manifest back to the path it was loaded from
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| ManifestError::WriteFailed {
                path: PathBuf::from("package.json"),
                message: "manifest was not loaded from disk".to_string(),
            })?;
        self.save_to(path)
    }

    /// Write the manifest to a path.
    ///
    /// The content is written to a temporary file next to the target and then
    /// renamed over it, so a failed write leaves the original untouched.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = self.to_json_string()?;
        let write_failed = |message: String| ManifestError::WriteFailed {
            path: path.to_path_buf(),
            message,
        };

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| write_failed(e.to_string()))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| write_failed(e.to_string()))?;
        temp.persist(path)
            .map_err(|e| write_failed(e.error.to_string()))?;

        debug!(path = %path.display(), "manifest written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        std::fs::write(&path, r#"{"name": "test", "version": "1.0.0"}"#).unwrap();

        let pkg = PackageManifest::load(&path).unwrap();
        assert_eq!(pkg.name(), Some("test"));
        assert_eq!(pkg.version(), Some("1.0.0"));
        assert_eq!(pkg.dir(), Some(temp.path()));
        assert!(pkg.ensure_valid().is_ok());
    }

    #[test]
    fn test_invalid_manifest() {
        let pkg = PackageManifest::from_value(json!({ "name": "test" }));
        assert!(!pkg.is_valid());
        let err = pkg.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("missing 'name' or 'version'"));
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        assert!(PackageManifest::load(&path).is_err());

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(PackageManifest::load(&path).is_err());
    }

    #[test]
    fn test_dependencies() {
        let pkg = PackageManifest::from_value(json!({
            "name": "test",
            "version": "1.0.0",
            "dependencies": { "react": "18.2.0", "react-native": "^0.73.0" },
            "peerDependencies": { "react-native": "^0.73.0 || ^0.74.0" }
        }));

        assert_eq!(
            pkg.dependencies(DependencySection::Dependencies),
            vec![("react", "18.2.0"), ("react-native", "^0.73.0")]
        );
        assert_eq!(
            pkg.dependency(DependencySection::PeerDependencies, "react-native"),
            Some("^0.73.0 || ^0.74.0")
        );
        assert!(pkg.declares("react"));
        assert!(!pkg.declares("jest"));
        assert!(pkg.dependencies(DependencySection::DevDependencies).is_empty());
    }

    #[test]
    fn test_save_preserves_key_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"version": "1.0.0", "name": "test", "customField": "value", "dependencies": {"b": "1", "a": "2"}}"#,
        )
        .unwrap();

        let mut pkg = PackageManifest::load(&path).unwrap();
        pkg.set("version", json!("2.0.0"));
        pkg.save().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("}\n"));
        let version_at = content.find("\"version\"").unwrap();
        let name_at = content.find("\"name\"").unwrap();
        let b_at = content.find("\"b\"").unwrap();
        let a_at = content.find("\"a\"").unwrap();
        assert!(version_at < name_at);
        assert!(b_at < a_at);
        assert!(content.contains("\"customField\": \"value\""));
        assert!(content.contains("\"version\": \"2.0.0\""));
    }

    #[test]
    fn test_remove_field_keeps_order() {
        let mut pkg = PackageManifest::from_value(json!({ "a": 1, "b": 2, "c": 3, "d": 4 }));
        assert_eq!(pkg.remove_field("b"), Some(json!(2)));
        assert_eq!(pkg.remove_field("b"), None);
        let keys: Vec<String> = pkg
            .to_value()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_workspaces() {
        let pkg = PackageManifest::from_value(json!({ "workspaces": ["packages/*", "apps/*"] }));
        assert_eq!(pkg.workspaces(), vec!["packages/*", "apps/*"]);

        let pkg = PackageManifest::from_value(json!({ "workspaces": { "packages": ["libs/*"] } }));
        assert_eq!(pkg.workspaces(), vec!["libs/*"]);

        let pkg = PackageManifest::from_value(json!({ "name": "single" }));
        assert!(pkg.workspaces().is_empty());
    }
}
