//! Package lookup through `node_modules`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use depalign_core::error::Result;
use tracing::trace;

use crate::manifest::PackageManifest;

/// Cache of package lookups and parsed manifests.
///
/// Created once per run and passed to whatever needs to look up packages.
/// Call [`PackageCache::invalidate`] after writing manifests to disk.
#[derive(Debug, Default)]
pub struct PackageCache {
    locations: HashMap<(String, PathBuf), Option<PathBuf>>,
    manifests: HashMap<PathBuf, PackageManifest>,
}

impl PackageCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the directory of an installed package, searching `node_modules`
    /// from `from` upwards
    pub fn find_package_dir(&mut self, name: &str, from: &Path) -> Option<PathBuf> {
        let key = (name.to_string(), from.to_path_buf());
        if let Some(found) = self.locations.get(&key) {
            return found.clone();
        }

        let found = from
            .ancestors()
            .map(|dir| dir.join("node_modules").join(name))
            .find(|dir| dir.join("package.json").is_file());
        trace!(package = name, from = %from.display(), found = ?found, "package lookup");
        self.locations.insert(key, found.clone());
        found
    }

    /// Read a manifest, reusing an earlier parse of the same file
    pub fn read_manifest(&mut self, path: &Path) -> Result<PackageManifest> {
        if let Some(manifest) = self.manifests.get(path) {
            return Ok(manifest.clone());
        }
        let manifest = PackageManifest::load(path)?;
        self.manifests.insert(path.to_path_buf(), manifest.clone());
        Ok(manifest)
    }

    /// Find an installed package and read its manifest
    pub fn find_package(&mut self, name: &str, from: &Path) -> Result<Option<PackageManifest>> {
        match self.find_package_dir(name, from) {
            Some(dir) => self.read_manifest(&dir.join("package.json")).map(Some),
            None => Ok(None),
        }
    }

    /// Forget everything cached so far
    pub fn invalidate(&mut self) {
        self.locations.clear();
        self.manifests.clear();
    }

    /// Number of cached manifests
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// Returns true if no manifest is cached
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install(root: &Path, name: &str, version: &str) -> PathBuf {
        let dir = root.join("node_modules").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("package.json"),
            format!(r#"{{"name": "{}", "version": "{}"}}"#, name, version),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_find_package_walks_up() {
        let temp = TempDir::new().unwrap();
        let installed = install(temp.path(), "@scope/profiles", "1.0.0");
        let nested = temp.path().join("packages").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        let mut cache = PackageCache::new();
        assert_eq!(cache.find_package_dir("@scope/profiles", &nested), Some(installed));
        assert_eq!(cache.find_package_dir("missing", &nested), None);
    }

    #[test]
    fn test_manifests_are_cached_until_invalidated() {
        let temp = TempDir::new().unwrap();
        let dir = install(temp.path(), "lib", "1.0.0");

        let mut cache = PackageCache::new();
        let first = cache.find_package("lib", temp.path()).unwrap().unwrap();
        assert_eq!(first.version(), Some("1.0.0"));
        assert_eq!(cache.len(), 1);

        std::fs::write(dir.join("package.json"), r#"{"name": "lib", "version": "2.0.0"}"#).unwrap();
        let cached = cache.find_package("lib", temp.path()).unwrap().unwrap();
        assert_eq!(cached.version(), Some("1.0.0"));

        cache.invalidate();
        assert!(cache.is_empty());
        let fresh = cache.find_package("lib", temp.path()).unwrap().unwrap();
        assert_eq!(fresh.version(), Some("2.0.0"));
    }
}
