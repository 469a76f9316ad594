//! Locating the manifests to process

use std::path::{Path, PathBuf};

use depalign_core::{ConfigError, Result};
use depalign_manifest::PackageManifest;
use tracing::{debug, warn};

const MANIFEST_FILE: &str = "package.json";

/// Resolve a package argument to a manifest path
fn manifest_path(arg: &Path) -> PathBuf {
    if arg.file_name().is_some_and(|name| name == MANIFEST_FILE) {
        arg.to_path_buf()
    } else {
        arg.join(MANIFEST_FILE)
    }
}

/// Nearest ancestor of `start` (inclusive) containing a package.json
pub fn find_package_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Manifests of the workspace packages matched by `patterns`.
///
/// Negated patterns are ignored. Matches without a package.json are skipped.
pub fn workspace_manifests(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();

    for pattern in patterns {
        if pattern.starts_with('!') {
            debug!(pattern = %pattern, "skipping negated workspace pattern");
            continue;
        }

        let full_pattern = root.join(pattern).to_string_lossy().to_string();
        let entries = glob::glob(&full_pattern).map_err(|e| ConfigError::InvalidValue {
            field: "workspaces".to_string(),
            message: format!("Invalid pattern '{}': {}", pattern, e),
        })?;

        for entry in entries.flatten() {
            let manifest = entry.join(MANIFEST_FILE);
            if entry.is_dir() && manifest.is_file() && !manifests.contains(&manifest) {
                manifests.push(manifest);
            }
        }
    }

    manifests.sort();
    Ok(manifests)
}

/// Manifests to process for the given package arguments.
///
/// Without arguments, the package containing `cwd` is used; if it declares
/// workspaces, every workspace package is included along with the root.
pub fn collect_manifests(packages: &[PathBuf], cwd: &Path) -> Result<Vec<PathBuf>> {
    if !packages.is_empty() {
        return Ok(packages
            .iter()
            .map(|p| manifest_path(&cwd.join(p)))
            .collect());
    }

    let Some(root) = find_package_root(cwd) else {
        warn!(directory = %cwd.display(), "no package.json found");
        return Ok(Vec::new());
    };
    let root_manifest = root.join(MANIFEST_FILE);
    let manifest = PackageManifest::load(&root_manifest)?;

    let patterns = manifest.workspaces();
    if patterns.is_empty() {
        return Ok(vec![root_manifest]);
    }

    let mut manifests = workspace_manifests(&root, &patterns)?;
    debug!(count = manifests.len(), "found workspace packages");
    manifests.push(root_manifest);
    Ok(manifests)
}
