//! The alignment workflow for a single package

use std::path::{Path, PathBuf};

use depalign_core::config::{
    default_presets, is_configured, migrate_config, read_kit_config, validate_config,
    write_migrated_config, AlignConfig,
};
use depalign_core::error::Result;
use depalign_core::findings::{DiffMode, Finding, FindingKind};
use depalign_core::requirement::Requirement;
use depalign_core::types::{Capability, KitType, Preset};
use depalign_manifest::{PackageCache, PackageManifest, PatchOptions, Patcher};
use depalign_presets::{select_profiles, ProfileSource, ProfileStore};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::bad_packages::{find_bad_packages, BadPackage};
use crate::capabilities::resolve_preset;
use crate::conflicts::ConflictDetector;
use crate::gather::gather_requirements;
use crate::plan::plan_dependencies;
use crate::vigilant::inspect_unconfigured;

/// Requirements used to inspect packages regardless of configuration
#[derive(Debug, Clone, PartialEq)]
pub struct VigilantRequirements {
    pub production: Vec<Requirement>,
    pub development: Vec<Requirement>,
}

/// Options for aligning a package
#[derive(Debug, Clone, Default)]
pub struct AlignOptions {
    /// Write fixes back to `package.json`
    pub write: bool,
    /// Keep going with the last satisfiable profiles when dependencies disagree
    pub loose: bool,
    /// How declared ranges are compared against expected ones
    pub diff_mode: DiffMode,
    /// Let the patcher remove misplaced dependencies
    pub remove_misplaced: bool,
    /// Rewrite legacy configuration into the current schema
    pub migrate_config: bool,
    /// Packages and dependencies to leave alone
    pub exclude_packages: Vec<String>,
    /// Additional profile source layered on top of the configured presets
    pub custom_profiles: Option<String>,
    /// Presets for packages without configuration
    pub presets: Option<Vec<String>>,
    /// Inspect every package against these requirements
    pub vigilant: Option<VigilantRequirements>,
}

impl AlignOptions {
    /// Options that write fixes
    pub fn write() -> Self {
        Self {
            write: true,
            ..Default::default()
        }
    }

    /// Set the diff mode
    pub fn with_diff_mode(mut self, diff_mode: DiffMode) -> Self {
        self.diff_mode = diff_mode;
        self
    }

    /// Enable vigilant inspection
    pub fn with_vigilant(mut self, vigilant: VigilantRequirements) -> Self {
        self.vigilant = Some(vigilant);
        self
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude_packages.iter().any(|e| e == name)
    }
}

/// Outcome of aligning one package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignStatus {
    /// Nothing left to fix
    Success,
    /// Error findings remain
    Unsatisfied,
    /// The package has no alignment configuration
    NotConfigured,
    /// The package was excluded on the command line
    Excluded,
}

/// Result of aligning one package
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignReport {
    pub package: String,
    pub path: PathBuf,
    pub status: AlignStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kit_type: Option<KitType>,
    pub production_profiles: Vec<String>,
    pub development_profiles: Vec<String>,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bad_packages: Vec<BadPackage>,
    /// Number of manifest entries changed on disk
    pub changes: usize,
}

impl AlignReport {
    fn new(manifest: &PackageManifest, path: &Path) -> Self {
        Self {
            package: manifest.name().unwrap_or_default().to_string(),
            path: path.to_path_buf(),
            status: AlignStatus::Success,
            kit_type: None,
            production_profiles: Vec::new(),
            development_profiles: Vec::new(),
            findings: Vec::new(),
            bad_packages: Vec::new(),
            changes: 0,
        }
    }

    /// Number of error findings
    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    /// Number of warning findings
    pub fn warning_count(&self) -> usize {
        self.findings.len() - self.error_count()
    }
}

fn profile_names(preset: &Preset) -> Vec<String> {
    preset.versions().iter().map(ToString::to_string).collect()
}

/// Profiles and capabilities selected for a configured package
struct Selection {
    production: Preset,
    development: Preset,
    capabilities: Vec<Capability>,
}

/// Aligns the dependencies of a package
pub struct AlignWorkflow {
    options: AlignOptions,
}

impl AlignWorkflow {
    /// Create a new workflow
    pub fn new(options: AlignOptions) -> Self {
        Self { options }
    }

    /// Workflow options
    pub fn options(&self) -> &AlignOptions {
        &self.options
    }

    /// Load the presets of a config, plus the custom profiles if given
    pub fn load_store(
        &self,
        presets: &[String],
        project_root: &Path,
        packages: &mut PackageCache,
    ) -> Result<ProfileStore> {
        let mut sources: Vec<ProfileSource> = presets
            .iter()
            .map(|spec| ProfileSource::from_spec(spec, project_root))
            .collect();
        if let Some(custom) = &self.options.custom_profiles {
            sources.push(ProfileSource::from_spec(custom, project_root));
        }
        ProfileStore::from_sources(&sources, packages)
    }

    /// Align the package whose manifest lives at `manifest_path`.
    ///
    /// Fatal errors are returned before anything is written.
    #[instrument(skip(self, packages), fields(path = %manifest_path.display()))]
    pub fn execute(&self, manifest_path: &Path, packages: &mut PackageCache) -> Result<AlignReport> {
        let mut manifest = PackageManifest::load(manifest_path)?;
        manifest.ensure_valid()?;
        let project_root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut report = AlignReport::new(&manifest, manifest_path);
        if let Some(bad) = find_bad_packages(&manifest) {
            let lines: Vec<String> = bad
                .iter()
                .map(|b| format!("\t{}@{}: {}", b.name, b.version, b.reason))
                .collect();
            warn!(
                "Known bad packages are found in '{}':\n{}",
                report.package,
                lines.join("\n")
            );
            report.bad_packages = bad;
        }

        if self.options.vigilant.is_some() && self.options.is_excluded(&report.package) {
            info!(package = %report.package, "excluded");
            report.status = AlignStatus::Excluded;
            return Ok(report);
        }

        let kit = read_kit_config(&project_root, &manifest.to_value())?;
        let mut migrated = false;
        let config = match kit.filter(is_configured) {
            Some(kit) => {
                let location = manifest_path.display().to_string();
                let align_deps = migrate_config(&kit, &location)?;
                let config = validate_config(&kit, &align_deps)?;
                if self.options.migrate_config
                    && !kit.legacy_keys().is_empty()
                    && manifest.kit_config().is_some()
                {
                    write_migrated_config(manifest.kit_config_mut(), &align_deps)?;
                    migrated = true;
                }
                Some(config)
            }
            None => None,
        };

        match &config {
            Some(config) => {
                report.kit_type = Some(config.kit_type);
                self.check_configured(&manifest, &project_root, config, &mut report, packages)?;
                if self.options.vigilant.is_some() && report.error_count() == 0 {
                    let store = self.load_store(&config.presets, &project_root, packages)?;
                    let findings = inspect_unconfigured(
                        &manifest,
                        config,
                        store.merged(),
                        &self.options.exclude_packages,
                    )?;
                    extend_unique(&mut report.findings, findings);
                }
            }
            None => match &self.options.vigilant {
                Some(vigilant) => {
                    let config = AlignConfig {
                        kit_type: KitType::Library,
                        presets: self.options.presets.clone().unwrap_or_else(default_presets),
                        production: vigilant.production.clone(),
                        development: vigilant.development.clone(),
                        capabilities: Vec::new(),
                    };
                    let store = self.load_store(&config.presets, &project_root, packages)?;
                    report.findings = inspect_unconfigured(
                        &manifest,
                        &config,
                        store.merged(),
                        &self.options.exclude_packages,
                    )?;
                }
                None => {
                    debug!(package = %report.package, "not configured");
                    report.status = AlignStatus::NotConfigured;
                    return Ok(report);
                }
            },
        }

        let mut remaining = report.findings.iter().filter(|f| f.is_error()).count();
        if self.options.write {
            let patcher = Patcher::new(PatchOptions {
                remove_misplaced: self.options.remove_misplaced,
            });
            report.changes = patcher.apply(&mut manifest, &report.findings);
            remaining = report
                .findings
                .iter()
                .filter(|f| f.is_error() && !self.is_fixed_by_write(f))
                .count();
        }
        if report.changes > 0 || migrated {
            manifest.save()?;
            packages.invalidate();
            info!(
                package = %report.package,
                changes = report.changes,
                migrated,
                "manifest updated"
            );
        }

        report.status = if remaining > 0 {
            AlignStatus::Unsatisfied
        } else {
            AlignStatus::Success
        };
        Ok(report)
    }

    fn is_fixed_by_write(&self, finding: &Finding) -> bool {
        match finding.kind {
            FindingKind::Missing { .. } | FindingKind::Mismatched { .. } => true,
            FindingKind::Misplaced { .. } => self.options.remove_misplaced,
            FindingKind::UnknownCapability { .. } | FindingKind::ConflictingVersion { .. } => false,
        }
    }

    fn select(
        &self,
        manifest: &PackageManifest,
        project_root: &Path,
        config: &AlignConfig,
        packages: &mut PackageCache,
    ) -> Result<Selection> {
        let store = self.load_store(&config.presets, project_root, packages)?;
        let merged = store.merged();
        let production = select_profiles(merged, &config.production)?;

        match config.kit_type {
            KitType::App => {
                let gathered = gather_requirements(
                    project_root,
                    manifest,
                    production,
                    &config.production,
                    &config.capabilities,
                    self.options.loose,
                    packages,
                )?;
                Ok(Selection {
                    production: gathered.preset,
                    development: Preset::new(merged.id.clone()),
                    capabilities: gathered.capabilities,
                })
            }
            KitType::Library => {
                let development = if config.has_shared_requirements() {
                    production.clone()
                } else {
                    select_profiles(merged, &config.development)?
                };
                Ok(Selection {
                    production,
                    development,
                    capabilities: config.capabilities.clone(),
                })
            }
        }
    }

    fn check_configured(
        &self,
        manifest: &PackageManifest,
        project_root: &Path,
        config: &AlignConfig,
        report: &mut AlignReport,
        packages: &mut PackageCache,
    ) -> Result<()> {
        let selection = self.select(manifest, project_root, config, packages)?;
        report.production_profiles = profile_names(&selection.production);
        report.development_profiles = profile_names(&selection.development);
        if selection.capabilities.is_empty() {
            debug!(package = %report.package, "no capabilities declared");
            return Ok(());
        }

        match config.kit_type {
            KitType::App => info!(
                package = %report.package,
                "Aligning your app's dependencies according to the following profiles: {}",
                report.production_profiles.join(", ")
            ),
            KitType::Library => info!(
                package = %report.package,
                development = %report.development_profiles.join(", "),
                production = %report.production_profiles.join(", "),
                "Aligning your library's dependencies"
            ),
        }

        let production = resolve_preset(&selection.capabilities, &selection.production)?;
        let development = resolve_preset(&selection.capabilities, &selection.development)?;
        let plan = plan_dependencies(config.kit_type, &production, &development);

        let detector = ConflictDetector::new(self.options.diff_mode)
            .with_excluded(self.options.exclude_packages.clone());
        let mut findings = detector.detect(manifest, &plan);

        let issues = production
            .iter()
            .chain(development.iter())
            .flat_map(|result| result.issues.iter().cloned())
            .map(Finding::from);
        extend_unique(&mut findings, issues);

        report.findings = findings;
        Ok(())
    }
}

/// Append findings, skipping those about a package and section already reported
fn extend_unique(findings: &mut Vec<Finding>, more: impl IntoIterator<Item = Finding>) {
    for finding in more {
        let duplicate = findings.iter().any(|f| {
            f == &finding
                || (f.section().is_some()
                    && f.section() == finding.section()
                    && f.package() == finding.package())
        });
        if !duplicate {
            findings.push(finding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depalign_core::types::DependencySection;
    use depalign_core::AlignError;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, manifest: Value) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("package.json");
        fs::write(&path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
        path
    }

    fn read_manifest(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn execute(options: AlignOptions, path: &Path) -> Result<AlignReport> {
        AlignWorkflow::new(options).execute(path, &mut PackageCache::new())
    }

    fn library(dependencies: Value) -> Value {
        json!({
            "name": "@acme/lib",
            "version": "1.0.0",
            "peerDependencies": dependencies,
            "depalign": {
                "kitType": "library",
                "alignDeps": {
                    "requirements": {
                        "production": ["react-native@0.73 || 0.74"],
                        "development": ["react-native@0.74"]
                    },
                    "capabilities": ["core-ios", "svg"]
                }
            }
        })
    }

    #[test]
    fn test_library_check_and_write() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(temp.path(), library(json!({ "react-native": "^0.72.0" })));

        let report = execute(AlignOptions::default(), &path).unwrap();
        assert_eq!(report.status, AlignStatus::Unsatisfied);
        assert_eq!(report.kit_type, Some(KitType::Library));
        assert_eq!(report.production_profiles, vec!["0.73", "0.74"]);
        assert_eq!(report.development_profiles, vec!["0.74"]);
        assert_eq!(report.changes, 0);

        let report = execute(AlignOptions::write(), &path).unwrap();
        assert_eq!(report.status, AlignStatus::Success);
        assert!(report.changes > 0);

        let manifest = read_manifest(&path);
        assert_eq!(manifest["peerDependencies"]["react-native"], "^0.73.0 || ^0.74.0");
        assert_eq!(manifest["peerDependencies"]["react-native-svg"], "^14.0.0 || ^15.2.0");
        assert_eq!(manifest["devDependencies"]["react-native"], "^0.74.0");
        assert_eq!(manifest["devDependencies"]["react"], "18.2.0");

        let report = execute(AlignOptions::default(), &path).unwrap();
        assert_eq!(report.status, AlignStatus::Success);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_write_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(temp.path(), library(json!({})));

        execute(AlignOptions::write(), &path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        let report = execute(AlignOptions::write(), &path).unwrap();
        assert_eq!(report.changes, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_not_configured() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(
            temp.path(),
            json!({ "name": "plain", "version": "1.0.0", "dependencies": { "react-native": "0.60.0" } }),
        );
        let report = execute(AlignOptions::default(), &path).unwrap();
        assert_eq!(report.status, AlignStatus::NotConfigured);
    }

    #[test]
    fn test_invalid_manifest() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(temp.path(), json!({ "dependencies": {} }));
        let err = execute(AlignOptions::default(), &path).unwrap_err();
        assert!(matches!(err, AlignError::Manifest(_)));
    }

    #[test]
    fn test_no_matching_profiles() {
        let temp = TempDir::new().unwrap();
        let mut manifest = library(json!({}));
        manifest["depalign"]["alignDeps"]["requirements"] = json!(["react-native@0.10"]);
        let path = write_manifest(temp.path(), manifest);

        let err = execute(AlignOptions::write(), &path).unwrap_err();
        assert!(matches!(err, AlignError::NoMatchingVersion { .. }));
        assert!(read_manifest(&path).get("devDependencies").is_none());
    }

    #[test]
    fn test_unknown_capability_reported() {
        let temp = TempDir::new().unwrap();
        let mut manifest = library(json!({}));
        manifest["depalign"]["alignDeps"]["capabilities"] = json!(["core-ios", "teleport"]);
        let path = write_manifest(temp.path(), manifest);

        let report = execute(AlignOptions::write(), &path).unwrap();
        assert_eq!(report.status, AlignStatus::Unsatisfied);
        assert!(report.findings.iter().any(|f| matches!(
            &f.kind,
            FindingKind::UnknownCapability { capability, .. } if capability == "teleport"
        )));
        assert_eq!(read_manifest(&path)["peerDependencies"]["react-native"], "^0.73.0 || ^0.74.0");
    }

    #[test]
    fn test_app_with_dependencies() {
        let temp = TempDir::new().unwrap();
        let lib_dir = temp.path().join("node_modules").join("@acme").join("lib");
        write_manifest(&lib_dir, library(json!({ "react-native": "^0.73.0 || ^0.74.0" })));
        let path = write_manifest(
            temp.path(),
            json!({
                "name": "app",
                "version": "1.0.0",
                "dependencies": { "@acme/lib": "1.0.0", "react-native": "^0.73.0" },
                "peerDependencies": { "react": "18.2.0" },
                "depalign": {
                    "kitType": "app",
                    "alignDeps": {
                        "requirements": ["react-native@>=0.70"],
                        "capabilities": ["core-ios"]
                    }
                }
            }),
        );

        let report = execute(AlignOptions::default(), &path).unwrap();
        assert_eq!(report.production_profiles, vec!["0.73", "0.74"]);
        let misplaced: Vec<_> = report
            .findings
            .iter()
            .filter(|f| matches!(f.kind, FindingKind::Misplaced { .. }))
            .collect();
        assert_eq!(misplaced.len(), 1);
        assert_eq!(misplaced[0].section(), Some(DependencySection::PeerDependencies));

        let mut options = AlignOptions::write();
        options.remove_misplaced = true;
        let report = execute(options, &path).unwrap();
        assert_eq!(report.status, AlignStatus::Success);

        let manifest = read_manifest(&path);
        assert_eq!(manifest["dependencies"]["react-native"], "^0.74.0");
        assert_eq!(manifest["dependencies"]["react-native-svg"], "^15.2.0");
        assert!(manifest.get("peerDependencies").is_none());
    }

    #[test]
    fn test_vigilant_unconfigured() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(
            temp.path(),
            json!({
                "name": "plain",
                "version": "1.0.0",
                "dependencies": { "react-native-svg": "^12.0.0", "react-native-webview": "^11.0.0" }
            }),
        );
        let vigilant = VigilantRequirements {
            production: Requirement::parse_all(&["react-native@0.74"]).unwrap(),
            development: Requirement::parse_all(&["react-native@0.74"]).unwrap(),
        };

        let mut options = AlignOptions::default().with_vigilant(vigilant.clone());
        options.exclude_packages = vec!["react-native-webview".to_string()];
        let report = execute(options, &path).unwrap();
        assert_eq!(report.status, AlignStatus::Unsatisfied);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].package(), Some("react-native-svg"));

        let mut options = AlignOptions::default().with_vigilant(vigilant);
        options.exclude_packages = vec!["plain".to_string()];
        let report = execute(options, &path).unwrap();
        assert_eq!(report.status, AlignStatus::Excluded);
    }

    #[test]
    fn test_vigilant_unknown_version() {
        let temp = TempDir::new().unwrap();
        let manifest = json!({
            "name": "plain",
            "version": "1.0.0",
            "dependencies": { "react-native-svg": "^12.0.0" }
        });
        let path = write_manifest(temp.path(), manifest.clone());
        let vigilant = VigilantRequirements {
            production: Requirement::parse_all(&["react-native@1000.0"]).unwrap(),
            development: Requirement::parse_all(&["react-native@1000.0"]).unwrap(),
        };

        let mut options = AlignOptions::write().with_vigilant(vigilant);
        options.remove_misplaced = true;
        let err = execute(options, &path).unwrap_err();
        assert!(matches!(err, AlignError::NoMatchingVersion { .. }));
        assert_eq!(
            err.to_string(),
            "No profiles could satisfy requirements: react-native@1000.0"
        );
        assert_eq!(read_manifest(&path), manifest);
    }

    #[test]
    fn test_migrate_legacy_config() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(
            temp.path(),
            json!({
                "name": "legacy",
                "version": "1.0.0",
                "depalign": {
                    "kitType": "library",
                    "reactNativeVersion": "^0.74.0",
                    "capabilities": ["core-ios"]
                },
                "peerDependencies": { "react": "18.2.0", "react-native": "^0.74.0" },
                "devDependencies": { "react": "18.2.0", "react-native": "^0.74.0" }
            }),
        );

        let options = AlignOptions {
            migrate_config: true,
            ..Default::default()
        };
        let report = execute(options, &path).unwrap();
        assert_eq!(report.status, AlignStatus::Success);

        let manifest = read_manifest(&path);
        let kit = &manifest["depalign"];
        assert!(kit.get("reactNativeVersion").is_none());
        assert_eq!(kit["alignDeps"]["capabilities"], json!(["core-ios"]));
        assert_eq!(
            kit["alignDeps"]["requirements"],
            json!({ "production": ["react-native@0.74"], "development": ["react-native@0.74"] })
        );
    }

    #[test]
    fn test_bad_packages_reported() {
        let temp = TempDir::new().unwrap();
        let path = write_manifest(
            temp.path(),
            json!({
                "name": "plain",
                "version": "1.0.0",
                "dependencies": { "react-native-netinfo": "^1.0.0" }
            }),
        );
        let report = execute(AlignOptions::default(), &path).unwrap();
        assert_eq!(report.bad_packages.len(), 1);
        assert_eq!(report.status, AlignStatus::NotConfigured);
    }
}
