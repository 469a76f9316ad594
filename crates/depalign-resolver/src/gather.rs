//! Gathering requirements from an app's dependencies

use std::collections::HashSet;
use std::path::Path;

use depalign_core::config::{read_kit_config, KitConfig, PLATFORM_PACKAGE};
use depalign_core::error::{AlignError, Result};
use depalign_core::requirement::Requirement;
use depalign_core::types::{is_core_capability, Capability, DependencySection, Preset};
use depalign_manifest::{PackageCache, PackageManifest};
use depalign_presets::filter_preset;
use tracing::{debug, error, instrument, warn};

/// Profiles and capabilities an app has to satisfy
#[derive(Debug, Clone)]
pub struct GatheredRequirements {
    /// Production profiles left after narrowing
    pub preset: Preset,
    /// Capabilities of dependencies followed by the app's own
    pub capabilities: Vec<Capability>,
}

/// One step in narrowing the profile set
#[derive(Debug, Clone)]
struct TraceEntry {
    module: String,
    requirements: Vec<String>,
    profiles: Vec<String>,
}

impl TraceEntry {
    fn new(module: &str, requirements: &[String], preset: &Preset) -> Self {
        Self {
            module: module.to_string(),
            requirements: requirements.to_vec(),
            profiles: preset.versions().iter().map(ToString::to_string).collect(),
        }
    }
}

fn format_trace(message: &str, trace: &[TraceEntry]) -> String {
    let mut lines = vec![message.to_string()];
    for entry in trace {
        lines.push(format!(
            "\t[{}] satisfies '{}' because it requires {}",
            entry.profiles.join(", "),
            entry.module,
            entry.requirements.join(", ")
        ));
    }
    lines.join("\n")
}

/// Production requirements declared by a dependency, if any
fn dependency_requirements(kit: &KitConfig) -> Option<Vec<String>> {
    if let Some(requirements) = kit.align_deps.as_ref().and_then(|a| a.requirements.as_ref()) {
        return Some(requirements.production().to_vec());
    }
    kit.react_native_version
        .as_ref()
        .map(|version| vec![format!("{}@{}", PLATFORM_PACKAGE, version)])
}

fn dependency_capabilities(kit: &KitConfig) -> Vec<Capability> {
    match &kit.align_deps {
        Some(align_deps) => align_deps.capabilities.clone(),
        None => kit.capabilities.clone().unwrap_or_default(),
    }
}

/// Visit the runtime dependencies of a manifest recursively.
///
/// Each package is visited once. Packages that cannot be found in
/// `node_modules` are skipped with a warning.
pub fn visit_dependencies<F>(
    manifest: &PackageManifest,
    project_root: &Path,
    packages: &mut PackageCache,
    visitor: &mut F,
) -> Result<()>
where
    F: FnMut(&str, &Path, &PackageManifest) -> Result<()>,
{
    let mut visited = HashSet::new();
    visit(manifest, project_root, packages, visitor, &mut visited)
}

fn visit<F>(
    manifest: &PackageManifest,
    project_root: &Path,
    packages: &mut PackageCache,
    visitor: &mut F,
    visited: &mut HashSet<String>,
) -> Result<()>
where
    F: FnMut(&str, &Path, &PackageManifest) -> Result<()>,
{
    for (name, _) in manifest.dependencies(DependencySection::Dependencies) {
        if !visited.insert(name.to_string()) {
            continue;
        }

        let Some(package_dir) = packages.find_package_dir(name, project_root) else {
            warn!(
                "Unable to resolve module '{}' from '{}'",
                name,
                project_root.display()
            );
            continue;
        };

        let dependency = packages.read_manifest(&package_dir.join("package.json"))?;
        visitor(name, &package_dir, &dependency)?;
        visit(&dependency, &package_dir, packages, visitor, visited)?;
    }
    Ok(())
}

/// Narrow the production profiles of an app by the requirements of its
/// dependencies, and collect the capabilities they need.
///
/// Core and development-only capabilities of dependencies are dropped since
/// the app decides on those itself. The app's own capabilities are added
/// afterwards. When the requirements cannot all be met, `loose` keeps the
/// last non-empty profile set; otherwise this fails with `NoMatchingVersion`.
#[instrument(skip_all, fields(package = manifest.name().unwrap_or_default()))]
pub fn gather_requirements(
    project_root: &Path,
    manifest: &PackageManifest,
    preset: Preset,
    requirements: &[Requirement],
    app_capabilities: &[Capability],
    loose: bool,
    packages: &mut PackageCache,
) -> Result<GatheredRequirements> {
    let mut preset = preset;
    let mut gathered: Vec<Capability> = Vec::new();
    let app_requirements: Vec<String> = requirements.iter().map(ToString::to_string).collect();
    let mut trace = vec![TraceEntry::new(
        manifest.name().unwrap_or_default(),
        &app_requirements,
        &preset,
    )];

    visit_dependencies(manifest, project_root, packages, &mut |module, dir, dependency| {
        let Some(kit) = read_kit_config(dir, &dependency.to_value())? else {
            return Ok(());
        };
        let Some(raw_requirements) = dependency_requirements(&kit) else {
            return Ok(());
        };

        for capability in dependency_capabilities(&kit) {
            if !gathered.contains(&capability) {
                gathered.push(capability);
            }
        }

        let requirements = Requirement::parse_all(&raw_requirements)?;
        let filtered = filter_preset(&preset, &requirements);
        let last = trace.last().map(|t| t.profiles.len()).unwrap_or_default();
        if filtered.profiles.len() != last {
            trace.push(TraceEntry::new(module, &raw_requirements, &filtered));
        }
        debug!(
            module,
            profiles = filtered.profiles.len(),
            "dependency requirements applied"
        );

        // Keep going on an empty set so every unsatisfiable dependency shows
        // up in the trace
        if !filtered.is_empty() {
            preset = filtered;
        }
        Ok(())
    })?;

    if trace.last().is_some_and(|t| t.profiles.is_empty()) {
        let message = "No profiles could satisfy all requirements";
        let full_trace = format_trace(message, &trace);
        if loose {
            warn!("{}", full_trace);
        } else {
            error!("{}", full_trace);
            return Err(AlignError::NoMatchingVersion {
                requirements: trace.into_iter().flat_map(|t| t.requirements).collect(),
            });
        }
    }

    let mut capabilities: Vec<Capability> = gathered
        .into_iter()
        .filter(|capability| {
            !is_core_capability(capability) && !is_dev_only_capability(capability, &preset)
        })
        .collect();
    for capability in app_capabilities {
        if !capabilities.contains(capability) {
            capabilities.push(capability.clone());
        }
    }

    Ok(GatheredRequirements {
        preset,
        capabilities,
    })
}

fn is_dev_only_capability(capability: &str, preset: &Preset) -> bool {
    preset
        .profiles
        .values()
        .any(|profile| profile.get(capability).is_some_and(|e| e.is_dev_only()))
}
