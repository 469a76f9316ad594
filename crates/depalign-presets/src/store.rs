//! Profile store holding loaded presets

use std::sync::OnceLock;

use depalign_core::error::{AlignError, Result};
use depalign_core::types::{CapabilityMap, Preset, ProfileVersion};
use depalign_manifest::PackageCache;
use tracing::debug;

use crate::loader::{load_preset, ProfileSource};

/// Identifier of the merged view over all loaded presets.
///
/// Preset ids are paths or module names, which never start with `#`.
pub const MERGED_PRESET_ID: &str = "#merged";

/// Presets in load order, plus a memoized merged view.
///
/// For a given version and capability, a preset loaded later overrides one
/// loaded earlier. Loading a preset discards the merged view.
#[derive(Debug, Default)]
pub struct ProfileStore {
    presets: Vec<Preset>,
    merged: OnceLock<Preset>,
}

impl ProfileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every source in order
    pub fn from_sources(sources: &[ProfileSource], packages: &mut PackageCache) -> Result<Self> {
        let mut store = Self::new();
        for source in sources {
            store.load(source, packages)?;
        }
        Ok(store)
    }

    /// Load a preset from a source and add it to the store
    pub fn load(&mut self, source: &ProfileSource, packages: &mut PackageCache) -> Result<&Preset> {
        let preset = load_preset(source, packages)?;
        Ok(self.add(preset))
    }

    /// Add an already built preset. A preset with the same id is replaced.
    pub fn add(&mut self, preset: Preset) -> &Preset {
        self.merged = OnceLock::new();
        let index = match self.presets.iter().position(|p| p.id == preset.id) {
            Some(index) => {
                self.presets[index] = preset;
                index
            }
            None => {
                self.presets.push(preset);
                self.presets.len() - 1
            }
        };
        &self.presets[index]
    }

    /// Look up a preset by id; the merged view is available as [`MERGED_PRESET_ID`]
    pub fn preset(&self, preset_id: &str) -> Option<&Preset> {
        if preset_id == MERGED_PRESET_ID {
            return Some(self.merged());
        }
        self.presets.iter().find(|p| p.id == preset_id)
    }

    /// Capability map of a preset for one version
    pub fn get_profile(&self, preset_id: &str, version: &ProfileVersion) -> Result<&CapabilityMap> {
        self.preset(preset_id)
            .and_then(|preset| preset.profile(version))
            .ok_or_else(|| AlignError::NotFound {
                preset: preset_id.to_string(),
                version: version.to_string(),
            })
    }

    /// All versions known to a preset, ascending
    pub fn list_versions(&self, preset_id: &str) -> Vec<ProfileVersion> {
        self.preset(preset_id)
            .map(Preset::versions)
            .unwrap_or_default()
    }

    /// All presets merged in load order, computed once until the next load
    pub fn merged(&self) -> &Preset {
        self.merged.get_or_init(|| {
            debug!(presets = self.presets.len(), "merging presets");
            let mut merged = Preset::new(MERGED_PRESET_ID);
            for preset in &self.presets {
                for (version, profile) in &preset.profiles {
                    merged
                        .profiles
                        .entry(version.clone())
                        .or_default()
                        .extend(profile.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            merged
        })
    }

    /// Loaded presets in load order
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Returns true if no preset is loaded
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
