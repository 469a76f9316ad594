//! depalign presets - built-in profiles, profile loading and the profile store

pub mod builtin;
pub mod filter;
pub mod loader;
pub mod store;

pub use builtin::{builtin_preset, builtin_preset_ids};
pub use filter::{canonical_entry, filter_preset, select_profiles};
pub use loader::{load_preset, parse_preset, ProfileSource};
pub use store::{ProfileStore, MERGED_PRESET_ID};
