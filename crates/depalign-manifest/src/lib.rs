//! depalign manifest - package.json model, patching and package lookup

pub mod manifest;
pub mod packages;
pub mod patch;

pub use manifest::PackageManifest;
pub use packages::PackageCache;
pub use patch::{PatchOptions, Patcher};
