//! depalign resolver - capability resolution and the alignment workflow
//!
//! Resolves declared capabilities against the selected profiles, plans where
//! each package belongs, compares the plan with the manifest and optionally
//! patches it.

pub mod align;
pub mod bad_packages;
pub mod capabilities;
pub mod conflicts;
pub mod discovery;
pub mod gather;
pub mod init;
pub mod plan;
pub mod set_version;
pub mod vigilant;

pub use align::{AlignOptions, AlignReport, AlignStatus, AlignWorkflow, VigilantRequirements};
pub use bad_packages::{find_bad_packages, BadPackage};
pub use capabilities::{resolve_capabilities, resolve_preset};
pub use conflicts::{satisfies, ConflictDetector};
pub use discovery::capabilities_for;
pub use gather::{gather_requirements, visit_dependencies, GatheredRequirements};
pub use init::{initialize_config, InitOutcome};
pub use plan::{plan_dependencies, DependencyPlan, ExpectedDependency, UnwantedDependency};
pub use set_version::{parse_versions, set_version, VersionSelection};
pub use vigilant::{build_vigilant_profile, inspect_unconfigured, VigilantProfile};
