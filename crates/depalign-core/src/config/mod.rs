//! Kit configuration for depalign

pub mod compat;
pub mod defaults;
mod loader;
mod types;
pub mod validation;

pub use compat::*;
pub use defaults::*;
pub use loader::*;
pub use types::*;
pub use validation::*;
