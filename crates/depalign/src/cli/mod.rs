//! CLI definition and command handling

pub mod commands;
pub mod manifests;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use depalign_core::{DiffMode, KitType};

/// depalign - Keep React Native dependencies aligned
#[derive(Debug, Parser)]
#[command(name = "depalign")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Packages to align; directories or package.json files
    pub packages: Vec<PathBuf>,

    /// Write changes to package.json
    #[arg(short, long)]
    pub write: bool,

    /// Write an initial configuration for packages without one
    #[arg(long, value_name = "KIT_TYPE", conflicts_with_all = ["write", "vigilant", "set_version"])]
    pub init: Option<InitKind>,

    /// Capabilities to add when initializing
    #[arg(long, value_delimiter = ',', requires = "init")]
    pub capabilities: Vec<String>,

    /// Inspect all packages against these react-native versions
    #[arg(long, value_name = "VERSIONS")]
    pub vigilant: Option<String>,

    /// Additional profiles layered on top of the presets
    #[arg(long, value_name = "SOURCE")]
    pub custom_profiles: Option<String>,

    /// Packages to skip
    #[arg(long, value_delimiter = ',')]
    pub exclude_packages: Vec<String>,

    /// Set react-native requirements of configured packages; prompts when no versions are given
    #[arg(long, value_name = "VERSIONS", num_args = 0..=1, conflicts_with = "write")]
    pub set_version: Option<Option<String>>,

    /// Presets for packages without configuration
    #[arg(long, value_delimiter = ',')]
    pub presets: Vec<String>,

    /// Requirements for packages without configuration
    #[arg(long, value_delimiter = ',')]
    pub requirements: Vec<String>,

    /// Keep going when app dependencies cannot be satisfied together
    #[arg(long)]
    pub loose: bool,

    /// How declared ranges are compared against expected ones
    #[arg(long, value_name = "MODE", default_value = "intersect")]
    pub diff_mode: DiffModeArg,

    /// Rewrite legacy configuration into the alignDeps schema
    #[arg(long)]
    pub migrate_config: bool,

    /// Remove dependencies declared in the wrong section
    #[arg(long, requires = "write")]
    pub remove_misplaced: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Kit type written by `--init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InitKind {
    /// Provides capabilities
    App,
    /// Consumes capabilities
    Library,
}

impl From<InitKind> for KitType {
    fn from(kind: InitKind) -> Self {
        match kind {
            InitKind::App => KitType::App,
            InitKind::Library => KitType::Library,
        }
    }
}

/// Diff mode flag values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DiffModeArg {
    /// Ranges must be identical
    Strict,
    /// Declared range must be a subset of the expected range
    AllowSubset,
    /// Declared range must share a version with the expected range
    #[default]
    Intersect,
}

impl From<DiffModeArg> for DiffMode {
    fn from(mode: DiffModeArg) -> Self {
        match mode {
            DiffModeArg::Strict => DiffMode::Strict,
            DiffModeArg::AllowSubset => DiffMode::AllowSubset,
            DiffModeArg::Intersect => DiffMode::Intersect,
        }
    }
}

impl Cli {
    /// Execute the CLI, returning the process exit code
    pub fn execute(self) -> anyhow::Result<i32> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        if let Some(kind) = self.init {
            commands::init::execute(&self, kind.into())
        } else if let Some(versions) = &self.set_version {
            commands::set_version::execute(&self, versions.as_deref())
        } else {
            commands::check::execute(&self)
        }
    }
}
