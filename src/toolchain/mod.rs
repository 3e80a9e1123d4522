//! Native toolchain discovery and environment bridging.
//!
//! A toolchain installation ships an environment-setup script (for MSVC,
//! `vcvars64.bat` and friends). Running the build under that environment is
//! what makes the vendor compiler, linker, headers and libraries visible.
//!
//! The flow is:
//! 1. [`ToolchainLocator`] finds the installation and its setup script
//! 2. [`EnvironmentBridge`] runs the script in a fresh shell and captures
//!    the resulting environment as an [`EnvironmentSnapshot`]
//! 3. The snapshot is imported into the current process and handed to the
//!    build step explicitly

use std::path::PathBuf;

mod bridge;
mod locate;
mod snapshot;

pub use bridge::{EnvironmentBridge, ScriptHost};
pub use locate::{env_script_name, parse_installation_path, ToolchainLocator, DEFAULT_SEARCH_DIR};
pub use snapshot::{parse_line, EnvSink, EnvironmentSnapshot, ProcessEnv, LINKER_VARS};

/// A located toolchain installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInstallation {
    /// Root of the installation
    pub installation_path: PathBuf,
    /// Environment-setup script inside the installation
    pub environment_script_path: PathBuf,
}
