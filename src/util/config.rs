//! Configuration file support for dockhand.
//!
//! dockhand supports two configuration file locations:
//! - Global: `~/.dockhand/config.toml` - User-wide defaults
//! - Project: `.dockhand/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{ReleaseProfile, TargetTriple};

/// dockhand configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Release naming and layout
    pub release: ReleaseConfig,

    /// Build command settings
    pub build: BuildConfig,

    /// Toolchain discovery overrides
    pub toolchain: ToolchainConfig,
}

/// Release-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Binary base name (defaults to the Cargo package name)
    pub name: Option<String>,

    /// Release profile (single, dual)
    pub profile: Option<String>,

    /// Target triple embedded in release file names
    pub target: Option<String>,

    /// Release output directory, relative to the project root
    pub out_dir: Option<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Full build command (program followed by arguments)
    #[serde(default)]
    pub command: Vec<String>,

    /// Build tool output root, relative to the project root
    pub target_dir: Option<PathBuf>,
}

/// Toolchain discovery overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Installation root; skips the installer query when set
    pub installation: Option<PathBuf>,

    /// Directory searched for the environment script, relative to the installation
    pub search_dir: Option<PathBuf>,

    /// File name of the environment script
    pub script: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Release settings
        if other.release.name.is_some() {
            self.release.name = other.release.name;
        }
        if other.release.profile.is_some() {
            self.release.profile = other.release.profile;
        }
        if other.release.target.is_some() {
            self.release.target = other.release.target;
        }
        if other.release.out_dir.is_some() {
            self.release.out_dir = other.release.out_dir;
        }

        // Build settings
        if !other.build.command.is_empty() {
            self.build.command = other.build.command;
        }
        if other.build.target_dir.is_some() {
            self.build.target_dir = other.build.target_dir;
        }

        // Toolchain settings
        if other.toolchain.installation.is_some() {
            self.toolchain.installation = other.toolchain.installation;
        }
        if other.toolchain.search_dir.is_some() {
            self.toolchain.search_dir = other.toolchain.search_dir;
        }
        if other.toolchain.script.is_some() {
            self.toolchain.script = other.toolchain.script;
        }
    }

    /// Parse the release profile from the config string.
    pub fn profile(&self) -> Result<Option<ReleaseProfile>> {
        self.release
            .profile
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: String| anyhow::anyhow!("{}", e))
    }

    /// Parse the target triple from the config string.
    pub fn target(&self) -> Result<Option<TargetTriple>> {
        self.release
            .target
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: String| anyhow::anyhow!("{}", e))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.dockhand/config.toml)
/// 2. Global config (~/.dockhand/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}
