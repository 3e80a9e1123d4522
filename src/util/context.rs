//! Global context for dockhand operations.
//!
//! Provides centralized access to the project root, configuration paths,
//! and project metadata.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::util::config::{load_config, Config};
use crate::util::fs::read_to_string;

/// Name of the per-user and per-project dockhand directory.
pub const DOCKHAND_DIR: &str = ".dockhand";

/// Name of the configuration file inside [`DOCKHAND_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Global context holding paths for the current run.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Project root (the directory dockhand runs in)
    cwd: PathBuf,

    /// Home directory, if one can be determined
    home_dir: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a context rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext::with_cwd(cwd))
    }

    /// Create a context rooted at an explicit directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        GlobalContext {
            cwd: cwd.into(),
            home_dir: BaseDirs::new().map(|b| b.home_dir().to_path_buf()),
        }
    }

    /// Override the home directory used for the global config.
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.cwd
    }

    /// Get the global config path (~/.dockhand/config.toml).
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.home_dir
            .as_ref()
            .map(|home| home.join(DOCKHAND_DIR).join(CONFIG_FILE))
    }

    /// Get the project config path (.dockhand/config.toml).
    pub fn project_config_path(&self) -> PathBuf {
        self.cwd.join(DOCKHAND_DIR).join(CONFIG_FILE)
    }

    /// Load the merged global and project configuration.
    pub fn load_config(&self) -> Config {
        let global = self.global_config_path().unwrap_or_default();
        load_config(&global, &self.project_config_path())
    }

    /// Package name declared in the project's `Cargo.toml`, if any.
    pub fn package_name(&self) -> Result<Option<String>> {
        let manifest = self.cwd.join("Cargo.toml");
        if !manifest.exists() {
            return Ok(None);
        }

        let contents = read_to_string(&manifest)?;
        let value: toml::Value = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", manifest.display()))?;

        Ok(value
            .get("package")
            .and_then(|package| package.get("name"))
            .and_then(|name| name.as_str())
            .map(str::to_string))
    }

    /// Default binary base name: the Cargo package name, else the directory name.
    pub fn default_binary_name(&self) -> Result<String> {
        if let Some(name) = self.package_name()? {
            return Ok(name);
        }

        self.cwd
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| {
                format!(
                    "cannot derive a binary name from {}; set `name` under [release]",
                    self.cwd.display()
                )
            })
    }
}
