//! Toolchain installation discovery.

use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::core::ReleaseError;
use crate::util::config::ToolchainConfig;
use crate::util::process::ProcessBuilder;

use super::ToolchainInstallation;

/// Directory under an installation that holds the environment scripts.
pub const DEFAULT_SEARCH_DIR: &str = "VC/Auxiliary/Build";

/// Arguments for the installer query: newest installation of any edition.
const INSTALLER_QUERY_ARGS: [&str; 7] = [
    "-latest",
    "-products",
    "*",
    "-property",
    "installationPath",
    "-format",
    "value",
];

/// Finds a toolchain installation and its environment-setup script.
#[derive(Debug, Clone)]
pub struct ToolchainLocator {
    /// Installer-query tool (vswhere.exe)
    installer: Option<PathBuf>,
    /// Installation override; skips the installer query
    installation: Option<PathBuf>,
    /// Script search root, relative to the installation
    search_dir: PathBuf,
    /// Script file name
    script: Option<String>,
}

impl ToolchainLocator {
    /// Create a locator with the platform defaults for `arch`.
    pub fn new(arch: &str) -> Self {
        ToolchainLocator {
            installer: default_installer(),
            installation: None,
            search_dir: PathBuf::from(DEFAULT_SEARCH_DIR),
            script: env_script_name(arch).map(str::to_string),
        }
    }

    /// Create a locator from config overrides on top of the platform defaults.
    pub fn from_config(config: &ToolchainConfig, arch: &str) -> Self {
        let mut locator = ToolchainLocator::new(arch);
        if let Some(ref installation) = config.installation {
            locator = locator.with_installation(installation);
        }
        if let Some(ref search_dir) = config.search_dir {
            locator = locator.with_search_dir(search_dir);
        }
        if let Some(ref script) = config.script {
            locator = locator.with_script(script);
        }
        locator
    }

    /// Use a specific installer-query tool.
    pub fn with_installer(mut self, installer: impl Into<PathBuf>) -> Self {
        self.installer = Some(installer.into());
        self
    }

    /// Use a fixed installation instead of querying the installer.
    pub fn with_installation(mut self, installation: impl Into<PathBuf>) -> Self {
        self.installation = Some(installation.into());
        self
    }

    /// Search a different directory (relative to the installation).
    pub fn with_search_dir(mut self, search_dir: impl Into<PathBuf>) -> Self {
        self.search_dir = search_dir.into();
        self
    }

    /// Look for a different script file name.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Locate the installation and its environment script.
    pub fn locate(&self) -> Result<ToolchainInstallation> {
        let installation_path = match self.installation {
            Some(ref path) => path.clone(),
            None => self.query_installation()?,
        };

        if !installation_path.is_dir() {
            return Err(ReleaseError::ToolchainNotFound {
                reason: format!("{} is not a directory", installation_path.display()),
            }
            .into());
        }

        tracing::debug!("Found toolchain at: {}", installation_path.display());

        let environment_script_path = self.find_script(&installation_path)?;

        tracing::info!(
            "Using environment script {}",
            environment_script_path.display()
        );

        Ok(ToolchainInstallation {
            installation_path,
            environment_script_path,
        })
    }

    /// Ask the installer for the most recent installation.
    fn query_installation(&self) -> Result<PathBuf> {
        let Some(ref installer) = self.installer else {
            return Err(ReleaseError::ToolchainNotFound {
                reason: "vswhere.exe not found".to_string(),
            }
            .into());
        };

        tracing::debug!("Found vswhere at: {}", installer.display());

        let query = ProcessBuilder::new(installer).args(INSTALLER_QUERY_ARGS);
        let output = query.exec().map_err(|e| ReleaseError::ToolchainNotFound {
            reason: format!("{:#}", e),
        })?;

        if !output.status.success() {
            return Err(ReleaseError::ToolchainNotFound {
                reason: format!(
                    "`{}` failed: {}",
                    query.display_command(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }
            .into());
        }

        parse_installation_path(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            ReleaseError::ToolchainNotFound {
                reason: "the installer reported no installation".to_string(),
            }
            .into()
        })
    }

    /// Find the environment script below the search root of `installation`.
    ///
    /// Directory entries are visited in file-name order, so the first match
    /// is stable across runs.
    pub fn find_script(&self, installation: &Path) -> Result<PathBuf> {
        let search_root = installation.join(&self.search_dir);

        let Some(ref script) = self.script else {
            return Err(ReleaseError::ScriptNotFound {
                script: "<no environment script for this architecture>".to_string(),
                search_root,
            }
            .into());
        };

        WalkDir::new(&search_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.eq_ignore_ascii_case(script))
            })
            .map(|entry| entry.into_path())
            .ok_or_else(|| {
                ReleaseError::ScriptNotFound {
                    script: script.clone(),
                    search_root,
                }
                .into()
            })
    }
}

/// Extract the installation path from installer-query output.
///
/// The first non-empty line wins.
pub fn parse_installation_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Architecture-specific environment script for a target architecture.
pub fn env_script_name(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("vcvars64.bat"),
        "x86" | "i586" | "i686" => Some("vcvars32.bat"),
        "aarch64" => Some("vcvarsarm64.bat"),
        _ => None,
    }
}

/// Find vswhere.exe in its standard location or on PATH.
#[cfg(target_os = "windows")]
fn default_installer() -> Option<PathBuf> {
    let program_files_x86 = std::env::var("ProgramFiles(x86)")
        .unwrap_or_else(|_| "C:\\Program Files (x86)".to_string());

    let standard_path = PathBuf::from(&program_files_x86)
        .join("Microsoft Visual Studio")
        .join("Installer")
        .join("vswhere.exe");

    if standard_path.exists() {
        return Some(standard_path);
    }

    crate::util::process::find_executable("vswhere")
}

#[cfg(not(target_os = "windows"))]
fn default_installer() -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_script(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "@echo off\r\n").unwrap();
    }

    fn release_error(err: &anyhow::Error) -> &ReleaseError {
        err.downcast_ref::<ReleaseError>().unwrap()
    }

    #[test]
    fn test_parse_installation_path() {
        let stdout = "\r\nC:\\Program Files\\Microsoft Visual Studio\\2022\\Community\r\nC:\\BuildTools\r\n";
        assert_eq!(
            parse_installation_path(stdout),
            Some(PathBuf::from(
                "C:\\Program Files\\Microsoft Visual Studio\\2022\\Community"
            ))
        );
        assert_eq!(parse_installation_path("  \n"), None);
    }

    #[test]
    fn test_env_script_name() {
        assert_eq!(env_script_name("x86_64"), Some("vcvars64.bat"));
        assert_eq!(env_script_name("i686"), Some("vcvars32.bat"));
        assert_eq!(env_script_name("aarch64"), Some("vcvarsarm64.bat"));
        assert_eq!(env_script_name("riscv64gc"), None);
    }

    #[test]
    fn test_locate_with_installation_override() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("VC/Auxiliary/Build/vcvars64.bat");
        write_script(&script);

        let installation = ToolchainLocator::new("x86_64")
            .with_installation(tmp.path())
            .locate()
            .unwrap();

        assert_eq!(installation.installation_path, tmp.path());
        assert_eq!(installation.environment_script_path, script);
    }

    #[test]
    fn test_first_script_in_file_name_order_wins() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("VC/Auxiliary/Build");
        write_script(&build.join("x64").join("vcvars64.bat"));
        write_script(&build.join("vcvars64.bat"));
        write_script(&build.join("arm").join("vcvars64.bat"));

        let locator = ToolchainLocator::new("x86_64");
        let first = locator.find_script(tmp.path()).unwrap();
        let again = locator.find_script(tmp.path()).unwrap();

        assert_eq!(first, build.join("arm").join("vcvars64.bat"));
        assert_eq!(first, again);
    }

    #[test]
    fn test_missing_script_is_script_not_found() {
        let tmp = TempDir::new().unwrap();
        write_script(&tmp.path().join("VC/Auxiliary/Build/vcvars32.bat"));

        let err = ToolchainLocator::new("x86_64")
            .with_installation(tmp.path())
            .locate()
            .unwrap_err();

        assert!(matches!(
            release_error(&err),
            ReleaseError::ScriptNotFound { script, .. } if script == "vcvars64.bat"
        ));
    }

    #[test]
    fn test_missing_installation_is_toolchain_not_found() {
        let tmp = TempDir::new().unwrap();

        let err = ToolchainLocator::new("x86_64")
            .with_installation(tmp.path().join("absent"))
            .locate()
            .unwrap_err();

        assert!(matches!(
            release_error(&err),
            ReleaseError::ToolchainNotFound { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_queries_installer() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let install = tmp.path().join("BuildTools");
        write_script(&install.join("VC/Auxiliary/Build/vcvars64.bat"));

        let installer = tmp.path().join("vswhere");
        std::fs::write(
            &installer,
            format!("#!/bin/sh\necho '{}'\necho /ignored\n", install.display()),
        )
        .unwrap();
        std::fs::set_permissions(&installer, std::fs::Permissions::from_mode(0o755)).unwrap();

        let installation = ToolchainLocator::new("x86_64")
            .with_installer(&installer)
            .locate()
            .unwrap();

        assert_eq!(installation.installation_path, install);
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_installer_output_is_toolchain_not_found() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let installer = tmp.path().join("vswhere");
        std::fs::write(&installer, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&installer, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = ToolchainLocator::new("x86_64")
            .with_installer(&installer)
            .locate()
            .unwrap_err();

        assert!(matches!(
            release_error(&err),
            ReleaseError::ToolchainNotFound { reason } if reason.contains("no installation")
        ));
    }
}
