//! Capturing a toolchain environment from its setup script.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::{Builder, TempPath};

use crate::core::ReleaseError;
use crate::util::process::ProcessBuilder;

use super::snapshot::{EnvironmentSnapshot, ProcessEnv};
use super::ToolchainInstallation;

/// The shell used to run an environment-setup script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptHost {
    /// `cmd.exe` running a batch wrapper
    Cmd,
    /// POSIX `sh` running a shell wrapper
    Posix,
}

impl ScriptHost {
    /// The host for the current platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            ScriptHost::Cmd
        } else {
            ScriptHost::Posix
        }
    }

    fn wrapper_suffix(&self) -> &'static str {
        match self {
            ScriptHost::Cmd => ".bat",
            ScriptHost::Posix => ".sh",
        }
    }

    /// Wrapper that runs `script` quietly and dumps the environment to `dump`.
    fn wrapper(&self, script: &Path, dump: &Path) -> String {
        match self {
            // A batch file avoids cmd.exe quoting issues with `cmd /c "..."`
            ScriptHost::Cmd => format!(
                "@echo off\r\ncall \"{}\" >nul 2>&1\r\nif errorlevel 1 exit /b 1\r\nset > \"{}\"\r\n",
                script.display(),
                dump.display()
            ),
            ScriptHost::Posix => format!(
                ". {} >/dev/null 2>&1 || exit 1\nenv -0 > {}\n",
                sh_quote(script),
                sh_quote(dump)
            ),
        }
    }

    fn command(&self, wrapper: &Path) -> ProcessBuilder {
        match self {
            // `/u` makes `set > file` write UTF-16LE instead of the console code page
            ScriptHost::Cmd => ProcessBuilder::new("cmd").args(["/u", "/d", "/c"]).arg(wrapper),
            ScriptHost::Posix => ProcessBuilder::new("sh").arg(wrapper),
        }
    }

    /// Decode the dump the wrapper wrote.
    ///
    /// Undecodable data is an error rather than being replaced, since the
    /// values end up in the live environment.
    pub fn decode_dump(&self, bytes: &[u8]) -> Result<EnvironmentSnapshot, String> {
        match self {
            ScriptHost::Cmd => {
                if bytes.len() % 2 != 0 {
                    return Err("environment dump is not UTF-16 (odd length)".to_string());
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                let contents = String::from_utf16(&units)
                    .map_err(|e| format!("environment dump is not valid UTF-16: {}", e))?;
                Ok(EnvironmentSnapshot::parse(
                    contents.strip_prefix('\u{feff}').unwrap_or(&contents),
                ))
            }
            ScriptHost::Posix => {
                let contents = std::str::from_utf8(bytes)
                    .map_err(|e| format!("environment dump is not valid UTF-8: {}", e))?;
                Ok(EnvironmentSnapshot::parse_nul(contents))
            }
        }
    }
}

/// Runs an environment-setup script and captures its effect.
#[derive(Debug, Clone)]
pub struct EnvironmentBridge {
    host: ScriptHost,
    temp_dir: Option<PathBuf>,
}

impl EnvironmentBridge {
    /// Create a bridge using the native script host.
    pub fn new() -> Self {
        EnvironmentBridge::with_host(ScriptHost::native())
    }

    /// Create a bridge using a specific script host.
    pub fn with_host(host: ScriptHost) -> Self {
        EnvironmentBridge {
            host,
            temp_dir: None,
        }
    }

    /// Place the wrapper and dump files in `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Capture the environment the installation's script produces.
    ///
    /// The script runs in a freshly spawned shell whose only action before
    /// the dump is running the script. The current process is not modified.
    pub fn capture(&self, installation: &ToolchainInstallation) -> Result<EnvironmentSnapshot> {
        let script = &installation.environment_script_path;

        // Both temp files are deleted when dropped, on every return path.
        let dump = self.temp_path("dockhand-env-", ".txt", "")?;
        let wrapper = self.temp_path(
            "dockhand-bridge-",
            self.host.wrapper_suffix(),
            &self.host.wrapper(script, &dump),
        )?;

        let cmd = self.host.command(&wrapper).cwd(&installation.installation_path);
        tracing::debug!("Running `{}` for {}", cmd.display_command(), script.display());

        let output = cmd.exec().map_err(|e| ReleaseError::BridgeFailure {
            reason: format!("{:#}", e),
        })?;

        if !output.status.success() {
            return Err(ReleaseError::BridgeFailure {
                reason: format!(
                    "{} exited with code {}",
                    script.display(),
                    output
                        .status
                        .code()
                        .map_or_else(|| "none".to_string(), |c| c.to_string())
                ),
            }
            .into());
        }

        let bytes = std::fs::read(&dump).map_err(|e| ReleaseError::BridgeFailure {
            reason: format!("failed to read environment dump: {}", e),
        })?;

        let snapshot = self
            .host
            .decode_dump(&bytes)
            .map_err(|reason| ReleaseError::BridgeFailure { reason })?;
        if snapshot.is_empty() {
            return Err(ReleaseError::BridgeFailure {
                reason: format!("{} produced no environment variables", script.display()),
            }
            .into());
        }

        tracing::debug!("Captured {} environment variables", snapshot.len());

        Ok(snapshot)
    }

    /// Capture the environment and import it into the current process.
    pub fn apply(&self, installation: &ToolchainInstallation) -> Result<EnvironmentSnapshot> {
        let snapshot = self.capture(installation)?;
        snapshot.apply_to(&mut ProcessEnv);
        Ok(snapshot)
    }

    /// Create a uniquely named temp file holding `contents`, closed for
    /// other processes to use.
    fn temp_path(&self, prefix: &str, suffix: &str, contents: &str) -> Result<TempPath> {
        let mut builder = Builder::new();
        builder.prefix(prefix).suffix(suffix);

        let mut file = match self.temp_dir {
            Some(ref dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("failed to create temporary file")?;

        file.write_all(contents.as_bytes())
            .with_context(|| format!("failed to write {}", file.path().display()))?;

        Ok(file.into_temp_path())
    }
}

impl Default for EnvironmentBridge {
    fn default() -> Self {
        EnvironmentBridge::new()
    }
}

/// Single-quote a path for POSIX sh.
fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use tempfile::TempDir;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_decode_cmd_dump_keeps_non_ascii() {
        let bytes = utf16le("TEMP=C:\\Users\\Олексій\\AppData\\Local\\Temp\r\nPath=C:\\VC\\bin\r\n");

        let snapshot = ScriptHost::Cmd.decode_dump(&bytes).unwrap();

        assert_eq!(
            snapshot.get("TEMP"),
            Some("C:\\Users\\Олексій\\AppData\\Local\\Temp")
        );
        assert_eq!(snapshot.get("PATH"), Some("C:\\VC\\bin"));
    }

    #[test]
    fn test_decode_rejects_invalid_data() {
        // A code-page dump has an odd length or unpaired surrogates
        assert!(ScriptHost::Cmd.decode_dump(b"TEMP=\x8e\n").is_err());
        assert!(ScriptHost::Cmd.decode_dump(&[0x00, 0xd8]).is_err());
        assert!(ScriptHost::Posix.decode_dump(b"TEMP=\x8e\0").is_err());
    }

    #[test]
    fn test_decode_posix_dump_is_nul_separated() {
        let snapshot = ScriptHost::Posix
            .decode_dump(b"NOTES=first\nINJECTED=no\0LIB=/opt/vc/lib\0")
            .unwrap();

        assert_eq!(snapshot.get("NOTES"), Some("first\nINJECTED=no"));
        assert_eq!(snapshot.get("INJECTED"), None);
        assert_eq!(snapshot.len(), 2);
    }

    #[cfg(unix)]
    struct Fixture {
        _tmp: TempDir,
        scratch: PathBuf,
        installation: ToolchainInstallation,
    }

    #[cfg(unix)]
    fn fixture(script_body: &str) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let scratch = tmp.path().join("scratch");
        let install = tmp.path().join("tool chain");
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::create_dir_all(&install).unwrap();

        let script = install.join("setvars.sh");
        std::fs::write(&script, script_body).unwrap();

        Fixture {
            _tmp: tmp,
            scratch,
            installation: ToolchainInstallation {
                installation_path: install,
                environment_script_path: script,
            },
        }
    }

    #[cfg(unix)]
    fn bridge(fx: &Fixture) -> EnvironmentBridge {
        EnvironmentBridge::with_host(ScriptHost::Posix).with_temp_dir(&fx.scratch)
    }

    #[cfg(unix)]
    fn scratch_is_empty(fx: &Fixture) -> bool {
        std::fs::read_dir(&fx.scratch).unwrap().next().is_none()
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_reflects_script_effect() {
        let fx = fixture(
            "export DOCKHAND_BRIDGE_FLAGS='/DFOO=1 /DBAR=2'\n\
             export LIB=\"/opt/tool chain/lib:/usr/lib\"\n\
             echo noisy output\n",
        );

        let snapshot = bridge(&fx).capture(&fx.installation).unwrap();

        assert_eq!(snapshot.get("DOCKHAND_BRIDGE_FLAGS"), Some("/DFOO=1 /DBAR=2"));
        assert_eq!(snapshot.get("LIB"), Some("/opt/tool chain/lib:/usr/lib"));
        assert!(std::env::var("DOCKHAND_BRIDGE_FLAGS").is_err());
        assert!(scratch_is_empty(&fx));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_script_is_bridge_failure() {
        let fx = fixture("exit 3\n");

        let err = bridge(&fx).capture(&fx.installation).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ReleaseError>(),
            Some(ReleaseError::BridgeFailure { .. })
        ));
        assert!(scratch_is_empty(&fx));
    }

    #[cfg(unix)]
    #[test]
    fn test_multiline_value_is_not_split() {
        let fx = fixture("export DOCKHAND_BRIDGE_NOTES='first\nDOCKHAND_BRIDGE_PHANTOM=injected'\n");

        let snapshot = bridge(&fx).capture(&fx.installation).unwrap();

        assert_eq!(
            snapshot.get("DOCKHAND_BRIDGE_NOTES"),
            Some("first\nDOCKHAND_BRIDGE_PHANTOM=injected")
        );
        assert_eq!(snapshot.get("DOCKHAND_BRIDGE_PHANTOM"), None);
        assert!(scratch_is_empty(&fx));
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_dump_is_bridge_failure() {
        // Shadowing `env` leaves the dump file empty
        let fx = fixture("env() { :; }\n");

        let err = bridge(&fx).capture(&fx.installation).unwrap_err();

        match err.downcast_ref::<ReleaseError>() {
            Some(ReleaseError::BridgeFailure { reason }) => {
                assert!(reason.contains("produced no environment variables"));
            }
            other => panic!("expected BridgeFailure, got {:?}", other),
        }
        assert!(scratch_is_empty(&fx));
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_imports_into_process() {
        let fx = fixture("export DOCKHAND_BRIDGE_APPLY='a=b'\n");

        let snapshot = bridge(&fx).apply(&fx.installation).unwrap();

        assert_eq!(snapshot.get("DOCKHAND_BRIDGE_APPLY"), Some("a=b"));
        assert_eq!(std::env::var("DOCKHAND_BRIDGE_APPLY").unwrap(), "a=b");
    }

    #[cfg(unix)]
    #[test]
    fn test_sh_quote() {
        assert_eq!(sh_quote(Path::new("/a b/c")), "'/a b/c'");
        assert_eq!(sh_quote(Path::new("/it's")), "'/it'\\''s'");
    }
}
