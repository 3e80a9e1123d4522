//! Running the downstream build under a bridged environment.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::{ReleaseError, TargetTriple};
use crate::toolchain::EnvironmentSnapshot;
use crate::util::process::ProcessBuilder;

/// Outcome of one build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildResult {
    /// Exit code of the build tool (1 if it was killed by a signal)
    pub exit_code: i32,
    /// Whether the build tool reported success
    pub succeeded: bool,
}

impl BuildResult {
    /// Turn a failed build into [`ReleaseError::BuildFailure`].
    pub fn ensure_success(self) -> Result<Self, ReleaseError> {
        if self.succeeded {
            Ok(self)
        } else {
            Err(ReleaseError::BuildFailure {
                code: self.exit_code,
            })
        }
    }
}

/// Invokes the build tool in release mode, synchronously.
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    command: Vec<String>,
    cwd: PathBuf,
}

impl BuildOrchestrator {
    /// Create an orchestrator running the default cargo command in `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        BuildOrchestrator {
            command: BuildOrchestrator::default_command(None),
            cwd: cwd.into(),
        }
    }

    /// `cargo build --release`, with `--target` when a triple is requested.
    pub fn default_command(target: Option<&TargetTriple>) -> Vec<String> {
        let mut command: Vec<String> = ["cargo", "build", "--release"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(target) = target {
            command.push("--target".to_string());
            command.push(target.to_string());
        }
        command
    }

    /// Replace the build command (program followed by arguments).
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Get the working directory of the build.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The process that [`run`](Self::run) would spawn.
    ///
    /// Every snapshot variable is passed explicitly, so the build sees the
    /// bridged values even if the process environment was not updated.
    pub fn process(&self, snapshot: &EnvironmentSnapshot) -> Result<ProcessBuilder> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("build command is empty");
        };

        Ok(ProcessBuilder::new(program)
            .args(args)
            .cwd(&self.cwd)
            .envs(snapshot.iter())
            .envs(snapshot.linker_vars()))
    }

    /// Run the build with inherited stdio and wait for it.
    pub fn run(&self, snapshot: &EnvironmentSnapshot) -> Result<BuildResult> {
        let process = self.process(snapshot)?;
        tracing::info!("Running `{}`", process.display_command());

        let status = process.status()?;
        let result = BuildResult {
            exit_code: status.code().unwrap_or(1),
            succeeded: status.success(),
        };

        tracing::debug!("Build finished: {:?}", result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        assert_eq!(
            BuildOrchestrator::default_command(None),
            vec!["cargo", "build", "--release"]
        );

        let triple: TargetTriple = "x86_64-pc-windows-msvc".parse().unwrap();
        assert_eq!(
            BuildOrchestrator::default_command(Some(&triple)),
            vec!["cargo", "build", "--release", "--target", "x86_64-pc-windows-msvc"]
        );
    }

    #[test]
    fn test_process_threads_snapshot() {
        let snapshot = EnvironmentSnapshot::parse("Path=C:\\VC\\bin\nINCLUDE=C:\\VC\\include\n");
        let process = BuildOrchestrator::new("/work").process(&snapshot).unwrap();

        assert_eq!(process.display_command(), "cargo build --release");
        assert_eq!(process.get_envs().get("Path").map(String::as_str), Some("C:\\VC\\bin"));
        assert_eq!(process.get_envs().get("PATH").map(String::as_str), Some("C:\\VC\\bin"));
        assert_eq!(
            process.get_envs().get("INCLUDE").map(String::as_str),
            Some("C:\\VC\\include")
        );
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let orchestrator = BuildOrchestrator::new("/work").with_command(Vec::new());
        assert!(orchestrator.process(&EnvironmentSnapshot::default()).is_err());
    }

    #[test]
    fn test_failed_build_maps_to_build_failure() {
        let result = BuildResult {
            exit_code: 101,
            succeeded: false,
        };
        assert!(matches!(
            result.ensure_success(),
            Err(ReleaseError::BuildFailure { code: 101 })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_sees_snapshot_and_reports_exit_code() {
        let tmp = tempfile::TempDir::new().unwrap();
        let snapshot = EnvironmentSnapshot::parse("DOCKHAND_BUILD_TEST=A=B\n");

        let ok = BuildOrchestrator::new(tmp.path())
            .with_command(vec![
                "sh".to_string(),
                "-c".to_string(),
                "test \"$DOCKHAND_BUILD_TEST\" = A=B".to_string(),
            ])
            .run(&snapshot)
            .unwrap();
        assert_eq!(
            ok,
            BuildResult {
                exit_code: 0,
                succeeded: true
            }
        );

        let failed = BuildOrchestrator::new(tmp.path())
            .with_command(vec!["sh".to_string(), "-c".to_string(), "exit 7".to_string()])
            .run(&snapshot)
            .unwrap();
        assert_eq!(failed.exit_code, 7);
        assert!(!failed.succeeded);
    }
}
