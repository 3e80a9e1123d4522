//! Release error taxonomy and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::profile::Role;
use crate::util::diagnostic::Diagnostic;

/// A fatal release failure.
///
/// Every variant aborts the run. `BuildFailure` carries the build tool's
/// exit code so it can become the process exit code.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ReleaseError {
    #[error("no toolchain installation found: {reason}")]
    #[diagnostic(
        code(dockhand::toolchain::not_found),
        help("Install the C++ build tools, or set `installation` under [toolchain] in .dockhand/config.toml")
    )]
    ToolchainNotFound { reason: String },

    #[error("environment script `{script}` not found under {}", search_root.display())]
    #[diagnostic(
        code(dockhand::toolchain::script_not_found),
        help("Set `script` or `search_dir` under [toolchain] in .dockhand/config.toml")
    )]
    ScriptNotFound { script: String, search_root: PathBuf },

    #[error("failed to capture toolchain environment: {reason}")]
    #[diagnostic(code(dockhand::bridge::failed))]
    BridgeFailure { reason: String },

    #[error("build failed with exit code {code}")]
    #[diagnostic(
        code(dockhand::build::failed),
        help("Fix the build errors above and run `dockhand` again")
    )]
    BuildFailure { code: i32 },

    #[error("{role} artifact missing: {}", path.display())]
    #[diagnostic(
        code(dockhand::resolve::artifact_missing),
        help("Check `name` under [release] matches the binary the build produces")
    )]
    ArtifactMissing { role: Role, path: PathBuf },
}

impl ReleaseError {
    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            ReleaseError::ToolchainNotFound { .. } | ReleaseError::ScriptNotFound { .. } => {
                "toolchain"
            }
            ReleaseError::BridgeFailure { .. } => "environment",
            ReleaseError::BuildFailure { .. } => "build",
            ReleaseError::ArtifactMissing { .. } => "resolve",
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::BuildFailure { code } => *code,
            _ => 1,
        }
    }

    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag =
            Diagnostic::error(format!("{} stage failed", self.stage())).with_context(self.to_string());

        match self {
            ReleaseError::ScriptNotFound { search_root, .. } => {
                diag = diag.with_location(search_root);
            }
            ReleaseError::ArtifactMissing { path, .. } => {
                diag = diag.with_location(path);
            }
            _ => {}
        }

        if let Some(help) = MietteDiagnostic::help(self) {
            diag = diag.with_suggestion(help.to_string());
        }

        diag
    }
}
