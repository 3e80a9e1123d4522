//! Locating build outputs for a release profile.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::{ArtifactSet, ReleaseError, ReleaseProfile, Role, TargetTriple};

/// Computes where the build tool put each binary and checks it exists.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    output_dir: PathBuf,
    exe_suffix: &'static str,
}

impl ArtifactResolver {
    /// Create a resolver for binaries built for `target` into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, target: &TargetTriple) -> Self {
        ArtifactResolver {
            output_dir: output_dir.into(),
            exe_suffix: target.exe_suffix(),
        }
    }

    /// Cargo's release output directory.
    ///
    /// Cargo nests outputs under the triple only when `--target` is passed.
    pub fn cargo_output_dir(target_dir: &Path, explicit_target: Option<&TargetTriple>) -> PathBuf {
        match explicit_target {
            Some(target) => target_dir.join(target.as_str()).join("release"),
            None => target_dir.join("release"),
        }
    }

    /// Get the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Expected path of the binary for `role`.
    pub fn expected_path(&self, role: Role, binary_base_name: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}{}",
            binary_base_name,
            role.name_suffix(),
            self.exe_suffix
        ))
    }

    /// Resolve the artifacts `profile` calls for.
    ///
    /// A missing mandatory binary fails with [`ReleaseError::ArtifactMissing`];
    /// a missing optional one is recorded as skipped.
    pub fn resolve(&self, profile: ReleaseProfile, binary_base_name: &str) -> Result<ArtifactSet> {
        let mut artifacts = ArtifactSet::new();

        for &role in profile.roles() {
            let path = self.expected_path(role, binary_base_name);

            if path.is_file() {
                tracing::debug!("Found {} binary at {}", role, path.display());
                artifacts.insert(role, path);
            } else if profile.is_mandatory(role) {
                return Err(ReleaseError::ArtifactMissing { role, path }.into());
            } else {
                tracing::warn!("{} binary not found at {}, skipping it", role, path.display());
                artifacts.skip(role);
            }
        }

        Ok(artifacts)
    }
}
