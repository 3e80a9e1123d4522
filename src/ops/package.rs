//! Copying resolved artifacts into the release directory.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::{ArtifactSet, ReleaseEntry, ReleaseManifest, TargetTriple};
use crate::util::fs::{copy_file, ensure_dir};
use crate::util::hash::sha256_file;

/// Default release directory, relative to the project root.
pub const DEFAULT_OUT_DIR: &str = "release";

/// Writes artifacts to the release directory under triple-qualified names.
#[derive(Debug, Clone)]
pub struct ReleasePackager {
    out_dir: PathBuf,
}

impl ReleasePackager {
    /// Create a packager writing into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        ReleasePackager {
            out_dir: out_dir.into(),
        }
    }

    /// Get the release directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Copy every present artifact into the release directory.
    ///
    /// Destination names depend only on role, base name and triple, so a
    /// rerun overwrites the previous release instead of adding files.
    pub fn package(
        &self,
        artifacts: &ArtifactSet,
        target: &TargetTriple,
        binary_base_name: &str,
    ) -> Result<ReleaseManifest> {
        ensure_dir(&self.out_dir)?;

        let mut manifest = ReleaseManifest::new(target.clone(), binary_base_name, &self.out_dir);
        manifest.skipped = artifacts.skipped().to_vec();

        for (role, source) in artifacts.iter() {
            let file_name = ReleaseManifest::file_name(role, binary_base_name, target);
            let destination = self.out_dir.join(&file_name);

            copy_file(source, &destination)?;
            tracing::debug!("Copied {} -> {}", source.display(), destination.display());

            let sha256 = sha256_file(&destination)?;
            manifest
                .files
                .insert(role, ReleaseEntry { file_name, sha256 });
        }

        Ok(manifest)
    }
}
