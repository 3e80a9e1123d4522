//! Release manifests describing what was packaged.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::profile::Role;
use super::triple::TargetTriple;

/// One packaged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    /// File name inside the release directory
    pub file_name: String,
    /// SHA256 of the packaged file (hex)
    pub sha256: String,
}

/// The result of packaging a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseManifest {
    /// Triple embedded in every file name
    pub target_triple: TargetTriple,
    /// Base name shared by every file name
    pub binary_base_name: String,
    /// Directory the files were written to
    pub out_dir: PathBuf,
    /// Packaged files by role
    pub files: BTreeMap<Role, ReleaseEntry>,
    /// Optional roles that were not built
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Role>,
}

impl ReleaseManifest {
    /// Create an empty manifest.
    pub fn new(
        target_triple: TargetTriple,
        binary_base_name: impl Into<String>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        ReleaseManifest {
            target_triple,
            binary_base_name: binary_base_name.into(),
            out_dir: out_dir.into(),
            files: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Release file name for a role: `<base>[-<role>]-<triple><exe-suffix>`.
    ///
    /// Depends only on its arguments, so repeated releases land on the same
    /// paths and overwrite each other.
    pub fn file_name(role: Role, binary_base_name: &str, triple: &TargetTriple) -> String {
        format!(
            "{}{}-{}{}",
            binary_base_name,
            role.name_suffix(),
            triple,
            triple.exe_suffix()
        )
    }

    /// Full destination path for a packaged role, if present.
    pub fn path(&self, role: Role) -> Option<PathBuf> {
        self.files
            .get(&role)
            .map(|entry| self.out_dir.join(&entry.file_name))
    }
}
