//! Resolved build outputs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::profile::Role;

/// Build outputs found on disk, keyed by role.
///
/// Optional roles whose binary was absent are recorded as skipped rather
/// than failing resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: BTreeMap<Role, PathBuf>,
    skipped: Vec<Role>,
}

impl ArtifactSet {
    /// Create an empty artifact set.
    pub fn new() -> Self {
        ArtifactSet::default()
    }

    /// Record the source path of a present artifact.
    pub fn insert(&mut self, role: Role, path: impl Into<PathBuf>) {
        self.artifacts.insert(role, path.into());
    }

    /// Record an optional role whose artifact was absent.
    pub fn skip(&mut self, role: Role) {
        if !self.skipped.contains(&role) {
            self.skipped.push(role);
        }
    }

    /// Get the source path for a role.
    pub fn get(&self, role: Role) -> Option<&Path> {
        self.artifacts.get(&role).map(PathBuf::as_path)
    }

    /// Iterate present artifacts in role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &Path)> {
        self.artifacts.iter().map(|(role, path)| (*role, path.as_path()))
    }

    /// Roles that were skipped.
    pub fn skipped(&self) -> &[Role] {
        &self.skipped
    }

    /// Number of present artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether no artifact is present.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
