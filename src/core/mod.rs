//! Core data structures for dockhand.
//!
//! This module contains the values passed between pipeline stages:
//! - Release profiles and artifact roles
//! - Target triples
//! - Resolved artifact sets and release manifests
//! - The release error taxonomy

pub mod artifact;
pub mod errors;
pub mod manifest;
pub mod profile;
pub mod triple;

pub use artifact::ArtifactSet;
pub use errors::ReleaseError;
pub use manifest::{ReleaseEntry, ReleaseManifest};
pub use profile::{ReleaseProfile, Role};
pub use triple::TargetTriple;
