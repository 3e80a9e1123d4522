//! Dockhand - toolchain-bridged release builds
//!
//! This crate locates a vendor compiler toolchain, imports the environment
//! its setup script produces, runs the project's release build under it and
//! packages the resulting binaries under triple-qualified release names.

pub mod core;
pub mod ops;
pub mod toolchain;
pub mod util;

pub use core::{ArtifactSet, ReleaseError, ReleaseManifest, ReleaseProfile, Role, TargetTriple};
pub use ops::{release, ReleaseOptions};
pub use util::context::GlobalContext;
