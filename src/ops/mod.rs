//! High-level operations.
//!
//! Each pipeline stage after toolchain bridging lives here, plus the
//! pipeline itself in [`release`].

pub mod build;
pub mod package;
pub mod release;
pub mod resolve;

pub use build::{BuildOrchestrator, BuildResult};
pub use package::ReleasePackager;
pub use release::{release, ReleaseOptions};
pub use resolve::ArtifactResolver;
