//! The release pipeline: locate, bridge, build, resolve, package.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde_json::json;

use crate::core::{ReleaseManifest, ReleaseProfile, TargetTriple};
use crate::ops::build::BuildOrchestrator;
use crate::ops::package::{ReleasePackager, DEFAULT_OUT_DIR};
use crate::ops::resolve::ArtifactResolver;
use crate::toolchain::{EnvironmentBridge, ToolchainLocator};
use crate::util::config::{Config, ToolchainConfig};
use crate::util::shell::{format_duration, Shell, Status};
use crate::util::GlobalContext;

/// Default build output root, relative to the project root.
pub const DEFAULT_TARGET_DIR: &str = "target";

/// Everything a release run needs, resolved from config and the project.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Project root; the build runs here and relative paths resolve against it
    pub project_root: PathBuf,
    /// Binary base name
    pub binary_name: String,
    /// Single or dual-binary layout
    pub profile: ReleaseProfile,
    /// Triple embedded in release file names
    pub target: TargetTriple,
    /// Whether the triple was requested explicitly (passed to the build tool)
    pub explicit_target: bool,
    /// Release directory
    pub out_dir: PathBuf,
    /// Build tool output root
    pub target_dir: PathBuf,
    /// Build command override; empty means `cargo build --release`
    pub build_command: Vec<String>,
    /// Toolchain discovery overrides
    pub toolchain: ToolchainConfig,
}

impl ReleaseOptions {
    /// Resolve options for the project in `ctx` from merged configuration.
    pub fn from_config(ctx: &GlobalContext, config: &Config) -> Result<Self> {
        let project_root = ctx.project_root().to_path_buf();

        let binary_name = match config.release.name {
            Some(ref name) => name.clone(),
            None => ctx.default_binary_name()?,
        };
        validate_binary_name(&binary_name)?;

        let profile = config
            .profile()
            .context("invalid `profile` under [release]")?
            .unwrap_or_default();

        let explicit = config
            .target()
            .context("invalid `target` under [release]")?;
        let explicit_target = explicit.is_some();
        let target = explicit.unwrap_or_else(TargetTriple::host);

        let out_dir = project_root.join(
            config
                .release
                .out_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
        );
        let target_dir = project_root.join(
            config
                .build
                .target_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_DIR)),
        );

        Ok(ReleaseOptions {
            project_root,
            binary_name,
            profile,
            target,
            explicit_target,
            out_dir,
            target_dir,
            build_command: config.build.command.clone(),
            toolchain: config.toolchain.clone(),
        })
    }

    /// The build command to run.
    pub fn build_command(&self) -> Vec<String> {
        if self.build_command.is_empty() {
            BuildOrchestrator::default_command(self.explicit_target.then_some(&self.target))
        } else {
            self.build_command.clone()
        }
    }

    /// Directory the build tool writes release binaries to.
    pub fn build_output_dir(&self) -> PathBuf {
        ArtifactResolver::cargo_output_dir(
            &self.target_dir,
            self.explicit_target.then_some(&self.target),
        )
    }
}

/// Release file names are joined onto the release directory, so the base
/// name must stay a single path component.
fn validate_binary_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        bail!(
            "invalid binary name `{}`: must be a file name without path separators",
            name
        );
    }
    Ok(())
}

/// Run the full release pipeline.
///
/// Stages run strictly in order and the first failure ends the run. The
/// bridged environment stays in the current process for the rest of it.
pub fn release(opts: &ReleaseOptions, shell: &Shell) -> Result<ReleaseManifest> {
    let start = Instant::now();

    shell.status(
        Status::Locating,
        format!("toolchain for {}", opts.target.arch()),
    );
    let installation =
        ToolchainLocator::from_config(&opts.toolchain, opts.target.arch()).locate()?;

    shell.status(
        Status::Bridging,
        installation.environment_script_path.display(),
    );
    let snapshot = EnvironmentBridge::new().apply(&installation)?;
    tracing::debug!("Imported {} environment variables", snapshot.len());

    shell.status(
        Status::Building,
        format!("{} ({})", opts.binary_name, opts.project_root.display()),
    );
    BuildOrchestrator::new(&opts.project_root)
        .with_command(opts.build_command())
        .run(&snapshot)?
        .ensure_success()?;

    shell.status(
        Status::Resolving,
        format!("{} artifacts ({})", opts.profile, opts.binary_name),
    );
    let resolver = ArtifactResolver::new(opts.build_output_dir(), &opts.target);
    let artifacts = resolver.resolve(opts.profile, &opts.binary_name)?;
    for role in artifacts.skipped() {
        shell.status(
            Status::Skipped,
            format!("{} binary not built, releasing without it", role),
        );
        shell.json_event(&json!({
            "reason": "release-skipped",
            "role": role,
            "path": resolver.expected_path(*role, &opts.binary_name),
        }));
    }

    shell.status(Status::Packaging, opts.out_dir.display());
    let manifest = ReleasePackager::new(&opts.out_dir)
        .package(&artifacts, &opts.target, &opts.binary_name)
        .context("release packaging failed")?;

    for entry in manifest.files.values() {
        shell.status(Status::Packaged, &entry.file_name);
    }
    shell.status(
        Status::Finished,
        format!(
            "release for {} in {}",
            opts.target,
            format_duration(start.elapsed())
        ),
    );

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(cargo_toml: Option<&str>) -> (TempDir, GlobalContext) {
        let tmp = TempDir::new().unwrap();
        if let Some(contents) = cargo_toml {
            std::fs::write(tmp.path().join("Cargo.toml"), contents).unwrap();
        }
        let ctx = GlobalContext::with_cwd(tmp.path()).with_home_dir(tmp.path().join("home"));
        (tmp, ctx)
    }

    #[test]
    fn test_options_defaults() {
        let (tmp, ctx) = project(Some("[package]\nname = \"speakv\"\n"));
        let opts = ReleaseOptions::from_config(&ctx, &Config::default()).unwrap();

        assert_eq!(opts.binary_name, "speakv");
        assert_eq!(opts.profile, ReleaseProfile::Single);
        assert_eq!(opts.target, TargetTriple::host());
        assert!(!opts.explicit_target);
        assert_eq!(opts.out_dir, tmp.path().join("release"));
        assert_eq!(opts.build_output_dir(), tmp.path().join("target").join("release"));
        assert_eq!(opts.build_command(), vec!["cargo", "build", "--release"]);
    }

    #[test]
    fn test_options_from_config() {
        let (tmp, ctx) = project(Some("[package]\nname = \"speakv\"\n"));
        let mut config = Config::default();
        config.release.name = Some("speak".to_string());
        config.release.profile = Some("dual".to_string());
        config.release.target = Some("x86_64-pc-windows-msvc".to_string());
        config.release.out_dir = Some(PathBuf::from("dist"));

        let opts = ReleaseOptions::from_config(&ctx, &config).unwrap();

        assert_eq!(opts.binary_name, "speak");
        assert_eq!(opts.profile, ReleaseProfile::Dual);
        assert!(opts.explicit_target);
        assert_eq!(opts.out_dir, tmp.path().join("dist"));
        assert_eq!(
            opts.build_output_dir(),
            tmp.path()
                .join("target")
                .join("x86_64-pc-windows-msvc")
                .join("release")
        );
        assert_eq!(
            opts.build_command(),
            vec!["cargo", "build", "--release", "--target", "x86_64-pc-windows-msvc"]
        );
    }

    #[test]
    fn test_options_reject_bad_profile() {
        let (_tmp, ctx) = project(Some("[package]\nname = \"speakv\"\n"));
        let mut config = Config::default();
        config.release.profile = Some("triple".to_string());

        let err = ReleaseOptions::from_config(&ctx, &config).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid `profile`"));
    }

    #[test]
    fn test_options_reject_path_like_names() {
        let (_tmp, ctx) = project(Some("[package]\nname = \"speakv\"\n"));

        for name in ["../speakv", "bin/speakv", "..\\speakv", "..", ""] {
            let mut config = Config::default();
            config.release.name = Some(name.to_string());

            let err = ReleaseOptions::from_config(&ctx, &config).unwrap_err();
            assert!(
                err.to_string().contains("invalid binary name"),
                "accepted {:?}",
                name
            );
        }
    }

    #[test]
    fn test_options_name_falls_back_to_directory() {
        let (tmp, ctx) = project(None);
        let opts = ReleaseOptions::from_config(&ctx, &Config::default()).unwrap();

        assert_eq!(
            opts.binary_name,
            tmp.path().file_name().unwrap().to_str().unwrap()
        );
    }
}
