//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use dockhand::util::config::Config;
use dockhand::util::shell::ColorChoice;

/// Dockhand - build a project under a vendor toolchain and package release binaries
#[derive(Parser)]
#[command(name = "dockhand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for messages
    #[arg(long, value_name = "FMT", default_value = "human", value_parser = ["human", "json"])]
    pub message_format: String,

    /// Release profile: single or dual (client + server)
    #[arg(long, env = "DOCKHAND_PROFILE")]
    pub profile: Option<String>,

    /// Binary base name (defaults to the Cargo package name)
    #[arg(long)]
    pub name: Option<String>,

    /// Target triple to build for and embed in release file names
    #[arg(long, env = "DOCKHAND_TARGET")]
    pub target: Option<String>,

    /// Release output directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

impl Cli {
    /// Whether machine-readable output was requested.
    pub fn is_json(&self) -> bool {
        self.message_format == "json"
    }

    /// Command-line settings as a config layer, merged over the config files.
    pub fn config_overrides(&self) -> Config {
        let mut config = Config::default();
        config.release.name = self.name.clone();
        config.release.profile = self.profile.clone();
        config.release.target = self.target.clone();
        config.release.out_dir = self.out_dir.clone();
        config
    }
}
