//! Dockhand CLI - toolchain-bridged release builds

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use dockhand::core::ReleaseError;
use dockhand::ops::{release, ReleaseOptions};
use dockhand::util::diagnostic::{emit, Diagnostic};
use dockhand::util::{GlobalContext, Shell};

fn main() {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("dockhand=debug")
    } else if cli.quiet || cli.is_json() {
        EnvFilter::new("dockhand=warn")
    } else {
        EnvFilter::new("dockhand=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color, cli.is_json());

    if let Err(e) = run(&cli, &shell) {
        let (diagnostic, code) = match e.downcast_ref::<ReleaseError>() {
            Some(err) => (err.to_diagnostic(), err.exit_code()),
            None => (Diagnostic::from_error(&e), 1),
        };

        emit(&diagnostic, shell.use_color());
        shell.json_event(&json!({
            "reason": "release-failed",
            "message": diagnostic.message,
            "context": diagnostic.context,
            "exit_code": code,
        }));

        std::process::exit(code);
    }
}

fn run(cli: &Cli, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;

    let mut config = ctx.load_config();
    config.merge(cli.config_overrides());

    let opts = ReleaseOptions::from_config(&ctx, &config)?;
    let manifest = release(&opts, shell)?;

    shell.json_event(&json!({
        "reason": "release-packaged",
        "manifest": manifest,
    }));

    Ok(())
}
