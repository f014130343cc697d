use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use webflow_deploy::config::{retain_known_args, Cli, Config};
use webflow_deploy::deployer::{DeployOutcome, Deployer};
use webflow_deploy::error::DeployError;
use webflow_deploy::git::SystemGit;
use webflow_deploy::prompt::TerminalPrompt;
use webflow_deploy::publisher::CommandPublisher;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✗ Deploy failed: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Log to stderr; RUST_LOG overrides the default filter
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "webflow_deploy=debug"
    } else {
        "webflow_deploy=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse_from(retain_known_args(std::env::args_os()));
    init_tracing(cli.verbose);

    let config = Config::from_cli(cli, |key| std::env::var(key).ok())?;

    // Setup Ctrl+C handler
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let git = SystemGit::new(&config.project_dir);
    let publisher = CommandPublisher::webflow();
    let deployer = Deployer::new(&config, &git, &TerminalPrompt, &publisher, &shutdown);

    let start = Instant::now();
    match deployer.run() {
        Ok(DeployOutcome::Published(report)) => {
            println!(
                "\n✓ Deployment completed successfully! {} ({}) in {:.2}s",
                report.library_name,
                report.channel,
                start.elapsed().as_secs_f64()
            );
            Ok(ExitCode::SUCCESS)
        }
        Ok(DeployOutcome::Declined) => Ok(ExitCode::SUCCESS),
        Err(DeployError::Cancelled) => {
            eprintln!("\nDeployment cancelled");
            Ok(ExitCode::from(DeployError::Cancelled.exit_code()))
        }
        Err(e) => {
            let code = e.exit_code();
            eprintln!("✗ Deploy failed: {:#}", anyhow::Error::new(e));
            Ok(ExitCode::from(code))
        }
    }
}
