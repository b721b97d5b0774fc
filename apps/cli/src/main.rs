//! `void-cloud` command line entry point.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "void-cloud")]
#[command(about = "access to the Void Cloud Platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tell us who you are
    Login(commands::login::LoginArgs),

    /// Share your game with others
    Deploy(commands::deploy::DeployArgs),
}

#[tokio::main]
async fn main() {
    // stdout is for the user; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::Config::load()?;
    tracing::debug!(path = %config::config_path().display(), "configuration loaded");

    match cli.command {
        Commands::Login(args) => commands::login::run(args, &config).await,
        Commands::Deploy(args) => commands::deploy::run(args, &config).await,
    }
}
