use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use rover_core::{Config, SearchSession};
use std::path::PathBuf;

mod interactive;
mod missions;
mod render;
mod search;

#[derive(Parser)]
#[command(name = "rover")]
#[command(about = "Search the rover photo archive by Earth date or SOL", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    /// Read configuration from this file instead of ~/.rover/config.toml
    #[arg(long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the date and SOL range of every mission
    #[command(alias = "m")]
    Missions(missions::MissionsArgs),

    /// Search photos by Earth date or SOL, rover and camera
    #[command(alias = "s")]
    Search(search::SearchArgs),

    /// Search repeatedly and collect photos for this session
    #[command(alias = "i")]
    Interactive(interactive::InteractiveArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug, RUST_LOG still wins
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!(
        "using {} for missions {}",
        config.api_base_url,
        config.missions.join(", ")
    );
    let session = SearchSession::from_config(&config).context("Failed to create API client")?;

    // Everything runs as cooperative tasks on this one thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        match cli.command {
            Commands::Missions(args) => missions::execute(&session, args).await,
            Commands::Search(args) => search::execute(&session, args).await,
            Commands::Interactive(args) => interactive::execute(&session, args).await,
        }
    })
}
