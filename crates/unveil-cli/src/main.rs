use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "unveil", version, about = "Unveil CLI")]
struct Cli {
    /// Config file (defaults to <config_dir>/unveil/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether content is unlocked at a given instant
    Gate(commands::gate::GateArgs),
    /// Print the time left until the window opens
    Countdown(commands::countdown::CountdownArgs),
    /// Live countdown, ticking once per second until unlock
    Watch(commands::watch::WatchArgs),
    /// Run a page layout against virtual time and print its events
    Simulate(commands::simulate::SimulateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = common::Context::new(cli.config);
    let result = match cli.command {
        Commands::Gate(args) => commands::gate::run(args, &ctx),
        Commands::Countdown(args) => commands::countdown::run(args, &ctx),
        Commands::Watch(args) => commands::watch::run(args, &ctx),
        Commands::Simulate(args) => commands::simulate::run(args, &ctx),
        Commands::Config { action } => commands::config::run(action, &ctx),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
