// Market simulator CLI
// Replays bar files through the matching engine

use clap::{Parser, Subcommand};
use ohlc_market_sim::{Config, ConfigError};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};

#[path = "../cli/sim_commands.rs"]
mod sim_commands;

#[derive(Parser)]
#[command(name = "market-sim")]
#[command(version)]
#[command(about = "OHLC limit order backtest simulator", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "sim.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Replay a bar file through the engine
    Run {
        /// JSON array of bars
        #[arg(short, long)]
        bars: PathBuf,

        /// JSON array of scheduled orders
        #[arg(short, long)]
        orders: Option<PathBuf>,

        /// Write the replay outcome as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Include every per-bar report in the output
        #[arg(long)]
        reports: bool,
    },

    /// Replay once per expiry limit, in parallel
    Sweep {
        /// JSON array of bars
        #[arg(short, long)]
        bars: PathBuf,

        /// JSON array of scheduled orders
        #[arg(short, long)]
        orders: Option<PathBuf>,

        /// Comma separated expiry limits, e.g. 1,2,5
        #[arg(short, long, value_delimiter = ',', required = true)]
        limits: Vec<u32>,
    },
}

fn load_config(path: &str) -> Result<Config, ConfigError> {
    if Path::new(path).exists() {
        Config::from_file(path)
    } else {
        Ok(Config::default())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config);
    let level = match (&config, cli.verbose) {
        (_, true) => Level::DEBUG,
        (Ok(config), false) => config.logging.tracing_level().unwrap_or(Level::INFO),
        (Err(_), false) => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Commands::Init { force } = cli.command {
        sim_commands::init_config(&cli.config, force)?;
        return Ok(());
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load {}: {}", cli.config, e);
            return Err(e.into());
        }
    };
    if !Path::new(&cli.config).exists() {
        warn!("{} not found, using default configuration", cli.config);
    }
    info!("Config: {}", cli.config);

    let result = match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Run { bars, orders, output, reports } => {
            sim_commands::run_replay(&config, &bars, orders.as_deref(), output.as_deref(), reports)
        }
        Commands::Sweep { bars, orders, limits } => {
            sim_commands::run_sweep(&config, &bars, orders.as_deref(), &limits)
        }
    };

    if let Err(e) = result {
        error!("{} error: {}", e.category(), e);
        return Err(e.into());
    }

    Ok(())
}
