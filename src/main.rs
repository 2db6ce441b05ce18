//! Seatflow CLI entry point

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "seatflow")]
#[command(about = "Max-flow seat allocation with live cancellations and capacity changes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShortfallArg {
    Queue,
    Refund,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OverbookArg {
    Keep,
    Queue,
    Refund,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the scenario's network once and print the result
    Solve {
        /// Scenario file (TOML)
        scenario: PathBuf,
    },
    /// Solve, then apply the scenario's scripted events in order
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Override the scenario's shortfall policy
        #[arg(long, value_enum)]
        on_shortfall: Option<ShortfallArg>,

        /// Override the scenario's overbook policy
        #[arg(long, value_enum)]
        on_overbook: Option<OverbookArg>,
    },
    /// Validate a scenario without solving it
    Check {
        /// Scenario file (TOML)
        scenario: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "seatflow={},seatflow_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Seatflow v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Solve { scenario } => commands::solve(&scenario, cli.format),
        Commands::Run {
            scenario,
            on_shortfall,
            on_overbook,
        } => commands::run(&scenario, cli.format, on_shortfall, on_overbook),
        Commands::Check { scenario } => commands::check(&scenario, cli.format),
        Commands::Version => {
            println!("Seatflow v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
