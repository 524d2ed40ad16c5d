//! Driftwatch CLI
//!
//! Command-line interface for running drift analyses and sweeps over a
//! directory of snapshot JSON files.

use clap::{Parser, Subcommand};
use driftwatch_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "driftwatch")]
#[command(about = "Driftwatch - configuration drift detection", long_about = None)]
struct Cli {
    /// Logging profile: development, production or test
    #[arg(long, global = true, default_value = "development")]
    log_profile: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two snapshots of one tenant and snapshot type
    Analyze(commands::analyze::AnalyzeArgs),
    /// Run a scheduled sweep once across every tenant in the snapshot set
    Sweep(commands::sweep::SweepArgs),
}

fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.log_profile);

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args),
        Commands::Sweep(args) => commands::sweep::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
