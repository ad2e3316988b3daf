//! # levy CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Uses clap derive macros; verbosity flags map onto the tracing
//! `EnvFilter` so the same binary serves quiet batch use and verbose
//! debugging.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use levy_cli::calc::{run_calc, CalcArgs};
use levy_cli::rules::{run_rules, RulesArgs};
use levy_cli::verify::{run_verify, VerifyArgs};

/// Levy Engine CLI
///
/// Deterministic tax calculation with a tamper-evident audit trail.
/// Runs calculations from JSON input files, verifies sealed audit
/// chains, and inspects the registered rule sets.
#[derive(Parser, Debug)]
#[command(name = "levy", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one calculation and print the breakdown JSON.
    Calc(CalcArgs),

    /// Verify a sealed audit chain file against its key.
    Verify(VerifyArgs),

    /// List registered (jurisdiction, tax year) rule sets.
    Rules(RulesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Calc(args) => run_calc(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::Rules(args) => run_rules(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
