//! # Calc CLI — Run one calculation from an input file.
//!
//! Reads a `TaxReturnInput` JSON document, resolves the governing rule
//! set, runs the nine-stage pipeline, and prints the breakdown JSON to
//! stdout. The sealed audit chain can be written alongside with
//! `--chain-out`; when a run fails mid-pipeline, the partial chain
//! (sealed `Incomplete`) is written there too, so operators retain the
//! forensic record of what did execute.
//!
//! ## Usage
//!
//! ```bash
//! # Run against the built-in federal rule set:
//! levy calc --input return.json --key $(cat audit.key)
//!
//! # Run against external rule files, archiving the chain:
//! levy calc --input return.json --rules ./rules --chain-out run.chain.json
//!
//! # Override the jurisdiction/year declared in the input file:
//! levy calc --input return.json --jurisdiction US --year 2025
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use levy_audit::SealedChain;
use levy_core::{Jurisdiction, RunId, TaxYear};
use levy_engine::{Pipeline, TaxReturnInput};

use crate::{load_registry, resolve_key};

/// Calc subcommand arguments.
#[derive(Args, Debug)]
pub struct CalcArgs {
    /// Path to the tax return input JSON file.
    #[arg(long)]
    pub input: PathBuf,

    /// Directory of rule files. Defaults to the built-in rule set.
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Override the jurisdiction declared in the input file.
    #[arg(long)]
    pub jurisdiction: Option<String>,

    /// Override the tax year declared in the input file.
    #[arg(long)]
    pub year: Option<u16>,

    /// Audit key as 64 hex characters. Falls back to $LEVY_AUDIT_KEY.
    #[arg(long)]
    pub key: Option<String>,

    /// Write the sealed audit chain to this file.
    #[arg(long)]
    pub chain_out: Option<PathBuf>,
}

/// Execute the calc subcommand.
pub fn run_calc(args: &CalcArgs) -> Result<u8> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("reading input file {}", args.input.display()))?;
    let mut input: TaxReturnInput = serde_json::from_str(&raw)
        .with_context(|| format!("parsing input file {}", args.input.display()))?;

    if let Some(code) = &args.jurisdiction {
        input.jurisdiction = Jurisdiction::new(code)?;
    }
    if let Some(year) = args.year {
        input.tax_year = TaxYear::new(year)?;
    }

    let registry = load_registry(args.rules.as_deref())?;
    let rules = registry.resolve(&input.jurisdiction, input.tax_year)?;
    let key = resolve_key(args.key.as_deref())?;

    let run_id = RunId::new();
    tracing::info!(%run_id, jurisdiction = %input.jurisdiction, tax_year = %input.tax_year, "starting run");

    match Pipeline::execute(&input, &rules, key, run_id) {
        Ok(outcome) => {
            if let Some(path) = &args.chain_out {
                write_chain(path, &outcome.chain)?;
            }
            let rendered = serde_json::to_string_pretty(&outcome.breakdown)
                .context("serializing breakdown")?;
            println!("{rendered}");
            Ok(0)
        }
        Err(failure) => {
            // A partial chain is still evidence; archive it if asked.
            if let (Some(path), Some(chain)) = (&args.chain_out, &failure.chain) {
                write_chain(path, chain)?;
            }
            Err(anyhow::Error::new(failure).context("calculation failed"))
        }
    }
}

fn write_chain(path: &Path, chain: &SealedChain) -> Result<()> {
    let rendered = serde_json::to_string_pretty(chain).context("serializing audit chain")?;
    fs::write(path, rendered)
        .with_context(|| format!("writing audit chain to {}", path.display()))?;
    tracing::info!(path = %path.display(), "audit chain written");
    Ok(())
}
