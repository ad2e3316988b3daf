//! # Rules CLI — List registered rule sets.
//!
//! ```bash
//! levy rules
//! levy rules --rules ./rules
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::load_registry;

/// Rules subcommand arguments.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Directory of rule files. Defaults to the built-in rule set.
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

/// Execute the rules subcommand.
pub fn run_rules(args: &RulesArgs) -> Result<u8> {
    let registry = load_registry(args.rules.as_deref())?;
    let registered = registry.registered();

    println!("Registered rule sets ({}):", registered.len());
    for (jurisdiction, tax_year, rule_version) in &registered {
        println!("  {jurisdiction} {tax_year}  {rule_version}");
    }
    Ok(0)
}
