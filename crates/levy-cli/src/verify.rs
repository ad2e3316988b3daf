//! # Verify CLI — Independent audit chain verification.
//!
//! Re-checks a sealed chain file without any engine state: sequence
//! contiguity, the genesis link, every HMAC link, the head, and the
//! chain digest. A verification failure names the first broken link and
//! maps to exit code 2, distinct from operational errors.
//!
//! ```bash
//! levy verify --chain run.chain.json --key $(cat audit.key)
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use levy_audit::SealedChain;

use crate::resolve_key;

/// Verify subcommand arguments.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the sealed audit chain JSON file.
    #[arg(long)]
    pub chain: PathBuf,

    /// Audit key as 64 hex characters. Falls back to $LEVY_AUDIT_KEY.
    #[arg(long)]
    pub key: Option<String>,
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let raw = fs::read_to_string(&args.chain)
        .with_context(|| format!("reading chain file {}", args.chain.display()))?;
    let chain: SealedChain = serde_json::from_str(&raw)
        .with_context(|| format!("parsing chain file {}", args.chain.display()))?;
    let key = resolve_key(args.key.as_deref())?;

    match chain.verify(&key) {
        Ok(()) => {
            println!(
                "chain {} verified: {} events, status {}",
                chain.run_id(),
                chain.events().len(),
                chain.status().as_str()
            );
            Ok(0)
        }
        Err(e) => {
            tracing::error!(run_id = %chain.run_id(), error = %e, "chain verification failed");
            println!("chain {} FAILED verification: {e}", chain.run_id());
            Ok(2)
        }
    }
}
