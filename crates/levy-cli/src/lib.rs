//! # levy-cli — CLI Tool for the Levy Engine
//!
//! Provides the `levy` command-line interface over the calculation
//! pipeline and the audit-chain verifier.
//!
//! ## Subcommands
//!
//! - `levy calc` — Run one calculation and print the breakdown JSON.
//! - `levy verify` — Independently verify a sealed audit chain file.
//! - `levy rules` — List registered (jurisdiction, tax year) rule sets.
//!
//! ## Exit Codes
//!
//! - `0` — success.
//! - `1` — operational error (bad input, missing rules, I/O).
//! - `2` — audit chain verification failure.

pub mod calc;
pub mod rules;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};

use levy_audit::AuditKey;
use levy_rules::RuleRegistry;

/// Environment variable consulted for the audit key when `--key` is absent.
pub const KEY_ENV_VAR: &str = "LEVY_AUDIT_KEY";

/// Resolve the audit key from a `--key` flag or the environment.
///
/// The flag wins when both are present. Key material never appears in
/// logs or error messages; only its provenance does.
pub fn resolve_key(flag: Option<&str>) -> Result<AuditKey> {
    if let Some(hex) = flag {
        return AuditKey::from_hex(hex).context("invalid --key value");
    }
    match std::env::var(KEY_ENV_VAR) {
        Ok(hex) => AuditKey::from_hex(&hex)
            .with_context(|| format!("invalid {KEY_ENV_VAR} value")),
        Err(_) => anyhow::bail!("no audit key: pass --key HEX or set {KEY_ENV_VAR}"),
    }
}

/// Build the rule registry from `--rules DIR` or the built-in fixture.
pub fn load_registry(rules_dir: Option<&Path>) -> Result<RuleRegistry> {
    match rules_dir {
        Some(dir) => RuleRegistry::load_dir(dir)
            .with_context(|| format!("loading rule files from {}", dir.display())),
        None => RuleRegistry::builtin().context("loading built-in rule set"),
    }
}
