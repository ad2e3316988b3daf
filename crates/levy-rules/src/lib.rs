//! # levy-rules — Jurisdiction Rule Registry
//!
//! Versioned, data-driven tax rule tables for the Levy engine. A rule set
//! is declarative data — bracket tables, phaseout curves, credit-ordering
//! rows — consumed by generic stage logic, which keeps individual business
//! rules independently testable as fixtures rather than bespoke code
//! paths.
//!
//! ## Lifecycle
//!
//! The registry is populated once at process start (from rule files via
//! [`RuleRegistry::load_dir`] or the built-in [`federal_2025`] fixture)
//! and is immutable afterwards: safe for unsynchronized concurrent reads
//! across worker threads. Resolution of an unregistered
//! (jurisdiction, tax year) pair is a fatal configuration error, never a
//! silent default.

pub mod brackets;
pub mod federal;
pub mod phaseout;
pub mod registry;
pub mod ruleset;

// Re-export primary types.
pub use brackets::{BracketSegment, BracketTable};
pub use federal::federal_2025;
pub use phaseout::{PhaseoutBand, SteppedPhaseout};
pub use registry::RuleRegistry;
pub use ruleset::{
    AmtRules, CreditKind, CreditRule, ItemizedRules, JurisdictionRuleSet, MonthDay, NiitRules,
    PaymentRules, PerStatus, QbiRules, SeTaxRules,
};
