//! # levy-engine
//!
//! The Levy calculation pipeline: a validated [`TaxReturnInput`] runs
//! through nine ordered, pure stages against an immutable rule set,
//! producing an exhaustive [`CalculationBreakdown`] and a sealed,
//! tamper-evident audit chain. Runs are synchronous, single-threaded,
//! and deterministic; concurrency lives at the caller's worker pool,
//! not here.

pub mod breakdown;
pub mod context;
mod credits;
pub mod input;
pub mod pipeline;
mod stages;
pub mod validate;

#[cfg(test)]
pub(crate) mod testutil;

pub use breakdown::{
    AgiLine, AmtLine, CalculationBreakdown, CreditClaim, CreditLine, DeductionLine,
    DeductionSelection, ItemizedDetail, PaymentsLine, QbiComponent, QbiLine, QuarterPenalty,
    SeTaxLine, TaxLine,
};
pub use context::CalculationContext;
pub use input::{
    Carryforward, CreditClaimInput, IncomeItems, ItemizedCandidates, Payments, QbiBusiness,
    TaxReturnInput, SUPPORTED_SCHEMA_VERSIONS,
};
pub use pipeline::{CalculationOutcome, Pipeline, PipelineError, PipelineFailure};
pub use validate::{validate_input, validate_output};
