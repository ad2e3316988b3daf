//! # Calculation Pipeline
//!
//! Synchronous, single-threaded execution of the nine stages over one
//! validated input. Every stage that runs leaves exactly one audit
//! event; a failing stage halts the run, and the partial chain is
//! sealed `Incomplete` and handed back for forensic inspection. A run
//! that completes seals its chain `Complete` and assembles the
//! breakdown.
//!
//! Determinism: the same input, rule version, and run id produce a
//! byte-identical serialized breakdown; the chain differs only in
//! event timestamps and the hashes derived from them.

use thiserror::Error;
use tracing::{error, info, info_span};

use levy_audit::{AuditChain, AuditKey, SealedChain};
use levy_core::{
    AuditIntegrityError, CalculationError, Money, Rate, RunId, ValidationError,
};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::CalculationBreakdown;
use crate::context::CalculationContext;
use crate::input::TaxReturnInput;
use crate::stages::pipeline_stages;
use crate::validate::{validate_input, validate_output};

/// Why a run failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input rejected before any stage ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A stage failed.
    #[error(transparent)]
    Calculation(#[from] CalculationError),
    /// The audit chain could not be recorded or sealed.
    #[error(transparent)]
    Audit(#[from] AuditIntegrityError),
}

/// A failed run. When stages ran before the failure, the partial chain
/// is sealed `Incomplete` and carried here; input-validation failures
/// precede the chain's existence and carry none.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    /// The failure itself.
    pub error: PipelineError,
    /// The sealed partial chain, when one exists.
    pub chain: Option<SealedChain>,
}

/// A completed run: the breakdown and its sealed audit chain.
#[derive(Debug)]
pub struct CalculationOutcome {
    /// The line-item result.
    pub breakdown: CalculationBreakdown,
    /// The sealed, complete audit chain.
    pub chain: SealedChain,
}

/// The nine-stage calculation pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Run one calculation.
    pub fn execute(
        input: &TaxReturnInput,
        rules: &JurisdictionRuleSet,
        key: AuditKey,
        run_id: RunId,
    ) -> Result<CalculationOutcome, PipelineFailure> {
        let span = info_span!("calculation_run", run_id = %run_id, rule_version = %rules.rule_version);
        let _guard = span.enter();

        if let Err(e) = validate_input(input, rules) {
            error!(error = %e, "input rejected");
            return Err(PipelineFailure {
                error: e.into(),
                chain: None,
            });
        }

        let mut chain = AuditChain::new(run_id, key);
        let mut ctx = CalculationContext::new(input);

        for stage in pipeline_stages() {
            let stage_span = info_span!("stage", name = %stage.name());
            let _stage_guard = stage_span.enter();

            let record = match stage.execute(&mut ctx, rules) {
                Ok(record) => record,
                Err(e) => {
                    error!(stage = %stage.name(), error = %e, "stage failed");
                    return Err(seal_failure(chain, e.into()));
                }
            };
            if let Err(e) = chain.record(
                stage.name(),
                &rules.rule_version,
                record.input_snapshot,
                record.output_snapshot,
            ) {
                error!(stage = %stage.name(), error = %e, "audit record failed");
                return Err(seal_failure(chain, e.into()));
            }
        }

        let breakdown = match assemble(run_id, &mut ctx, rules) {
            Ok(breakdown) => breakdown,
            Err(e) => return Err(seal_failure(chain, e.into())),
        };
        if let Err(e) = validate_output(&breakdown) {
            error!(error = %e, "output rejected");
            return Err(seal_failure(chain, e.into()));
        }

        let sealed = match chain.seal() {
            Ok(sealed) => sealed,
            Err(e) => {
                return Err(PipelineFailure {
                    error: e.into(),
                    chain: None,
                })
            }
        };
        info!(total_tax = %breakdown.total_tax, "calculation complete");
        Ok(CalculationOutcome {
            breakdown,
            chain: sealed,
        })
    }
}

/// Seal what recorded so far and wrap the error.
fn seal_failure(chain: AuditChain, error: PipelineError) -> PipelineFailure {
    match chain.seal_incomplete() {
        Ok(sealed) => PipelineFailure {
            error,
            chain: Some(sealed),
        },
        // Sealing itself failing is strictly worse; surface it but keep
        // the original failure as the headline.
        Err(_) => PipelineFailure { error, chain: None },
    }
}

/// Assemble the breakdown from a fully committed context. A missing
/// commit here is a stage-contract defect and surfaces as the usual
/// missing-dependency error rather than a panic.
fn assemble(
    run_id: RunId,
    ctx: &mut CalculationContext<'_>,
    rules: &JurisdictionRuleSet,
) -> Result<CalculationBreakdown, CalculationError> {
    let input = ctx.input();
    let jurisdiction = input.jurisdiction.clone();
    let tax_year = input.tax_year;
    let filing_status = input.filing_status;
    let income = input.income.clone();
    let reader = levy_core::StageName::PaymentsAndPenalties;

    let se_tax = ctx.se_tax(reader)?.clone();
    let agi = ctx.agi(reader)?.clone();
    let deductions = ctx.deductions(reader)?.clone();
    let qbi = ctx.qbi(reader)?.clone();
    let taxable_income = *ctx.taxable_income(reader)?;
    let tax = ctx.tax(reader)?.clone();
    let amt = ctx.amt(reader)?.clone();
    let credits = ctx.credits(reader)?.clone();
    let payments = ctx.payments(reader)?.clone();

    let effective_rate = if agi.total_income.is_positive() {
        payments.total_tax.ratio(agi.total_income).clamp_unit()
    } else {
        Rate::ZERO
    };
    let marginal_rate = rules
        .ordinary_brackets
        .get(filing_status)
        .marginal_rate(tax.ordinary_taxable);

    let total_tax: Money = payments.total_tax;
    let refund_or_due = payments.refund_or_due;
    Ok(CalculationBreakdown {
        run_id,
        jurisdiction,
        tax_year,
        filing_status,
        rule_version: rules.rule_version.clone(),
        income,
        se_tax,
        agi,
        deductions,
        qbi,
        taxable_income,
        tax,
        amt,
        credits,
        payments,
        total_tax,
        refund_or_due,
        effective_rate,
        marginal_rate,
        warnings: ctx.take_warnings(),
    })
}
