//! # Pipeline Stages
//!
//! One module per stage, each implementing [`Stage`]. A stage reads
//! committed fields and the input, commits exactly one line to the
//! context, and hands back the snapshots its audit event will carry.
//! Stages never record audit events themselves; the pipeline does, so
//! event ordering matches execution ordering by construction.

use serde::Serialize;
use serde_json::Value;

use levy_core::{CalculationError, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::context::CalculationContext;

mod agi;
mod amt;
mod deductions;
mod payments;
mod qbi;
mod se_tax;
mod tax;
mod taxable_income;

pub(crate) use agi::AdjustedGrossIncomeStage;
pub(crate) use amt::AlternativeMinimumTaxStage;
pub(crate) use deductions::DeductionsStage;
pub(crate) use payments::PaymentsAndPenaltiesStage;
pub(crate) use qbi::QualifiedBusinessIncomeStage;
pub(crate) use se_tax::SelfEmploymentTaxStage;
pub(crate) use tax::TaxComputationStage;
pub(crate) use taxable_income::TaxableIncomeStage;

/// Snapshots destined for the stage's audit event.
#[derive(Debug)]
pub(crate) struct StageRecord {
    /// The fields the stage read.
    pub input_snapshot: Value,
    /// The fields the stage committed.
    pub output_snapshot: Value,
}

/// One computation stage of the pipeline.
pub(crate) trait Stage {
    fn name(&self) -> StageName;

    /// Run the stage: read, compute, commit, snapshot.
    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError>;
}

/// Serialize a snapshot, attributing failure to the stage.
pub(crate) fn snapshot<T: Serialize>(
    stage: StageName,
    value: &T,
) -> Result<Value, CalculationError> {
    serde_json::to_value(value).map_err(|e| CalculationError::AuditRecord {
        stage,
        detail: e.to_string(),
    })
}

/// The credits stage lives beside the ordering engine it delegates to.
pub(crate) use crate::credits::CreditsStage;

/// All nine stages in execution order.
pub(crate) fn pipeline_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(SelfEmploymentTaxStage),
        Box::new(AdjustedGrossIncomeStage),
        Box::new(DeductionsStage),
        Box::new(QualifiedBusinessIncomeStage),
        Box::new(TaxableIncomeStage),
        Box::new(TaxComputationStage),
        Box::new(AlternativeMinimumTaxStage),
        Box::new(CreditsStage),
        Box::new(PaymentsAndPenaltiesStage),
    ]
}
