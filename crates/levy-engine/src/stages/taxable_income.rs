//! Stage 5: taxable income.
//!
//! AGI less the selected deduction less the QBI deduction, floored at
//! zero. Negative AGI is valid upstream; taxable income never goes
//! below zero.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::context::CalculationContext;
use crate::stages::{Stage, StageRecord};

pub(crate) struct TaxableIncomeStage;

impl Stage for TaxableIncomeStage {
    fn name(&self) -> StageName {
        StageName::TaxableIncome
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        _rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let agi = ctx.agi(self.name())?.agi;
        let deduction = ctx.deductions(self.name())?.amount;
        let qbi = ctx.qbi(self.name())?.deduction;

        let taxable_income = (agi - deduction - qbi).floor_zero().to_line();
        debug!(taxable_income = %taxable_income, "taxable income computed");

        let record = StageRecord {
            input_snapshot: json!({
                "agi": agi,
                "deduction": deduction,
                "qbi_deduction": qbi,
            }),
            output_snapshot: json!({ "taxable_income": taxable_income }),
        };
        ctx.commit_taxable_income(taxable_income)?;
        Ok(record)
    }
}
