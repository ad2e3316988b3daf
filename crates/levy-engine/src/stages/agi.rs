//! Stage 2: adjusted gross income.
//!
//! Total income is the plain sum of the reported income items. The
//! adjustments are the reported above-the-line amounts plus the
//! half-SE-tax deduction committed by stage 1. Negative AGI is a valid
//! result (a net operating loss) and is not floored here.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::AgiLine;
use crate::context::CalculationContext;
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct AdjustedGrossIncomeStage;

impl Stage for AdjustedGrossIncomeStage {
    fn name(&self) -> StageName {
        StageName::AdjustedGrossIncome
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        _rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let half_se = ctx.se_tax(self.name())?.half_deduction;
        let income = &ctx.input().income;

        let total_income: Money = [
            income.wages,
            income.taxable_interest,
            income.ordinary_dividends,
            income.short_term_capital_gain,
            income.long_term_capital_gain,
            income.self_employment_net_profit,
            income.other_income,
        ]
        .into_iter()
        .sum();

        let total_adjustments = ctx.input().other_adjustments + half_se;
        let agi = (total_income - total_adjustments).to_line();

        if agi.is_negative() {
            ctx.warn(format!("negative AGI {agi}: net operating loss year"));
        }

        let line = AgiLine {
            total_income: total_income.to_line(),
            total_adjustments: total_adjustments.to_line(),
            agi,
        };
        debug!(agi = %line.agi, "adjusted gross income computed");
        let record = StageRecord {
            input_snapshot: json!({
                "income": income,
                "other_adjustments": ctx.input().other_adjustments,
                "half_se_tax_deduction": half_se,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_agi(line)?;
        Ok(record)
    }
}
