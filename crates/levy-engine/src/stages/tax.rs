//! Stage 6: regular tax computation.
//!
//! Ordinary income fills the progressive brackets first; the
//! preferential slice (qualified dividends plus net long-term gain)
//! stacks on top and is taxed through the preferential schedule at the
//! stacked position. The investment surtax applies to the smaller of
//! net investment income and the MAGI excess over the per-status
//! threshold.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::TaxLine;
use crate::context::CalculationContext;
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct TaxComputationStage;

impl Stage for TaxComputationStage {
    fn name(&self) -> StageName {
        StageName::TaxComputation
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let taxable_income = *ctx.taxable_income(self.name())?;
        let agi = ctx.agi(self.name())?.agi;
        let input = ctx.input();
        let income = &input.income;
        let status = input.filing_status;

        // Short-term losses absorb long-term gains before the
        // preferential slice forms.
        let net_long_term = (income.long_term_capital_gain
            + income.short_term_capital_gain.min(Money::ZERO))
        .floor_zero();
        let preferential_income = (income.qualified_dividends + net_long_term)
            .min(taxable_income)
            .floor_zero();
        let ordinary_taxable = taxable_income - preferential_income;

        let ordinary_tax = rules
            .ordinary_brackets
            .get(status)
            .tax_for(ordinary_taxable)
            .to_line();
        let preferential_tax = rules
            .preferential_brackets
            .get(status)
            .tax_for_stacked(ordinary_taxable, preferential_income)
            .to_line();

        // Net investment income: interest, dividends, net capital gain.
        let net_investment_income = (income.taxable_interest
            + income.ordinary_dividends
            + (income.short_term_capital_gain + income.long_term_capital_gain).floor_zero())
        .floor_zero();
        let magi_excess = (agi - *rules.niit.magi_threshold.get(status)).floor_zero();
        let niit = net_investment_income
            .min(magi_excess)
            .mul_rate(rules.niit.rate)
            .to_line();

        let line = TaxLine {
            ordinary_taxable,
            ordinary_tax,
            preferential_income,
            preferential_tax,
            net_investment_income,
            niit,
            regular_tax: ordinary_tax + preferential_tax,
        };
        debug!(
            regular_tax = %line.regular_tax,
            niit = %line.niit,
            "regular tax computed"
        );
        let record = StageRecord {
            input_snapshot: json!({
                "taxable_income": taxable_income,
                "agi": agi,
                "qualified_dividends": income.qualified_dividends,
                "short_term_capital_gain": income.short_term_capital_gain,
                "long_term_capital_gain": income.long_term_capital_gain,
                "taxable_interest": income.taxable_interest,
                "ordinary_dividends": income.ordinary_dividends,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_tax(line)?;
        Ok(record)
    }
}
