//! Stage 7: alternative minimum tax.
//!
//! AMTI starts from taxable income, adds back the preference items and
//! the standard deduction when it was taken. The exemption phases out
//! above the per-status threshold at the configured rate. Tentative
//! minimum tax comes from the two-tier AMT schedule; anything above the
//! regular tax (ordinary plus preferential, surtax excluded) is owed as
//! AMT.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::{AmtLine, DeductionSelection};
use crate::context::CalculationContext;
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct AlternativeMinimumTaxStage;

impl Stage for AlternativeMinimumTaxStage {
    fn name(&self) -> StageName {
        StageName::AlternativeMinimumTax
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let taxable_income = *ctx.taxable_income(self.name())?;
        let deductions = ctx.deductions(self.name())?;
        let regular_tax = ctx.tax(self.name())?.regular_tax;
        let input = ctx.input();
        let status = input.filing_status;
        let amt = &rules.amt;

        let standard_addback = match deductions.selection {
            DeductionSelection::Standard => deductions.amount,
            DeductionSelection::Itemized => Money::ZERO,
        };
        let amti = taxable_income + input.amt_preference_items + standard_addback;

        let threshold = *amt.exemption_phaseout_threshold.get(status);
        let reduction = (amti - threshold)
            .floor_zero()
            .mul_rate(amt.exemption_phaseout_rate);
        let exemption = (*amt.exemption.get(status) - reduction).floor_zero();

        let amt_base = (amti - exemption).floor_zero();
        let tentative_minimum_tax = amt.brackets.get(status).tax_for(amt_base).to_line();
        let amt_owed = (tentative_minimum_tax - regular_tax).floor_zero().to_line();

        let line = AmtLine {
            amti: amti.to_line(),
            exemption: exemption.to_line(),
            tentative_minimum_tax,
            amt: amt_owed,
        };
        debug!(amti = %line.amti, amt = %line.amt, "alternative minimum tax computed");
        let record = StageRecord {
            input_snapshot: json!({
                "taxable_income": taxable_income,
                "amt_preference_items": input.amt_preference_items,
                "standard_deduction_addback": standard_addback,
                "regular_tax": regular_tax,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_amt(line)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{context_through_tax, input_with, rules};
    use levy_core::FilingStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn no_preferences_below_exemption_owes_no_amt() {
        let input = input_with(|i| {
            i.income.wages = Money::from_dollars(50_000);
        });
        let mut ctx = context_through_tax(
            &input,
            Money::from_dollars(50_000),
            Money::from_dollars(34_250),
        );
        AlternativeMinimumTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.amt(StageName::Credits).unwrap();
        // AMTI 50,000 is below the 88,100 exemption.
        assert_eq!(line.tentative_minimum_tax, Money::ZERO);
        assert_eq!(line.amt, Money::ZERO);
    }

    #[test]
    fn preference_items_can_trigger_amt() {
        let input = input_with(|i| {
            i.filing_status = FilingStatus::MarriedFilingJointly;
            i.income.wages = Money::from_dollars(500_000);
            i.income.taxable_interest = Money::from_dollars(20_000);
            i.income.ordinary_dividends = Money::from_dollars(30_000);
            i.income.qualified_dividends = Money::from_dollars(30_000);
            i.income.long_term_capital_gain = Money::from_dollars(50_000);
            i.amt_preference_items = Money::from_dollars(40_000);
        });
        let mut ctx = context_through_tax(
            &input,
            Money::from_dollars(600_000),
            Money::from_dollars(568_500),
        );
        AlternativeMinimumTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.amt(StageName::Credits).unwrap();
        // 568,500 + 40,000 preferences + 31,500 standard = 640,000 AMTI.
        assert_eq!(line.amti, Money::from_dollars(640_000));
        assert_eq!(line.exemption, Money::from_dollars(137_000));
        // Base 503,000: 26% to 239,100 then 28% = 136,058.
        assert_eq!(line.tentative_minimum_tax, Money::from_decimal(dec!(136058.00)));
        // Regular 110,446 + 12,000 = 122,446.
        assert_eq!(line.amt, Money::from_decimal(dec!(13612.00)));
    }

    #[test]
    fn exemption_phases_out_above_threshold() {
        let input = input_with(|i| {
            i.income.wages = Money::from_dollars(800_000);
        });
        let mut ctx = context_through_tax(
            &input,
            Money::from_dollars(800_000),
            Money::from_dollars(784_250),
        );
        AlternativeMinimumTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.amt(StageName::Credits).unwrap();
        // AMTI 800,000; excess over 626,350 is 173,650; reduction
        // 43,412.50 leaves 44,687.50 of the 88,100 exemption.
        assert_eq!(line.exemption, Money::from_decimal(dec!(44687.50)));
    }

    #[test]
    fn itemized_deduction_is_not_added_back() {
        let input = input_with(|i| {
            i.income.wages = Money::from_dollars(200_000);
        });
        let mut ctx = crate::testutil::context_through_tax_itemized(
            &input,
            Money::from_dollars(200_000),
            Money::from_dollars(170_000),
            Money::from_dollars(30_000),
        );
        AlternativeMinimumTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.amt(StageName::Credits).unwrap();
        // AMTI equals taxable income: no preferences, no standard addback.
        assert_eq!(line.amti, Money::from_dollars(170_000));
    }
}
