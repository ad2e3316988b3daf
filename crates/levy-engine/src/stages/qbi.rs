//! Stage 4: qualified-business-income deduction.
//!
//! Each business contributes 20% of its qualified income, limited by
//! the greater of the W-2 wage tests. The limitation phases in linearly
//! across the per-status taxable-income band; below the band it is
//! ignored entirely, above it it binds fully. SSTB income additionally
//! phases to zero across the same band. The total is capped at 20% of
//! taxable income before QBI less net capital gain. The fraction is
//! continuous at both band edges, so a one-dollar income change never
//! jumps the deduction.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, Rate, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::{QbiComponent, QbiLine};
use crate::context::CalculationContext;
use crate::input::QbiBusiness;
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct QualifiedBusinessIncomeStage;

impl Stage for QualifiedBusinessIncomeStage {
    fn name(&self) -> StageName {
        StageName::QualifiedBusinessIncome
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let agi = ctx.agi(self.name())?.agi;
        let deduction_amount = ctx.deductions(self.name())?.amount;
        let input = ctx.input();
        let qbi = &rules.qbi;

        // Taxable income before this deduction drives both the phase-in
        // fraction and the overall cap.
        let ti_pre_qbi = agi - deduction_amount;
        let band = qbi.phase_in.get(input.filing_status);
        let fraction = band.fraction(ti_pre_qbi);

        let components: Vec<QbiComponent> = input
            .qbi_businesses
            .iter()
            .map(|b| business_component(b, fraction, rules))
            .collect();
        let pre_cap_total: Money = components.iter().map(|c| c.component).sum();

        let income = &input.income;
        let net_long_term = (income.long_term_capital_gain
            + income.short_term_capital_gain.min(Money::ZERO))
        .floor_zero();
        let net_capital_gain = income.qualified_dividends + net_long_term;
        let cap = (ti_pre_qbi.floor_zero() - net_capital_gain)
            .floor_zero()
            .mul_rate(qbi.rate);

        let deduction = pre_cap_total.floor_zero().min(cap).to_line();

        let line = QbiLine {
            phase_in_fraction: fraction,
            components,
            pre_cap_total: pre_cap_total.to_line(),
            cap: cap.to_line(),
            deduction,
        };
        debug!(deduction = %line.deduction, fraction = %fraction, "QBI deduction computed");
        let record = StageRecord {
            input_snapshot: json!({
                "taxable_income_before_qbi": ti_pre_qbi,
                "qbi_businesses": input.qbi_businesses,
                "net_capital_gain": net_capital_gain,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_qbi(line)?;
        Ok(record)
    }
}

/// One business's limited component at a given phase-in fraction.
fn business_component(
    business: &QbiBusiness,
    fraction: Rate,
    rules: &JurisdictionRuleSet,
) -> QbiComponent {
    let qbi = &rules.qbi;

    // SSTB amounts shrink toward zero across the band.
    let sstb_scale = if business.sstb {
        fraction.complement()
    } else {
        Rate::ONE
    };
    let income = business.qualified_income.mul_rate(sstb_scale);
    let w2 = business.w2_wages.mul_rate(sstb_scale);
    let ubia = business.ubia.mul_rate(sstb_scale);

    let tentative = income.mul_rate(qbi.rate);
    let wage_limit = w2
        .mul_rate(qbi.w2_wage_pct)
        .max(w2.mul_rate(qbi.w2_wage_and_ubia_pct) + ubia.mul_rate(qbi.ubia_pct));
    let excess = (tentative - wage_limit).floor_zero();
    let component = tentative - excess.mul_rate(fraction);

    QbiComponent {
        name: business.name.clone(),
        tentative: tentative.to_line(),
        wage_limit: wage_limit.to_line(),
        component: component.to_line(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakdown::{AgiLine, DeductionLine, DeductionSelection, ItemizedDetail};
    use crate::input::TaxReturnInput;
    use crate::testutil::{input_with, rules};
    use rust_decimal_macros::dec;

    fn run(input: &TaxReturnInput, agi: Money, deduction: Money) -> QbiLine {
        let rules = rules();
        let mut ctx = CalculationContext::new(input);
        ctx.commit_se_tax(crate::testutil::zero_se_line()).unwrap();
        ctx.commit_agi(AgiLine {
            total_income: agi,
            total_adjustments: Money::ZERO,
            agi,
        })
        .unwrap();
        ctx.commit_deductions(DeductionLine {
            standard_amount: deduction,
            itemized: ItemizedDetail {
                medical_allowed: Money::ZERO,
                salt_allowed: Money::ZERO,
                mortgage_allowed: Money::ZERO,
                charitable_allowed: Money::ZERO,
                charitable_carryforward: Money::ZERO,
                total: Money::ZERO,
            },
            selection: DeductionSelection::Standard,
            amount: deduction,
            reason: String::new(),
        })
        .unwrap();
        QualifiedBusinessIncomeStage
            .execute(&mut ctx, &rules)
            .unwrap();
        ctx.qbi(StageName::TaxableIncome).unwrap().clone()
    }

    fn business(income: i64, w2: i64, sstb: bool) -> QbiBusiness {
        QbiBusiness {
            name: "biz".into(),
            qualified_income: Money::from_dollars(income),
            w2_wages: Money::from_dollars(w2),
            ubia: Money::ZERO,
            sstb,
        }
    }

    #[test]
    fn below_band_ignores_wage_limitation() {
        let input = input_with(|i| {
            i.qbi_businesses = vec![business(100_000, 0, false)];
        });
        // Taxable income before QBI well below 197,300.
        let line = run(&input, Money::from_dollars(120_000), Money::from_dollars(15_750));
        assert_eq!(line.phase_in_fraction, Rate::ZERO);
        assert_eq!(line.components[0].component, Money::from_dollars(20_000));
        assert_eq!(line.deduction, Money::from_dollars(20_000));
    }

    #[test]
    fn above_band_binds_wage_limit_fully() {
        let input = input_with(|i| {
            i.qbi_businesses = vec![business(100_000, 10_000, false)];
        });
        let line = run(&input, Money::from_dollars(400_000), Money::from_dollars(15_750));
        assert_eq!(line.phase_in_fraction, Rate::ONE);
        // min(20,000, 50% of 10,000) = 5,000.
        assert_eq!(line.components[0].component, Money::from_dollars(5_000));
    }

    #[test]
    fn sstb_income_phases_to_zero_above_band() {
        let input = input_with(|i| {
            i.qbi_businesses = vec![business(100_000, 200_000, true)];
        });
        let line = run(&input, Money::from_dollars(400_000), Money::from_dollars(15_750));
        assert_eq!(line.components[0].component, Money::ZERO);
        assert_eq!(line.deduction, Money::ZERO);
    }

    #[test]
    fn mid_band_fraction_interpolates() {
        // Single band 197,300 to 247,300; TI 222,300 is the midpoint.
        let input = input_with(|i| {
            i.qbi_businesses = vec![business(100_000, 10_000, false)];
        });
        let line = run(
            &input,
            Money::from_dollars(238_050),
            Money::from_dollars(15_750),
        );
        assert_eq!(line.phase_in_fraction, Rate::new(dec!(0.5)));
        // 20,000 - 0.5 * (20,000 - 5,000) = 12,500.
        assert_eq!(line.components[0].component, Money::from_dollars(12_500));
    }

    #[test]
    fn deduction_continuous_at_band_edges() {
        // One cent of income across each edge moves the deduction by
        // well under a cent.
        let rules_set = rules();
        let band = rules_set.qbi.phase_in.get(levy_core::FilingStatus::Single);
        let std_ded = Money::from_dollars(15_750);
        for edge in [band.lower, band.upper] {
            let mut results = Vec::new();
            for delta in [Money::from_cents(-1), Money::ZERO, Money::from_cents(1)] {
                let input = input_with(|i| {
                    i.qbi_businesses = vec![business(100_000, 10_000, false)];
                });
                let line = run(&input, edge + std_ded + delta, std_ded);
                results.push(line.deduction);
            }
            let spread = (results[2] - results[0]).floor_zero()
                + (results[0] - results[2]).floor_zero();
            assert!(
                spread <= Money::from_cents(1),
                "discontinuity at {edge}: {results:?}"
            );
        }
    }

    #[test]
    fn cap_excludes_net_capital_gain() {
        let input = input_with(|i| {
            i.qbi_businesses = vec![business(100_000, 0, false)];
            i.income.qualified_dividends = Money::from_dollars(30_000);
            i.income.long_term_capital_gain = Money::from_dollars(50_000);
        });
        let line = run(&input, Money::from_dollars(110_000), Money::from_dollars(15_750));
        // TI pre-QBI 94,250; less 80,000 net capital gain = 14,250.
        // Cap 20% of that = 2,850, below the 20,000 tentative.
        assert_eq!(line.cap, Money::from_dollars(2_850));
        assert_eq!(line.deduction, Money::from_dollars(2_850));
    }

    #[test]
    fn short_term_losses_reduce_net_capital_gain() {
        let input = input_with(|i| {
            i.qbi_businesses = vec![business(50_000, 0, false)];
            i.income.long_term_capital_gain = Money::from_dollars(20_000);
            i.income.short_term_capital_gain = Money::from_dollars(-15_000);
        });
        let line = run(&input, Money::from_dollars(100_000), Money::from_dollars(15_750));
        // Net capital gain is 5,000; cap = 20% * (84,250 - 5,000).
        assert_eq!(line.cap, Money::from_dollars(15_850));
    }

    #[test]
    fn no_businesses_means_zero_deduction() {
        let input = input_with(|_| {});
        let line = run(&input, Money::from_dollars(80_000), Money::from_dollars(15_750));
        assert!(line.components.is_empty());
        assert_eq!(line.deduction, Money::ZERO);
    }
}
