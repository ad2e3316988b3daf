//! Stage 1: self-employment tax.
//!
//! Net SE profit times the net-earnings factor gives the tax base. The
//! Social Security portion is capped at the wage base less W-2 wages
//! (the base is shared); the Medicare portion is uncapped. Half the tax
//! becomes an above-the-line adjustment for the AGI stage.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::SeTaxLine;
use crate::context::CalculationContext;
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct SelfEmploymentTaxStage;

impl Stage for SelfEmploymentTaxStage {
    fn name(&self) -> StageName {
        StageName::SelfEmploymentTax
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let income = &ctx.input().income;
        let net_profit = income.self_employment_net_profit;
        let se = &rules.se_tax;

        let line = if net_profit.is_positive() {
            let net_earnings = net_profit.mul_rate(se.net_earnings_factor);
            // W-2 wages consume the wage base first.
            let base_remaining = (se.social_security_wage_base - income.wages).floor_zero();
            let ss_portion = net_earnings
                .min(base_remaining)
                .mul_rate(se.social_security_rate)
                .to_line();
            let medicare_portion = net_earnings.mul_rate(se.medicare_rate).to_line();
            let total = ss_portion + medicare_portion;
            let half_deduction = half(total).to_line();
            SeTaxLine {
                net_earnings: net_earnings.to_line(),
                social_security_portion: ss_portion,
                medicare_portion,
                total,
                half_deduction,
            }
        } else {
            SeTaxLine {
                net_earnings: Money::ZERO,
                social_security_portion: Money::ZERO,
                medicare_portion: Money::ZERO,
                total: Money::ZERO,
                half_deduction: Money::ZERO,
            }
        };

        debug!(total = %line.total, "self-employment tax computed");
        let record = StageRecord {
            input_snapshot: json!({
                "self_employment_net_profit": net_profit,
                "wages": income.wages,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_se_tax(line)?;
        Ok(record)
    }
}

fn half(amount: Money) -> Money {
    amount.mul_rate(levy_core::Rate::new(rust_decimal::Decimal::new(5, 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{input_with, rules};
    use rust_decimal_macros::dec;

    #[test]
    fn zero_profit_is_all_zero() {
        let input = input_with(|_| {});
        let mut ctx = CalculationContext::new(&input);
        SelfEmploymentTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.se_tax(StageName::AdjustedGrossIncome).unwrap();
        assert_eq!(line.total, Money::ZERO);
        assert_eq!(line.half_deduction, Money::ZERO);
    }

    #[test]
    fn negative_profit_owes_nothing() {
        let input = input_with(|i| {
            i.income.self_employment_net_profit = Money::from_dollars(-12_000);
        });
        let mut ctx = CalculationContext::new(&input);
        SelfEmploymentTaxStage.execute(&mut ctx, &rules()).unwrap();
        assert_eq!(
            ctx.se_tax(StageName::AdjustedGrossIncome).unwrap().total,
            Money::ZERO
        );
    }

    #[test]
    fn moderate_profit_below_wage_base() {
        // 100,000 * 0.9235 = 92,350 net earnings.
        // SS: 92,350 * 12.4% = 11,451.40; Medicare: 92,350 * 2.9% = 2,678.15.
        let input = input_with(|i| {
            i.income.self_employment_net_profit = Money::from_dollars(100_000);
        });
        let mut ctx = CalculationContext::new(&input);
        SelfEmploymentTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.se_tax(StageName::AdjustedGrossIncome).unwrap();
        assert_eq!(line.social_security_portion, Money::from_decimal(dec!(11451.40)));
        assert_eq!(line.medicare_portion, Money::from_decimal(dec!(2678.15)));
        assert_eq!(line.total, Money::from_decimal(dec!(14129.55)));
        assert_eq!(line.half_deduction, Money::from_decimal(dec!(7064.78)));
    }

    #[test]
    fn wages_consume_the_social_security_base() {
        // Wage base 176,100; wages 150,000 leave 26,100 of SS room.
        let input = input_with(|i| {
            i.income.wages = Money::from_dollars(150_000);
            i.income.self_employment_net_profit = Money::from_dollars(100_000);
        });
        let mut ctx = CalculationContext::new(&input);
        SelfEmploymentTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.se_tax(StageName::AdjustedGrossIncome).unwrap();
        // SS: 26,100 * 12.4% = 3,236.40. Medicare uncapped: 2,678.15.
        assert_eq!(line.social_security_portion, Money::from_decimal(dec!(3236.40)));
        assert_eq!(line.medicare_portion, Money::from_decimal(dec!(2678.15)));
    }

    #[test]
    fn wages_above_base_leave_medicare_only() {
        let input = input_with(|i| {
            i.income.wages = Money::from_dollars(200_000);
            i.income.self_employment_net_profit = Money::from_dollars(50_000);
        });
        let mut ctx = CalculationContext::new(&input);
        SelfEmploymentTaxStage.execute(&mut ctx, &rules()).unwrap();
        let line = ctx.se_tax(StageName::AdjustedGrossIncome).unwrap();
        assert_eq!(line.social_security_portion, Money::ZERO);
        assert!(line.medicare_portion.is_positive());
    }
}
