//! # Credit Ordering Engine
//!
//! Stage 8 delegates here. Credits apply in the rule set's table order:
//! all nonrefundable rows first, each capped at the liability still
//! remaining, then refundable rows without a cap, which can push the
//! net tax negative. Carryforward amounts are a FIFO queue per credit:
//! the oldest prior-year amount is consumed first, the current year
//! last, and anything outside its carryforward window expires.
//!
//! Invariant: the cumulative nonrefundable amount applied never exceeds
//! the pre-credit liability.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, StageName};
use levy_rules::{CreditRule, JurisdictionRuleSet};

use crate::breakdown::{CreditClaim, CreditLine};
use crate::context::CalculationContext;
use crate::input::{CreditClaimInput, TaxReturnInput};
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct CreditsStage;

impl Stage for CreditsStage {
    fn name(&self) -> StageName {
        StageName::Credits
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let regular_tax = ctx.tax(self.name())?.regular_tax;
        let niit = ctx.tax(self.name())?.niit;
        let amt = ctx.amt(self.name())?.amt;
        let agi = ctx.agi(self.name())?.agi;
        let input = ctx.input();

        let pre_credit_tax = regular_tax + niit + amt;
        let line = apply_credits(pre_credit_tax, agi, input, rules);

        debug!(
            pre_credit = %line.pre_credit_tax,
            after = %line.tax_after_credits,
            "credits applied"
        );
        let record = StageRecord {
            input_snapshot: json!({
                "pre_credit_tax": pre_credit_tax,
                "agi": agi,
                "credit_claims": input.credits,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_credits(line)?;
        Ok(record)
    }
}

/// Apply every claimed credit in table order against `pre_credit_tax`.
pub(crate) fn apply_credits(
    pre_credit_tax: Money,
    agi: Money,
    input: &TaxReturnInput,
    rules: &JurisdictionRuleSet,
) -> CreditLine {
    let mut claims = Vec::new();
    let mut remaining = pre_credit_tax;
    let mut nonrefundable_applied = Money::ZERO;
    let mut refundable_applied = Money::ZERO;

    // Nonrefundable rows first, then refundable, each in table order.
    for refundable_pass in [false, true] {
        for rule in rules
            .credit_ordering
            .iter()
            .filter(|r| r.refundable == refundable_pass)
        {
            let Some(claim_input) = input.credits.iter().find(|c| c.kind == rule.kind) else {
                continue;
            };
            let claim = apply_one(
                claim_input,
                rule,
                agi,
                remaining,
                input.tax_year.as_u16(),
                input.filing_status,
            );
            if rule.refundable {
                refundable_applied += claim.applied;
            } else {
                remaining = (remaining - claim.applied).floor_zero();
                nonrefundable_applied += claim.applied;
            }
            claims.push(claim);
        }
    }

    CreditLine {
        pre_credit_tax,
        claims,
        nonrefundable_applied,
        refundable_applied,
        tax_after_credits: pre_credit_tax - nonrefundable_applied - refundable_applied,
    }
}

/// Resolve one claim against its ordering-table row.
fn apply_one(
    claim: &CreditClaimInput,
    rule: &CreditRule,
    agi: Money,
    remaining: Money,
    tax_year: u16,
    status: levy_core::FilingStatus,
) -> CreditClaim {
    // Split carryforwards into usable and expired, oldest first.
    let window = u16::from(rule.carryforward_years);
    let mut usable: Vec<(u16, Money)> = Vec::new();
    let mut expired = Money::ZERO;
    for cf in &claim.carryforwards {
        let age = tax_year.saturating_sub(cf.origin_year);
        if cf.origin_year < tax_year && age <= window {
            usable.push((cf.origin_year, cf.amount));
        } else {
            expired += cf.amount;
        }
    }
    usable.sort_by_key(|(year, _)| *year);

    let adjusted_current = match &rule.phaseout {
        Some(per_status) => per_status.get(status).reduce(claim.gross_amount, agi),
        None => claim.gross_amount,
    };

    let gross: Money =
        claim.gross_amount + usable.iter().map(|(_, amount)| *amount).sum::<Money>();
    let phaseout_adjusted: Money =
        adjusted_current + usable.iter().map(|(_, amount)| *amount).sum::<Money>();

    // Consume FIFO: oldest carryforwards first, current year last.
    let cap = if rule.refundable {
        phaseout_adjusted
    } else {
        phaseout_adjusted.min(remaining)
    };
    let mut to_apply = cap;
    let mut carryforward_remaining = Money::ZERO;
    for (origin_year, amount) in usable {
        let used = amount.min(to_apply);
        to_apply -= used;
        let unused = amount - used;
        if unused.is_positive() {
            // Still inside the window next year?
            if (tax_year + 1).saturating_sub(origin_year) <= window {
                carryforward_remaining += unused;
            } else {
                expired += unused;
            }
        }
    }
    let current_used = adjusted_current.min(to_apply);
    let current_unused = adjusted_current - current_used;
    if current_unused.is_positive() && window >= 1 {
        carryforward_remaining += current_unused;
    }

    CreditClaim {
        kind: claim.kind,
        refundable: rule.refundable,
        gross: gross.to_line(),
        phaseout_adjusted: phaseout_adjusted.to_line(),
        applied: cap.to_line(),
        carryforward_remaining: carryforward_remaining.to_line(),
        expired: expired.to_line(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Carryforward, CreditClaimInput};
    use crate::testutil::{input_with, rules};
    use levy_core::FilingStatus;
    use levy_rules::CreditKind;
    use proptest::prelude::*;

    fn claim(kind: CreditKind, gross: i64) -> CreditClaimInput {
        CreditClaimInput {
            kind,
            gross_amount: Money::from_dollars(gross),
            carryforwards: Vec::new(),
        }
    }

    #[test]
    fn nonrefundable_capped_at_liability() {
        let input = input_with(|i| {
            i.credits = vec![claim(CreditKind::ForeignTax, 5_000)];
        });
        let line = apply_credits(
            Money::from_dollars(3_000),
            Money::from_dollars(40_000),
            &input,
            &rules(),
        );
        let ftc = &line.claims[0];
        assert_eq!(ftc.applied, Money::from_dollars(3_000));
        assert_eq!(ftc.carryforward_remaining, Money::from_dollars(2_000));
        assert_eq!(line.tax_after_credits, Money::ZERO);
    }

    #[test]
    fn refundable_can_drive_tax_negative() {
        let input = input_with(|i| {
            i.credits = vec![claim(CreditKind::EarnedIncome, 2_500)];
        });
        let line = apply_credits(
            Money::from_dollars(1_000),
            Money::from_dollars(20_000),
            &input,
            &rules(),
        );
        assert_eq!(line.refundable_applied, Money::from_dollars(2_500));
        assert_eq!(line.tax_after_credits, Money::from_dollars(-1_500));
    }

    #[test]
    fn table_order_wins_over_claim_order() {
        // Claims listed saver-first still apply foreign-tax first.
        let input = input_with(|i| {
            i.credits = vec![
                claim(CreditKind::RetirementSaver, 1_000),
                claim(CreditKind::ForeignTax, 1_000),
            ];
        });
        let line = apply_credits(
            Money::from_dollars(1_500),
            Money::from_dollars(40_000),
            &input,
            &rules(),
        );
        assert_eq!(line.claims[0].kind, CreditKind::ForeignTax);
        assert_eq!(line.claims[0].applied, Money::from_dollars(1_000));
        // Saver gets only the remaining 500.
        assert_eq!(line.claims[1].applied, Money::from_dollars(500));
    }

    #[test]
    fn carryforwards_consumed_oldest_first() {
        let input = input_with(|i| {
            i.credits = vec![CreditClaimInput {
                kind: CreditKind::ForeignTax,
                gross_amount: Money::from_dollars(1_000),
                carryforwards: vec![
                    Carryforward {
                        origin_year: 2023,
                        amount: Money::from_dollars(400),
                    },
                    Carryforward {
                        origin_year: 2021,
                        amount: Money::from_dollars(300),
                    },
                ],
            }];
        });
        let line = apply_credits(
            Money::from_dollars(500),
            Money::from_dollars(40_000),
            &input,
            &rules(),
        );
        let ftc = &line.claims[0];
        // 300 (2021) + 200 of the 2023 amount; 200 + 1,000 remain.
        assert_eq!(ftc.applied, Money::from_dollars(500));
        assert_eq!(ftc.carryforward_remaining, Money::from_dollars(1_200));
    }

    #[test]
    fn expired_carryforwards_are_not_applied() {
        // Foreign tax carries 10 years; a 2014 amount is dead in 2025.
        let input = input_with(|i| {
            i.credits = vec![CreditClaimInput {
                kind: CreditKind::ForeignTax,
                gross_amount: Money::ZERO,
                carryforwards: vec![Carryforward {
                    origin_year: 2014,
                    amount: Money::from_dollars(900),
                }],
            }];
        });
        let line = apply_credits(
            Money::from_dollars(5_000),
            Money::from_dollars(40_000),
            &input,
            &rules(),
        );
        let ftc = &line.claims[0];
        assert_eq!(ftc.applied, Money::ZERO);
        assert_eq!(ftc.expired, Money::from_dollars(900));
    }

    #[test]
    fn child_tax_credit_phases_out_with_agi() {
        // Single threshold 200,000; 10,001 over is 11 steps of 50 = 550.
        let input = input_with(|i| {
            i.filing_status = FilingStatus::Single;
            i.credits = vec![claim(CreditKind::ChildTax, 2_000)];
        });
        let line = apply_credits(
            Money::from_dollars(30_000),
            Money::from_decimal(rust_decimal_macros::dec!(210001)),
            &input,
            &rules(),
        );
        assert_eq!(line.claims[0].phaseout_adjusted, Money::from_dollars(1_450));
    }

    #[test]
    fn unknown_claims_are_simply_not_in_the_table_order() {
        let input = input_with(|_| {});
        let line = apply_credits(
            Money::from_dollars(1_000),
            Money::from_dollars(40_000),
            &input,
            &rules(),
        );
        assert!(line.claims.is_empty());
        assert_eq!(line.tax_after_credits, Money::from_dollars(1_000));
    }

    proptest! {
        // The load-bearing invariant: however many credits are claimed
        // at whatever sizes, nonrefundable application never exceeds
        // the pre-credit liability.
        #[test]
        fn nonrefundable_never_exceeds_liability(
            liability_cents in 0i64..50_000_00,
            ftc in 0i64..10_000,
            care in 0i64..10_000,
            education in 0i64..10_000,
            saver in 0i64..10_000,
            ctc in 0i64..10_000,
        ) {
            let input = input_with(|i| {
                i.credits = vec![
                    claim(CreditKind::ForeignTax, ftc),
                    claim(CreditKind::ChildAndDependentCare, care),
                    claim(CreditKind::Education, education),
                    claim(CreditKind::RetirementSaver, saver),
                    claim(CreditKind::ChildTax, ctc),
                ];
            });
            let pre = Money::from_cents(liability_cents);
            let line = apply_credits(pre, Money::from_dollars(50_000), &input, &rules());
            prop_assert!(line.nonrefundable_applied <= pre);
            prop_assert!(!line.nonrefundable_applied.is_negative());
        }
    }
}
