//! Credit ordering, phaseout, and refundability through the pipeline.

use levy_audit::AuditKey;
use levy_core::{Money, RunId};
use levy_engine::{CreditClaimInput, Pipeline, TaxReturnInput};
use levy_rules::{federal_2025, CreditKind};
use proptest::prelude::*;
use rust_decimal_macros::dec;

fn key() -> AuditKey {
    AuditKey::from_bytes([5u8; 32])
}

fn base_input() -> TaxReturnInput {
    serde_json::from_str(
        r#"{
            "schema_version": 1,
            "jurisdiction": "US",
            "tax_year": 2025,
            "filing_status": "single",
            "as_of": "2026-04-15"
        }"#,
    )
    .unwrap()
}

#[test]
fn child_tax_credit_phases_out_above_the_threshold() {
    let rules = federal_2025().unwrap();
    let mut input = base_input();
    // AGI one dollar past 210,000: eleven 1,000-steps over the 200,000
    // threshold, 50 each, so 2,000 gross shrinks to 1,450.
    input.income.wages = Money::from_dollars(210_001);
    input.credits.push(CreditClaimInput {
        kind: CreditKind::ChildTax,
        gross_amount: Money::from_dollars(2_000),
        carryforwards: Vec::new(),
    });

    let outcome = Pipeline::execute(&input, &rules, key(), RunId::new()).unwrap();
    let credits = &outcome.breakdown.credits;

    assert_eq!(credits.pre_credit_tax, Money::from_decimal(dec!(39467.24)));
    let claim = &credits.claims[0];
    assert_eq!(claim.gross, Money::from_dollars(2_000));
    assert_eq!(claim.phaseout_adjusted, Money::from_decimal(dec!(1450)));
    assert_eq!(claim.applied, Money::from_decimal(dec!(1450)));
    assert_eq!(credits.tax_after_credits, Money::from_decimal(dec!(38017.24)));
    assert_eq!(outcome.breakdown.total_tax, Money::from_decimal(dec!(38017.24)));
}

#[test]
fn refundable_credit_overflows_into_the_refund() {
    let rules = federal_2025().unwrap();
    let mut input = base_input();
    // Wages below the standard deduction: zero liability, but the
    // earned income credit is refundable and flows out whole.
    input.income.wages = Money::from_dollars(12_000);
    input.credits.push(CreditClaimInput {
        kind: CreditKind::EarnedIncome,
        gross_amount: Money::from_dollars(5_000),
        carryforwards: Vec::new(),
    });

    let outcome = Pipeline::execute(&input, &rules, key(), RunId::new()).unwrap();
    let b = &outcome.breakdown;

    assert_eq!(b.taxable_income, Money::ZERO);
    assert_eq!(b.credits.refundable_applied, Money::from_dollars(5_000));
    assert_eq!(b.total_tax, Money::ZERO);
    assert_eq!(b.refund_or_due, Money::from_dollars(-5_000));
}

#[test]
fn nonrefundable_portion_caps_at_liability_refundable_does_not() {
    let rules = federal_2025().unwrap();
    let mut input = base_input();
    input.income.wages = Money::from_dollars(30_000);
    input.credits.push(CreditClaimInput {
        kind: CreditKind::ChildTax,
        gross_amount: Money::from_dollars(2_000),
        carryforwards: Vec::new(),
    });
    input.credits.push(CreditClaimInput {
        kind: CreditKind::AdditionalChildTax,
        gross_amount: Money::from_dollars(1_700),
        carryforwards: Vec::new(),
    });

    let outcome = Pipeline::execute(&input, &rules, key(), RunId::new()).unwrap();
    let b = &outcome.breakdown;

    // 14,250 taxable: 1,192.50 + 12% of 2,325 = 1,471.50 of liability.
    assert_eq!(b.credits.pre_credit_tax, Money::from_decimal(dec!(1471.50)));
    assert_eq!(b.credits.nonrefundable_applied, Money::from_decimal(dec!(1471.50)));
    assert_eq!(b.credits.refundable_applied, Money::from_dollars(1_700));
    assert_eq!(b.total_tax, Money::ZERO);
    assert_eq!(b.refund_or_due, Money::from_dollars(-1_700));
}

proptest! {
    // Whatever is claimed, nonrefundable credits never push the final
    // liability below zero, and the run stays auditable.
    #[test]
    fn nonrefundable_claims_never_produce_negative_tax(
        wages in 0i64..400_000,
        gross in 0i64..50_000,
    ) {
        let rules = federal_2025().unwrap();
        let mut input = base_input();
        input.income.wages = Money::from_dollars(wages);
        input.credits.push(CreditClaimInput {
            kind: CreditKind::ForeignTax,
            gross_amount: Money::from_dollars(gross),
            carryforwards: Vec::new(),
        });

        let outcome = Pipeline::execute(&input, &rules, key(), RunId::new()).unwrap();
        prop_assert!(outcome.breakdown.total_tax >= Money::ZERO);
        prop_assert!(outcome.breakdown.credits.tax_after_credits >= Money::ZERO);
        prop_assert!(outcome.chain.verify(&key()).is_ok());
    }
}
