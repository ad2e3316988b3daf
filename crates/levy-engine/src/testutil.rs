//! Shared fixtures for stage tests: a minimal single-filer 2025 return
//! and helpers that pre-commit the upstream lines a stage under test
//! depends on.

use chrono::NaiveDate;

use levy_core::{FilingStatus, Jurisdiction, Money, TaxYear};
use levy_rules::{federal_2025, JurisdictionRuleSet};

use crate::breakdown::{
    AgiLine, DeductionLine, DeductionSelection, ItemizedDetail, QbiLine, SeTaxLine,
};
use crate::context::CalculationContext;
use crate::input::TaxReturnInput;
use crate::stages::{Stage, TaxComputationStage};

/// The federal 2025 fixture.
pub(crate) fn rules() -> JurisdictionRuleSet {
    federal_2025().unwrap()
}

/// A minimal single-filer return, customized by `f`.
pub(crate) fn input_with(f: impl FnOnce(&mut TaxReturnInput)) -> TaxReturnInput {
    let mut input = TaxReturnInput {
        schema_version: 1,
        jurisdiction: Jurisdiction::new("US").unwrap(),
        tax_year: TaxYear::new(2025).unwrap(),
        filing_status: FilingStatus::Single,
        taxpayer_age_65: false,
        taxpayer_blind: false,
        spouse_age_65: false,
        spouse_blind: false,
        qualifying_children: 0,
        income: Default::default(),
        qbi_businesses: Vec::new(),
        other_adjustments: Money::ZERO,
        itemized: Default::default(),
        amt_preference_items: Money::ZERO,
        credits: Vec::new(),
        payments: Default::default(),
        as_of: NaiveDate::from_ymd_opt(2026, 4, 15).unwrap(),
    };
    f(&mut input);
    input
}

pub(crate) fn zero_se_line() -> SeTaxLine {
    SeTaxLine {
        net_earnings: Money::ZERO,
        social_security_portion: Money::ZERO,
        medicare_portion: Money::ZERO,
        total: Money::ZERO,
        half_deduction: Money::ZERO,
    }
}

fn zero_itemized() -> ItemizedDetail {
    ItemizedDetail {
        medical_allowed: Money::ZERO,
        salt_allowed: Money::ZERO,
        mortgage_allowed: Money::ZERO,
        charitable_allowed: Money::ZERO,
        charitable_carryforward: Money::ZERO,
        total: Money::ZERO,
    }
}

fn deduction_line(selection: DeductionSelection, amount: Money) -> DeductionLine {
    DeductionLine {
        standard_amount: amount,
        itemized: zero_itemized(),
        selection,
        amount,
        reason: String::new(),
    }
}

fn zero_qbi_line() -> QbiLine {
    QbiLine {
        phase_in_fraction: levy_core::Rate::ZERO,
        components: Vec::new(),
        pre_cap_total: Money::ZERO,
        cap: Money::ZERO,
        deduction: Money::ZERO,
    }
}

/// Context with stages 1-4 committed: zero SE tax, the given AGI,
/// a standard deduction of `deduction`, and a QBI deduction of `qbi`.
pub(crate) fn committed_context_through_qbi<'a>(
    input: &'a TaxReturnInput,
    agi: Money,
    deduction: Money,
    qbi: Money,
) -> CalculationContext<'a> {
    let mut ctx = CalculationContext::new(input);
    ctx.commit_se_tax(zero_se_line()).unwrap();
    ctx.commit_agi(AgiLine {
        total_income: agi,
        total_adjustments: Money::ZERO,
        agi,
    })
    .unwrap();
    ctx.commit_deductions(deduction_line(DeductionSelection::Standard, deduction))
        .unwrap();
    let mut qbi_line = zero_qbi_line();
    qbi_line.deduction = qbi;
    ctx.commit_qbi(qbi_line).unwrap();
    ctx
}

/// Context with stages 1-5 committed. The deduction amount is derived
/// as `agi - taxable_income` so AMT addback math lines up.
pub(crate) fn context_with_taxable_income<'a>(
    input: &'a TaxReturnInput,
    agi: Money,
    taxable_income: Money,
) -> CalculationContext<'a> {
    let mut ctx =
        committed_context_through_qbi(input, agi, (agi - taxable_income).floor_zero(), Money::ZERO);
    ctx.commit_taxable_income(taxable_income).unwrap();
    ctx
}

/// Context with stages 1-6 committed, the tax stage actually executed.
pub(crate) fn context_through_tax<'a>(
    input: &'a TaxReturnInput,
    agi: Money,
    taxable_income: Money,
) -> CalculationContext<'a> {
    let mut ctx = context_with_taxable_income(input, agi, taxable_income);
    TaxComputationStage.execute(&mut ctx, &rules()).unwrap();
    ctx
}

/// Like [`context_through_tax`] but with an itemized deduction of
/// `itemized_total` committed instead of a standard one.
pub(crate) fn context_through_tax_itemized<'a>(
    input: &'a TaxReturnInput,
    agi: Money,
    taxable_income: Money,
    itemized_total: Money,
) -> CalculationContext<'a> {
    let mut ctx = CalculationContext::new(input);
    ctx.commit_se_tax(zero_se_line()).unwrap();
    ctx.commit_agi(AgiLine {
        total_income: agi,
        total_adjustments: Money::ZERO,
        agi,
    })
    .unwrap();
    let mut line = deduction_line(DeductionSelection::Itemized, itemized_total);
    line.itemized.total = itemized_total;
    line.standard_amount = Money::ZERO;
    ctx.commit_deductions(line).unwrap();
    ctx.commit_qbi(zero_qbi_line()).unwrap();
    ctx.commit_taxable_income(taxable_income).unwrap();
    TaxComputationStage.execute(&mut ctx, &rules()).unwrap();
    ctx
}
