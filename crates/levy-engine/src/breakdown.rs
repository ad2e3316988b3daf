//! # Calculation Breakdown
//!
//! The line-item output of a run. Each stage commits one `*Line` struct;
//! the pipeline assembles them into a [`CalculationBreakdown`] after the
//! final stage. Every money field is already rounded to a reportable
//! line, so serializing the breakdown twice for the same input and rule
//! version yields byte-identical JSON.

use serde::{Deserialize, Serialize};

use levy_core::{FilingStatus, Jurisdiction, Money, Rate, RunId, TaxYear};
use levy_rules::CreditKind;

use crate::input::IncomeItems;

// ---------------------------------------------------------------------------
// Per-stage lines
// ---------------------------------------------------------------------------

/// Self-employment tax detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeTaxLine {
    /// Net SE profit after the net-earnings factor.
    pub net_earnings: Money,
    /// Social Security portion, capped at the remaining wage base.
    pub social_security_portion: Money,
    /// Medicare portion, uncapped.
    pub medicare_portion: Money,
    /// Total SE tax.
    pub total: Money,
    /// Half of the SE tax, deducted above the line.
    pub half_deduction: Money,
}

/// Adjusted-gross-income detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgiLine {
    /// Sum of all income items.
    pub total_income: Money,
    /// Above-the-line adjustments, including the half-SE-tax deduction.
    pub total_adjustments: Money,
    /// AGI. May be negative (net operating loss); not floored here.
    pub agi: Money,
}

/// Which deduction the return takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionSelection {
    Standard,
    Itemized,
}

/// Itemized deduction components after floors, caps, and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemizedDetail {
    /// Medical expenses above the AGI floor.
    pub medical_allowed: Money,
    /// State and local taxes after the cap.
    pub salt_allowed: Money,
    /// Mortgage interest after acquisition-debt scaling.
    pub mortgage_allowed: Money,
    /// Charitable cash after the AGI ceiling.
    pub charitable_allowed: Money,
    /// Charitable excess carried to the following year.
    pub charitable_carryforward: Money,
    /// Total allowed itemized deduction.
    pub total: Money,
}

/// Deduction-stage detail: standard vs itemized and the choice made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    /// Standard deduction including age-65/blindness additions.
    pub standard_amount: Money,
    /// Itemized components and total.
    pub itemized: ItemizedDetail,
    /// The selected deduction.
    pub selection: DeductionSelection,
    /// The amount actually deducted.
    pub amount: Money,
    /// Why this deduction was selected.
    pub reason: String,
}

/// One business's QBI component after limitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbiComponent {
    /// Business label from the input.
    pub name: String,
    /// 20% of (phase-adjusted) qualified income.
    pub tentative: Money,
    /// Greater of the W-2 wage limits.
    pub wage_limit: Money,
    /// Component after the phased-in limitation.
    pub component: Money,
}

/// QBI-deduction detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbiLine {
    /// Phase-in fraction of the wage/basis limitation, 0 below the band
    /// and 1 above it.
    pub phase_in_fraction: Rate,
    /// Per-business components.
    pub components: Vec<QbiComponent>,
    /// Sum of components before the overall cap.
    pub pre_cap_total: Money,
    /// 20% of (taxable income before QBI minus net capital gain).
    pub cap: Money,
    /// The QBI deduction taken.
    pub deduction: Money,
}

/// Tax-computation detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    /// Taxable income taxed at ordinary rates.
    pub ordinary_taxable: Money,
    /// Tax from the ordinary schedule.
    pub ordinary_tax: Money,
    /// Income taxed at preferential rates, stacked on ordinary.
    pub preferential_income: Money,
    /// Tax on the preferential slice.
    pub preferential_tax: Money,
    /// Net investment income subject to the surtax.
    pub net_investment_income: Money,
    /// Net-investment-income surtax.
    pub niit: Money,
    /// Ordinary plus preferential tax (surtax excluded).
    pub regular_tax: Money,
}

/// Alternative-minimum-tax detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmtLine {
    /// Alternative minimum taxable income.
    pub amti: Money,
    /// Exemption after phaseout.
    pub exemption: Money,
    /// Tentative minimum tax.
    pub tentative_minimum_tax: Money,
    /// AMT owed on top of regular tax. Zero when TMT does not exceed it.
    pub amt: Money,
}

/// One credit's application record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditClaim {
    /// Which credit.
    pub kind: CreditKind,
    /// Refundable per the ordering table.
    pub refundable: bool,
    /// Current-year gross plus usable carryforwards, before phaseout.
    pub gross: Money,
    /// Amount after income phaseout.
    pub phaseout_adjusted: Money,
    /// Amount actually applied against liability.
    pub applied: Money,
    /// Unused amount carried to the following year.
    pub carryforward_remaining: Money,
    /// Carryforward amounts that expired unused this year.
    pub expired: Money,
}

/// Credits-stage detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLine {
    /// Regular tax + AMT + surtax, the liability credits apply against.
    pub pre_credit_tax: Money,
    /// Per-credit application records, in application order.
    pub claims: Vec<CreditClaim>,
    /// Total nonrefundable amount applied. Never exceeds
    /// `pre_credit_tax`.
    pub nonrefundable_applied: Money,
    /// Total refundable amount applied, uncapped.
    pub refundable_applied: Money,
    /// Liability after credits. Negative means a net refund.
    pub tax_after_credits: Money,
}

/// One quarter's underpayment-interest accrual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterPenalty {
    /// Installment number, 1-4.
    pub quarter: u8,
    /// Cumulative underpayment outstanding during this period.
    pub underpayment: Money,
    /// Days the underpayment was outstanding.
    pub days: i64,
    /// Simple interest accrued (unrounded; the penalty total is the
    /// reportable line).
    pub interest: Money,
}

/// Payments, safe harbor, and penalty detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentsLine {
    /// Withholding plus estimated payments.
    pub total_payments: Money,
    /// Required annual payment under the smaller safe-harbor threshold.
    pub required_annual_payment: Money,
    /// Whether payments met the safe harbor (or the balance was de
    /// minimis), so no penalty applies.
    pub safe_harbor_met: bool,
    /// Per-quarter accrual detail. Empty when no penalty applies.
    pub quarters: Vec<QuarterPenalty>,
    /// Underpayment penalty.
    pub penalty: Money,
    /// Final liability for the year, floored at zero.
    pub total_tax: Money,
    /// Positive: balance due (including penalty). Negative: refund.
    pub refund_or_due: Money,
}

// ---------------------------------------------------------------------------
// Assembled breakdown
// ---------------------------------------------------------------------------

/// The complete, immutable line-item result of one calculation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationBreakdown {
    /// The run that produced this breakdown.
    pub run_id: RunId,
    /// Jurisdiction calculated under.
    pub jurisdiction: Jurisdiction,
    /// Tax year calculated.
    pub tax_year: TaxYear,
    /// Filing status of the return.
    pub filing_status: FilingStatus,
    /// Rule-set version every stage computed under.
    pub rule_version: String,
    /// Income items as input.
    pub income: IncomeItems,
    /// Stage 1: self-employment tax.
    pub se_tax: SeTaxLine,
    /// Stage 2: adjusted gross income.
    pub agi: AgiLine,
    /// Stage 3: deductions.
    pub deductions: DeductionLine,
    /// Stage 4: QBI deduction.
    pub qbi: QbiLine,
    /// Stage 5: taxable income, floored at zero.
    pub taxable_income: Money,
    /// Stage 6: regular tax components.
    pub tax: TaxLine,
    /// Stage 7: alternative minimum tax.
    pub amt: AmtLine,
    /// Stage 8: credits.
    pub credits: CreditLine,
    /// Stage 9: payments and penalty.
    pub payments: PaymentsLine,
    /// Final liability, floored at zero.
    pub total_tax: Money,
    /// Positive balance due or negative refund, penalty included.
    pub refund_or_due: Money,
    /// Total tax over total income; zero when income is not positive.
    pub effective_rate: Rate,
    /// Marginal ordinary rate at the last taxable dollar.
    pub marginal_rate: Rate,
    /// Non-fatal observations accumulated across stages.
    pub warnings: Vec<String>,
}
