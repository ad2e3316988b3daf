//! # Tax Return Input
//!
//! [`TaxReturnInput`] is the read-only snapshot a calculation run starts
//! from. It is versioned, carries every fact the nine stages consult,
//! and names an explicit `as_of` date so penalty math never reaches for
//! an ambient clock. The pipeline never mutates it; stages read from it
//! and commit derived values to the calculation context.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use levy_core::{FilingStatus, Jurisdiction, Money, TaxYear};
use levy_rules::CreditKind;

/// Input schema versions this engine build accepts.
pub const SUPPORTED_SCHEMA_VERSIONS: [u32; 1] = [1];

/// Income items as reported, before any derivation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IncomeItems {
    /// W-2 wages (also social-security wages for the SE wage-base share).
    #[serde(default)]
    pub wages: Money,
    /// Taxable interest.
    #[serde(default)]
    pub taxable_interest: Money,
    /// Total ordinary dividends, including the qualified subset.
    #[serde(default)]
    pub ordinary_dividends: Money,
    /// Qualified dividends, taxed at preferential rates. A subset of
    /// `ordinary_dividends`.
    #[serde(default)]
    pub qualified_dividends: Money,
    /// Net short-term capital gain or loss.
    #[serde(default)]
    pub short_term_capital_gain: Money,
    /// Net long-term capital gain or loss.
    #[serde(default)]
    pub long_term_capital_gain: Money,
    /// Net profit from self-employment (may be negative).
    #[serde(default)]
    pub self_employment_net_profit: Money,
    /// Other taxable income not broken out above.
    #[serde(default)]
    pub other_income: Money,
}

/// One qualified trade or business for the QBI deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbiBusiness {
    /// Business label, echoed into the breakdown.
    pub name: String,
    /// Qualified business income.
    pub qualified_income: Money,
    /// W-2 wages the business paid.
    #[serde(default)]
    pub w2_wages: Money,
    /// Unadjusted basis immediately after acquisition of qualified
    /// property.
    #[serde(default)]
    pub ubia: Money,
    /// Specified service trade or business flag.
    #[serde(default)]
    pub sstb: bool,
}

/// Itemized deduction candidates as reported. The deductions stage
/// applies floors, caps, and limits; these are raw amounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemizedCandidates {
    /// Unreimbursed medical expenses.
    #[serde(default)]
    pub medical_expenses: Money,
    /// State and local taxes paid.
    #[serde(default)]
    pub state_local_taxes: Money,
    /// Home mortgage interest paid.
    #[serde(default)]
    pub mortgage_interest: Money,
    /// Acquisition debt behind the mortgage interest. Required when
    /// `mortgage_interest` is nonzero.
    #[serde(default)]
    pub mortgage_acquisition_debt: Money,
    /// Cash charitable contributions.
    #[serde(default)]
    pub charitable_cash: Money,
}

/// A prior-year unused credit amount carried into this year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carryforward {
    /// The tax year the unused amount originated in.
    pub origin_year: u16,
    /// The unused amount.
    pub amount: Money,
}

/// One credit claimed on the return. Application order comes from the
/// rule set's ordering table, never from claim order here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditClaimInput {
    /// Which credit is claimed.
    pub kind: CreditKind,
    /// Gross current-year amount before phaseout.
    pub gross_amount: Money,
    /// Prior-year carryforwards, oldest first.
    #[serde(default)]
    pub carryforwards: Vec<Carryforward>,
}

/// Tax payments already made toward this year's liability.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payments {
    /// Tax withheld at source. Treated as paid evenly across quarters.
    #[serde(default)]
    pub withholding: Money,
    /// Estimated payments, one per quarterly installment.
    #[serde(default)]
    pub estimated: [Money; 4],
    /// Prior-year total tax, for the safe-harbor test.
    #[serde(default)]
    pub prior_year_tax: Money,
    /// Prior-year AGI, for the high-income safe-harbor fraction.
    #[serde(default)]
    pub prior_year_agi: Money,
}

/// The complete, versioned calculation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxReturnInput {
    /// Input schema version; see [`SUPPORTED_SCHEMA_VERSIONS`].
    pub schema_version: u32,
    /// The jurisdiction whose rules govern this return.
    pub jurisdiction: Jurisdiction,
    /// The tax year being calculated.
    pub tax_year: TaxYear,
    /// Filing status.
    pub filing_status: FilingStatus,
    /// Taxpayer is 65 or older.
    #[serde(default)]
    pub taxpayer_age_65: bool,
    /// Taxpayer is blind.
    #[serde(default)]
    pub taxpayer_blind: bool,
    /// Spouse is 65 or older. Joint statuses only.
    #[serde(default)]
    pub spouse_age_65: bool,
    /// Spouse is blind. Joint statuses only.
    #[serde(default)]
    pub spouse_blind: bool,
    /// Number of qualifying children for child-related credits.
    #[serde(default)]
    pub qualifying_children: u32,
    /// Income items.
    #[serde(default)]
    pub income: IncomeItems,
    /// Qualified businesses for the QBI deduction.
    #[serde(default)]
    pub qbi_businesses: Vec<QbiBusiness>,
    /// Above-the-line adjustments other than the half-SE-tax deduction,
    /// which the pipeline derives itself.
    #[serde(default)]
    pub other_adjustments: Money,
    /// Itemized deduction candidates.
    #[serde(default)]
    pub itemized: ItemizedCandidates,
    /// AMT preference items (total addback).
    #[serde(default)]
    pub amt_preference_items: Money,
    /// Credits claimed.
    #[serde(default)]
    pub credits: Vec<CreditClaimInput>,
    /// Payments already made.
    #[serde(default)]
    pub payments: Payments,
    /// The date the calculation is performed as of. Drives penalty
    /// accrual; there is no ambient "today".
    pub as_of: NaiveDate,
}

impl TaxReturnInput {
    /// The count of additional-standard-deduction occurrences
    /// (age 65 and blindness, taxpayer and spouse).
    pub fn additional_deduction_count(&self) -> u32 {
        let mut n = 0;
        for flag in [
            self.taxpayer_age_65,
            self.taxpayer_blind,
            self.spouse_age_65,
            self.spouse_blind,
        ] {
            if flag {
                n += 1;
            }
        }
        n
    }
}
