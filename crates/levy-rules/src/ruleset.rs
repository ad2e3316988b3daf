//! # Jurisdiction Rule Set
//!
//! [`JurisdictionRuleSet`] is the immutable, versioned rule table for one
//! (jurisdiction, tax year) pair. Every number a pipeline stage consults
//! lives here as declarative data — bracket bounds, deduction amounts,
//! phaseout curves, the credit-ordering table, safe-harbor percentages.
//! State-specific quirks are expressed as different data, never as
//! branching code in the stages.
//!
//! ## Completeness
//!
//! [`JurisdictionRuleSet::validate`] runs at load time and rejects any
//! rule set with a missing filing status, a malformed bracket table, an
//! inverted phaseout band, or a duplicate entry in the credit-ordering
//! table. A rule set that loads is complete; stages never re-check.

use serde::{Deserialize, Serialize};

use levy_core::{FilingStatus, Jurisdiction, Money, Rate, TaxYear};

use crate::brackets::BracketTable;
use crate::phaseout::{PhaseoutBand, SteppedPhaseout};

/// A value parameterized by filing status.
///
/// Every per-status lookup in the engine goes through [`PerStatus::get`],
/// so a rule set that deserializes necessarily covers all five statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerStatus<T> {
    /// Value for single filers.
    pub single: T,
    /// Value for married filing jointly.
    pub married_filing_jointly: T,
    /// Value for married filing separately.
    pub married_filing_separately: T,
    /// Value for head of household.
    pub head_of_household: T,
    /// Value for qualifying surviving spouse.
    pub qualifying_surviving_spouse: T,
}

impl<T> PerStatus<T> {
    /// Look up the value for a filing status.
    pub fn get(&self, status: FilingStatus) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly => &self.married_filing_jointly,
            FilingStatus::MarriedFilingSeparately => &self.married_filing_separately,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
            FilingStatus::QualifyingSurvivingSpouse => &self.qualifying_surviving_spouse,
        }
    }

    /// Visit every status/value pair. Used by load-time validation.
    pub fn for_each(&self, mut f: impl FnMut(FilingStatus, &T)) {
        for status in FilingStatus::ALL {
            f(status, self.get(status));
        }
    }
}

/// Self-employment tax parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeTaxRules {
    /// Fraction of net self-employment profit subject to the tax
    /// (the 92.35% factor).
    pub net_earnings_factor: Rate,
    /// Combined employer+employee Social Security rate.
    pub social_security_rate: Rate,
    /// Social Security wage base for the year; the SS portion is capped
    /// here, shared with W-2 wages.
    pub social_security_wage_base: Money,
    /// Combined Medicare rate, uncapped.
    pub medicare_rate: Rate,
}

/// Itemized-deduction limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemizedRules {
    /// Medical expenses deductible only above this fraction of AGI.
    pub medical_agi_floor: Rate,
    /// State-and-local-tax deduction ceiling.
    pub salt_cap: Money,
    /// Mortgage interest is scaled down when acquisition debt exceeds
    /// this limit.
    pub mortgage_acquisition_debt_limit: Money,
    /// Charitable cash contributions capped at this fraction of AGI;
    /// excess carries forward.
    pub charitable_agi_ceiling: Rate,
}

/// Qualified-business-income deduction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbiRules {
    /// The deduction rate (20%).
    pub rate: Rate,
    /// Taxable-income band across which the wage/basis limitation phases
    /// in (and SSTB income phases out).
    pub phase_in: PerStatus<PhaseoutBand>,
    /// W-2 wage limitation: this fraction of W-2 wages...
    pub w2_wage_pct: Rate,
    /// ...or this fraction of W-2 wages plus the UBIA fraction,
    /// whichever is greater.
    pub w2_wage_and_ubia_pct: Rate,
    /// Unadjusted-basis fraction paired with `w2_wage_and_ubia_pct`.
    pub ubia_pct: Rate,
}

/// Net-investment-income surtax parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NiitRules {
    /// Surtax rate.
    pub rate: Rate,
    /// Modified-AGI threshold above which the surtax applies.
    pub magi_threshold: PerStatus<Money>,
}

/// Alternative-minimum-tax parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmtRules {
    /// Exemption amount before phaseout.
    pub exemption: PerStatus<Money>,
    /// AMTI level at which the exemption begins to phase out.
    pub exemption_phaseout_threshold: PerStatus<Money>,
    /// Exemption reduction per dollar of AMTI over the threshold.
    pub exemption_phaseout_rate: Rate,
    /// The two-tier AMT rate schedule.
    pub brackets: PerStatus<BracketTable>,
}

/// The credits the engine knows how to order. The ordering table in a
/// rule set is data; this enum is the closed vocabulary it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditKind {
    /// Credit for foreign income taxes paid.
    ForeignTax,
    /// Child and dependent care expenses credit.
    ChildAndDependentCare,
    /// Education credits.
    Education,
    /// Retirement savings contributions credit.
    RetirementSaver,
    /// Child tax credit (nonrefundable portion).
    ChildTax,
    /// Additional child tax credit (refundable portion).
    AdditionalChildTax,
    /// Earned income credit.
    EarnedIncome,
}

impl CreditKind {
    /// The canonical string name of this credit.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForeignTax => "foreign_tax",
            Self::ChildAndDependentCare => "child_and_dependent_care",
            Self::Education => "education",
            Self::RetirementSaver => "retirement_saver",
            Self::ChildTax => "child_tax",
            Self::AdditionalChildTax => "additional_child_tax",
            Self::EarnedIncome => "earned_income",
        }
    }
}

impl std::fmt::Display for CreditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the credit-ordering table. Row order in the rule set is
/// application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRule {
    /// Which credit this row governs.
    pub kind: CreditKind,
    /// Refundable credits are applied after all nonrefundable credits,
    /// without the remaining-liability cap.
    pub refundable: bool,
    /// Optional income-based reduction of the gross amount, with
    /// per-status thresholds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phaseout: Option<PerStatus<SteppedPhaseout>>,
    /// How many years unused amounts carry forward (0 = lost).
    #[serde(default)]
    pub carryforward_years: u8,
}

/// A month/day pair for installment schedules (year comes from the run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    /// Calendar month, 1-12.
    pub month: u32,
    /// Day of month.
    pub day: u32,
}

/// Payments, safe-harbor, and underpayment-penalty parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRules {
    /// Safe harbor: this fraction of current-year tax...
    pub safe_harbor_current_pct: Rate,
    /// ...or this fraction of prior-year tax, whichever is smaller.
    pub safe_harbor_prior_pct: Rate,
    /// Prior-year fraction for high-income filers.
    pub safe_harbor_prior_high_pct: Rate,
    /// Prior-year AGI above which the high-income fraction applies.
    pub prior_agi_high_threshold: Money,
    /// No penalty when the balance due is below this amount.
    pub de_minimis_balance: Money,
    /// Annual underpayment interest rate (simple interest, days/365).
    pub underpayment_annual_rate: Rate,
    /// The four quarterly installment due dates. The first three fall in
    /// the tax year; a due date earlier in the calendar than the first
    /// one is taken to fall in the following year (the January date).
    pub installment_due: [MonthDay; 4],
    /// Filing deadline in the year after the tax year; interest accrual
    /// stops here.
    pub filing_deadline: MonthDay,
}

/// The complete, immutable rule table for one (jurisdiction, tax year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionRuleSet {
    /// The jurisdiction these rules belong to.
    pub jurisdiction: Jurisdiction,
    /// The tax year these rules belong to.
    pub tax_year: TaxYear,
    /// Version identifier recorded on every audit event produced under
    /// these rules.
    pub rule_version: String,
    /// Base standard deduction by filing status.
    pub standard_deduction: PerStatus<Money>,
    /// Additional standard deduction per age-65/blindness occurrence.
    pub additional_standard_deduction: PerStatus<Money>,
    /// Ordinary progressive schedules.
    pub ordinary_brackets: PerStatus<BracketTable>,
    /// Preferential-rate (qualified dividend / long-term gain) schedules.
    pub preferential_brackets: PerStatus<BracketTable>,
    /// Self-employment tax parameters.
    pub se_tax: SeTaxRules,
    /// Itemized-deduction limits.
    pub itemized: ItemizedRules,
    /// QBI deduction parameters.
    pub qbi: QbiRules,
    /// Net-investment-income surtax parameters.
    pub niit: NiitRules,
    /// Alternative-minimum-tax parameters.
    pub amt: AmtRules,
    /// Credit application order. Row order is application order.
    pub credit_ordering: Vec<CreditRule>,
    /// Payments and penalty parameters.
    pub payments: PaymentRules,
}

impl JurisdictionRuleSet {
    /// Load-time completeness validation.
    ///
    /// `source_name` appears in error messages so a bad file is
    /// identifiable among many.
    pub fn validate(&self) -> Result<(), String> {
        if self.rule_version.trim().is_empty() {
            return Err("rule_version must be non-empty".into());
        }

        let mut defect: Option<String> = None;
        let mut check = |label: &str, status: FilingStatus, result: Result<(), String>| {
            if defect.is_none() {
                if let Err(e) = result {
                    defect = Some(format!("{label} ({status}): {e}"));
                }
            }
        };

        self.ordinary_brackets
            .for_each(|s, t| check("ordinary_brackets", s, t.validate()));
        self.preferential_brackets
            .for_each(|s, t| check("preferential_brackets", s, t.validate()));
        self.amt
            .brackets
            .for_each(|s, t| check("amt.brackets", s, t.validate()));
        self.qbi
            .phase_in
            .for_each(|s, b| check("qbi.phase_in", s, b.validate()));
        if let Some(d) = defect {
            return Err(d);
        }

        self.standard_deduction.for_each(|_, m| {
            if m.is_negative() {
                defect = Some("standard_deduction must be non-negative".into());
            }
        });
        if let Some(d) = defect {
            return Err(d);
        }

        for rate in [
            self.se_tax.net_earnings_factor,
            self.se_tax.social_security_rate,
            self.se_tax.medicare_rate,
            self.itemized.medical_agi_floor,
            self.itemized.charitable_agi_ceiling,
            self.qbi.rate,
            self.niit.rate,
            self.amt.exemption_phaseout_rate,
            self.payments.underpayment_annual_rate,
        ] {
            if !rate.is_unit_interval() {
                return Err(format!("rate {rate} outside [0, 1]"));
            }
        }

        if self.credit_ordering.is_empty() {
            return Err("credit_ordering table must be non-empty".into());
        }
        let mut seen = std::collections::HashSet::new();
        for rule in &self.credit_ordering {
            if !seen.insert(rule.kind) {
                return Err(format!(
                    "credit_ordering has duplicate entry for {}",
                    rule.kind
                ));
            }
            if let Some(p) = &rule.phaseout {
                let mut bad: Option<String> = None;
                p.for_each(|status, sp| {
                    if bad.is_none() {
                        if let Err(e) = sp.validate() {
                            bad = Some(format!("credit {} phaseout ({status}): {e}", rule.kind));
                        }
                    }
                });
                if let Some(b) = bad {
                    return Err(b);
                }
            }
        }

        for md in self
            .payments
            .installment_due
            .iter()
            .chain(std::iter::once(&self.payments.filing_deadline))
        {
            if !(1..=12).contains(&md.month) || !(1..=31).contains(&md.day) {
                return Err(format!("invalid month/day {}/{}", md.month, md.day));
            }
        }

        Ok(())
    }

    /// The ordering-table row for a credit kind, if the rule set knows it.
    pub fn credit_rule(&self, kind: CreditKind) -> Option<&CreditRule> {
        self.credit_ordering.iter().find(|r| r.kind == kind)
    }
}
