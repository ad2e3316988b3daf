//! # Calculation Context
//!
//! Per-run accumulator of committed stage outputs. Each stage's line is
//! committed exactly once; a second commit is
//! [`CalculationError::FieldAlreadyCommitted`], and a read before commit
//! is [`CalculationError::MissingDependency`] attributed to the reading
//! stage. Because getters only succeed after the owning stage ran, stage
//! dependencies are acyclic by construction.

use levy_core::{CalculationError, StageName};

use crate::breakdown::{
    AgiLine, AmtLine, CreditLine, DeductionLine, PaymentsLine, QbiLine, SeTaxLine, TaxLine,
};
use crate::input::TaxReturnInput;

macro_rules! committed_field {
    ($field:ident, $commit:ident, $ty:ty, $owner:expr) => {
        /// Read the committed line, attributing a missing commit to
        /// `reader`.
        pub fn $field(&self, reader: StageName) -> Result<&$ty, CalculationError> {
            self.$field.as_ref().ok_or(CalculationError::MissingDependency {
                stage: reader,
                field: stringify!($field).to_owned(),
            })
        }

        /// Commit the line. Exactly once per run.
        pub fn $commit(&mut self, line: $ty) -> Result<(), CalculationError> {
            if self.$field.is_some() {
                return Err(CalculationError::FieldAlreadyCommitted {
                    stage: $owner,
                    field: stringify!($field).to_owned(),
                });
            }
            self.$field = Some(line);
            Ok(())
        }
    };
}

/// Append-only state for one calculation run.
#[derive(Debug)]
pub struct CalculationContext<'a> {
    input: &'a TaxReturnInput,
    warnings: Vec<String>,
    se_tax: Option<SeTaxLine>,
    agi: Option<AgiLine>,
    deductions: Option<DeductionLine>,
    qbi: Option<QbiLine>,
    taxable_income: Option<levy_core::Money>,
    tax: Option<TaxLine>,
    amt: Option<AmtLine>,
    credits: Option<CreditLine>,
    payments: Option<PaymentsLine>,
}

impl<'a> CalculationContext<'a> {
    /// Open a context over a validated input.
    pub fn new(input: &'a TaxReturnInput) -> Self {
        Self {
            input,
            warnings: Vec::new(),
            se_tax: None,
            agi: None,
            deductions: None,
            qbi: None,
            taxable_income: None,
            tax: None,
            amt: None,
            credits: None,
            payments: None,
        }
    }

    /// The read-only input this run computes from.
    pub fn input(&self) -> &'a TaxReturnInput {
        self.input
    }

    /// Record a non-fatal observation for the breakdown.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Warnings accumulated so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Warnings, consumed at breakdown assembly.
    pub(crate) fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    committed_field!(se_tax, commit_se_tax, SeTaxLine, StageName::SelfEmploymentTax);
    committed_field!(agi, commit_agi, AgiLine, StageName::AdjustedGrossIncome);
    committed_field!(deductions, commit_deductions, DeductionLine, StageName::Deductions);
    committed_field!(qbi, commit_qbi, QbiLine, StageName::QualifiedBusinessIncome);
    committed_field!(
        taxable_income,
        commit_taxable_income,
        levy_core::Money,
        StageName::TaxableIncome
    );
    committed_field!(tax, commit_tax, TaxLine, StageName::TaxComputation);
    committed_field!(amt, commit_amt, AmtLine, StageName::AlternativeMinimumTax);
    committed_field!(credits, commit_credits, CreditLine, StageName::Credits);
    committed_field!(
        payments,
        commit_payments,
        PaymentsLine,
        StageName::PaymentsAndPenalties
    );
}
