//! # Input / Output Validators
//!
//! `validate_input` runs before a run id or audit chain exists; a
//! rejected input never leaves a trace. `validate_output` runs after
//! the last stage and checks the assembled breakdown's arithmetic
//! against itself. Valid-but-unusual returns (zero income, negative
//! AGI, no credits) pass validation; at most they add warnings inside
//! the pipeline.

use levy_core::{Money, Rate, ValidationError, ValidationKind};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::CalculationBreakdown;
use crate::input::{TaxReturnInput, SUPPORTED_SCHEMA_VERSIONS};

fn err(field: &str, kind: ValidationKind, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_owned(),
        kind,
        message: message.into(),
    }
}

fn require_non_negative(field: &str, amount: Money) -> Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(err(
            field,
            ValidationKind::InvalidValue,
            format!("must be non-negative, got {amount}"),
        ));
    }
    Ok(())
}

/// Structural and semantic pre-flight checks on a return.
pub fn validate_input(
    input: &TaxReturnInput,
    rules: &JurisdictionRuleSet,
) -> Result<(), ValidationError> {
    if !SUPPORTED_SCHEMA_VERSIONS.contains(&input.schema_version) {
        return Err(err(
            "schema_version",
            ValidationKind::UnsupportedVersion,
            format!(
                "version {} not supported (supported: {SUPPORTED_SCHEMA_VERSIONS:?})",
                input.schema_version
            ),
        ));
    }

    if input.jurisdiction != rules.jurisdiction || input.tax_year != rules.tax_year {
        return Err(err(
            "jurisdiction",
            ValidationKind::InconsistentInput,
            format!(
                "return is for {}/{} but rules are {}/{}",
                input.jurisdiction, input.tax_year, rules.jurisdiction, rules.tax_year
            ),
        ));
    }

    // Sign-fixed amounts. Capital gains and SE profit may be negative.
    require_non_negative("income.wages", input.income.wages)?;
    require_non_negative("income.taxable_interest", input.income.taxable_interest)?;
    require_non_negative("income.ordinary_dividends", input.income.ordinary_dividends)?;
    require_non_negative("income.qualified_dividends", input.income.qualified_dividends)?;
    require_non_negative("itemized.medical_expenses", input.itemized.medical_expenses)?;
    require_non_negative("itemized.state_local_taxes", input.itemized.state_local_taxes)?;
    require_non_negative("itemized.mortgage_interest", input.itemized.mortgage_interest)?;
    require_non_negative(
        "itemized.mortgage_acquisition_debt",
        input.itemized.mortgage_acquisition_debt,
    )?;
    require_non_negative("itemized.charitable_cash", input.itemized.charitable_cash)?;
    require_non_negative("amt_preference_items", input.amt_preference_items)?;
    require_non_negative("payments.withholding", input.payments.withholding)?;
    require_non_negative("payments.prior_year_tax", input.payments.prior_year_tax)?;
    for (i, amount) in input.payments.estimated.iter().enumerate() {
        require_non_negative(&format!("payments.estimated[{i}]"), *amount)?;
    }

    if input.income.qualified_dividends > input.income.ordinary_dividends {
        return Err(err(
            "income.qualified_dividends",
            ValidationKind::InconsistentInput,
            "qualified dividends cannot exceed ordinary dividends",
        ));
    }

    if !input.filing_status.is_joint() && (input.spouse_age_65 || input.spouse_blind) {
        return Err(err(
            "spouse_age_65",
            ValidationKind::InconsistentInput,
            format!("spouse fields set on a {} return", input.filing_status),
        ));
    }

    if input.itemized.mortgage_interest.is_positive()
        && !input.itemized.mortgage_acquisition_debt.is_positive()
    {
        return Err(err(
            "itemized.mortgage_acquisition_debt",
            ValidationKind::MissingField,
            "acquisition debt is required when mortgage interest is claimed",
        ));
    }

    for (i, business) in input.qbi_businesses.iter().enumerate() {
        if business.name.trim().is_empty() {
            return Err(err(
                &format!("qbi_businesses[{i}].name"),
                ValidationKind::MissingField,
                "business name must be non-empty",
            ));
        }
        require_non_negative(&format!("qbi_businesses[{i}].w2_wages"), business.w2_wages)?;
        require_non_negative(&format!("qbi_businesses[{i}].ubia"), business.ubia)?;
    }

    let mut seen = std::collections::HashSet::new();
    for (i, claim) in input.credits.iter().enumerate() {
        if rules.credit_rule(claim.kind).is_none() {
            return Err(err(
                &format!("credits[{i}].kind"),
                ValidationKind::InvalidValue,
                format!("credit {} is not in this rule set's ordering table", claim.kind),
            ));
        }
        if !seen.insert(claim.kind) {
            return Err(err(
                &format!("credits[{i}].kind"),
                ValidationKind::InconsistentInput,
                format!("credit {} claimed more than once", claim.kind),
            ));
        }
        require_non_negative(&format!("credits[{i}].gross_amount"), claim.gross_amount)?;
        for (j, cf) in claim.carryforwards.iter().enumerate() {
            require_non_negative(&format!("credits[{i}].carryforwards[{j}].amount"), cf.amount)?;
            if cf.origin_year >= input.tax_year.as_u16() {
                return Err(err(
                    &format!("credits[{i}].carryforwards[{j}].origin_year"),
                    ValidationKind::InvalidValue,
                    "carryforward origin year must precede the tax year",
                ));
            }
        }
    }

    Ok(())
}

/// Post-flight sanity checks on the assembled breakdown.
pub fn validate_output(breakdown: &CalculationBreakdown) -> Result<(), ValidationError> {
    if breakdown.total_tax.is_negative() {
        return Err(err(
            "total_tax",
            ValidationKind::InvalidValue,
            format!("total tax {} is negative", breakdown.total_tax),
        ));
    }

    if breakdown.effective_rate < Rate::ZERO || breakdown.effective_rate > Rate::ONE {
        return Err(err(
            "effective_rate",
            ValidationKind::InvalidValue,
            format!("effective rate {} outside [0, 1]", breakdown.effective_rate),
        ));
    }

    // The headline numbers must agree with the payments line they came
    // from.
    if breakdown.total_tax != breakdown.payments.total_tax
        || breakdown.refund_or_due != breakdown.payments.refund_or_due
    {
        return Err(err(
            "refund_or_due",
            ValidationKind::InconsistentInput,
            "headline totals disagree with the payments line",
        ));
    }

    let credits = &breakdown.credits;
    if credits.nonrefundable_applied > credits.pre_credit_tax {
        return Err(err(
            "credits.nonrefundable_applied",
            ValidationKind::InvalidValue,
            "nonrefundable credits exceed pre-credit liability",
        ));
    }

    Ok(())
}
