//! Stage 9: payments reconciliation and underpayment penalty.
//!
//! The required annual payment is the smaller safe-harbor threshold:
//! 90% of the current year's tax, or 100% of the prior year's (110%
//! above the prior-AGI threshold). Withholding counts as paid evenly
//! across the four installments; estimated payments count in the
//! quarter they were made. When the safe harbor is missed and the
//! balance is above the de-minimis amount, simple interest accrues on
//! each quarter's cumulative underpayment from its due date to the next
//! due date (the filing deadline for the last), capped at `as_of`. The
//! penalty total is the single reportable line; per-quarter interest is
//! carried unrounded in the detail.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, Rate, StageName};
use levy_rules::{JurisdictionRuleSet, MonthDay};

use crate::breakdown::{PaymentsLine, QuarterPenalty};
use crate::context::CalculationContext;
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct PaymentsAndPenaltiesStage;

impl Stage for PaymentsAndPenaltiesStage {
    fn name(&self) -> StageName {
        StageName::PaymentsAndPenalties
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let tax_after_credits = ctx.credits(self.name())?.tax_after_credits;
        let input = ctx.input();
        let payments = &input.payments;
        let rules_p = &rules.payments;

        let total_tax = tax_after_credits.floor_zero().to_line();
        // A negative post-credit liability is a refundable overflow and
        // counts like a payment.
        let refundable_overflow = (-tax_after_credits).floor_zero();
        let estimated_total: Money = payments.estimated.iter().copied().sum();
        let total_payments = (payments.withholding + estimated_total).to_line();

        let current_threshold = total_tax.mul_rate(rules_p.safe_harbor_current_pct);
        let prior_pct = if payments.prior_year_agi > rules_p.prior_agi_high_threshold {
            rules_p.safe_harbor_prior_high_pct
        } else {
            rules_p.safe_harbor_prior_pct
        };
        let prior_threshold = payments.prior_year_tax.mul_rate(prior_pct);
        let required_annual_payment = current_threshold.min(prior_threshold).to_line();

        let balance_before_penalty =
            total_tax - total_payments - refundable_overflow;

        let safe_harbor_met = total_payments >= required_annual_payment
            || balance_before_penalty < rules_p.de_minimis_balance;

        let (quarters, penalty) = if safe_harbor_met {
            (Vec::new(), Money::ZERO)
        } else {
            accrue_penalty(
                required_annual_payment,
                payments.withholding,
                &payments.estimated,
                rules_p,
                input.tax_year.as_u16(),
                input.as_of,
                self.name(),
            )?
        };

        let refund_or_due = (balance_before_penalty + penalty).to_line();

        let line = PaymentsLine {
            total_payments,
            required_annual_payment,
            safe_harbor_met,
            quarters,
            penalty,
            total_tax,
            refund_or_due,
        };
        debug!(
            total_tax = %line.total_tax,
            penalty = %line.penalty,
            refund_or_due = %line.refund_or_due,
            "payments reconciled"
        );
        let record = StageRecord {
            input_snapshot: json!({
                "tax_after_credits": tax_after_credits,
                "withholding": payments.withholding,
                "estimated": payments.estimated,
                "prior_year_tax": payments.prior_year_tax,
                "prior_year_agi": payments.prior_year_agi,
                "as_of": input.as_of,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_payments(line)?;
        Ok(record)
    }
}

/// Quarterly simple-interest accrual on cumulative underpayments.
#[allow(clippy::too_many_arguments)]
fn accrue_penalty(
    required_annual: Money,
    withholding: Money,
    estimated: &[Money; 4],
    rules: &levy_rules::PaymentRules,
    tax_year: u16,
    as_of: NaiveDate,
    stage: StageName,
) -> Result<(Vec<QuarterPenalty>, Money), CalculationError> {
    let quarter_rate = Rate::new(Decimal::new(25, 2));
    let required_installment = required_annual.mul_rate(quarter_rate);
    let withheld_per_quarter = withholding.mul_rate(quarter_rate);

    // Due dates: the first three fall in the tax year; a date earlier
    // in the calendar than the first is the January date of the next
    // year. The deadline is always in the next year.
    let first = rules.installment_due[0];
    let mut dates = Vec::with_capacity(5);
    for md in &rules.installment_due {
        let year = if (md.month, md.day) < (first.month, first.day) {
            i32::from(tax_year) + 1
        } else {
            i32::from(tax_year)
        };
        dates.push(resolve_date(year, *md, stage)?);
    }
    dates.push(resolve_date(i32::from(tax_year) + 1, rules.filing_deadline, stage)?);

    let accrual_end = as_of.min(dates[4]);
    let year_days = Decimal::from(365u32);

    let mut cumulative_required = Money::ZERO;
    let mut cumulative_paid = Money::ZERO;
    let mut quarters = Vec::with_capacity(4);
    let mut penalty_exact = Money::ZERO;

    for q in 0..4 {
        cumulative_required += required_installment;
        cumulative_paid += withheld_per_quarter + estimated[q];
        let underpayment = (cumulative_required - cumulative_paid).floor_zero();

        let period_end = dates[q + 1].min(accrual_end);
        let days = (period_end - dates[q]).num_days();
        if days <= 0 || underpayment.is_zero() {
            continue;
        }

        let interest = Money::from_decimal(
            underpayment.as_decimal()
                * rules.underpayment_annual_rate.as_decimal()
                * Decimal::from(days)
                / year_days,
        );
        penalty_exact += interest;
        quarters.push(QuarterPenalty {
            quarter: (q + 1) as u8,
            underpayment: underpayment.to_line(),
            days,
            interest,
        });
    }

    Ok((quarters, penalty_exact.to_line()))
}

fn resolve_date(year: i32, md: MonthDay, stage: StageName) -> Result<NaiveDate, CalculationError> {
    NaiveDate::from_ymd_opt(year, md.month, md.day).ok_or_else(|| {
        CalculationError::InvariantViolation {
            stage,
            detail: format!("installment date {}-{}-{} does not exist", year, md.month, md.day),
        }
    })
}
