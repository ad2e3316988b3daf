//! Stage 3: standard-versus-itemized deduction.
//!
//! The standard amount is the per-status base plus one addition per
//! age-65/blindness occurrence. Itemized candidates pass through their
//! statutory floors and caps: medical above the AGI floor, SALT capped,
//! mortgage interest scaled down when acquisition debt exceeds the
//! limit, charitable cash capped at the AGI ceiling with the excess
//! surfaced as a carryforward warning. The larger total wins; ties go
//! to the standard deduction.

use serde_json::json;
use tracing::debug;

use levy_core::{CalculationError, Money, StageName};
use levy_rules::JurisdictionRuleSet;

use crate::breakdown::{DeductionLine, DeductionSelection, ItemizedDetail};
use crate::context::CalculationContext;
use crate::stages::{snapshot, Stage, StageRecord};

pub(crate) struct DeductionsStage;

impl Stage for DeductionsStage {
    fn name(&self) -> StageName {
        StageName::Deductions
    }

    fn execute(
        &self,
        ctx: &mut CalculationContext<'_>,
        rules: &JurisdictionRuleSet,
    ) -> Result<StageRecord, CalculationError> {
        let agi = ctx.agi(self.name())?.agi;
        let input = ctx.input();
        let status = input.filing_status;

        let base = *rules.standard_deduction.get(status);
        let additional = *rules.additional_standard_deduction.get(status);
        let occurrences = input.additional_deduction_count();
        let mut standard_amount = base;
        for _ in 0..occurrences {
            standard_amount += additional;
        }

        let itemized = itemize(&input.itemized, agi, rules);

        let (selection, amount, reason) = if itemized.total > standard_amount {
            (
                DeductionSelection::Itemized,
                itemized.total,
                format!(
                    "itemized {} exceeds standard {standard_amount}",
                    itemized.total
                ),
            )
        } else {
            (
                DeductionSelection::Standard,
                standard_amount,
                format!(
                    "standard {standard_amount} meets or exceeds itemized {}",
                    itemized.total
                ),
            )
        };

        if itemized.charitable_carryforward.is_positive() {
            ctx.warn(format!(
                "charitable contributions exceed the AGI ceiling; {} carries forward",
                itemized.charitable_carryforward
            ));
        }

        let line = DeductionLine {
            standard_amount,
            itemized,
            selection,
            amount,
            reason,
        };
        debug!(selection = ?line.selection, amount = %line.amount, "deduction selected");
        let record = StageRecord {
            input_snapshot: json!({
                "agi": agi,
                "filing_status": status,
                "additional_deduction_occurrences": occurrences,
                "itemized_candidates": input.itemized,
            }),
            output_snapshot: snapshot(self.name(), &line)?,
        };
        ctx.commit_deductions(line)?;
        Ok(record)
    }
}

/// Apply floors, caps, and limits to the itemized candidates.
fn itemize(
    candidates: &crate::input::ItemizedCandidates,
    agi: Money,
    rules: &JurisdictionRuleSet,
) -> ItemizedDetail {
    let limits = &rules.itemized;
    let agi_floor = agi.floor_zero();

    let medical_allowed = (candidates.medical_expenses
        - agi_floor.mul_rate(limits.medical_agi_floor))
    .floor_zero()
    .to_line();

    let salt_allowed = candidates.state_local_taxes.min(limits.salt_cap).to_line();

    let mortgage_allowed = if candidates.mortgage_acquisition_debt
        > limits.mortgage_acquisition_debt_limit
    {
        candidates
            .mortgage_interest
            .mul_rate(
                limits
                    .mortgage_acquisition_debt_limit
                    .ratio(candidates.mortgage_acquisition_debt),
            )
            .to_line()
    } else {
        candidates.mortgage_interest.to_line()
    };

    let charitable_ceiling = agi_floor.mul_rate(limits.charitable_agi_ceiling);
    let charitable_allowed = candidates.charitable_cash.min(charitable_ceiling).to_line();
    let charitable_carryforward = (candidates.charitable_cash - charitable_allowed)
        .floor_zero()
        .to_line();

    let total = medical_allowed + salt_allowed + mortgage_allowed + charitable_allowed;
    ItemizedDetail {
        medical_allowed,
        salt_allowed,
        mortgage_allowed,
        charitable_allowed,
        charitable_carryforward,
        total,
    }
}
