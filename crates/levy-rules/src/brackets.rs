//! # Progressive Bracket Tables
//!
//! A [`BracketTable`] is the declarative representation of a progressive
//! rate schedule: ordered segments, each with a lower bound and a rate.
//! Stage logic is generic over the table — ordinary tax, preferential-rate
//! stacking, and the two-tier alternative-minimum schedule all consume the
//! same type.
//!
//! ## Stacking
//!
//! Preferential-rate income is taxed "on top of" ordinary income using the
//! preferential table's own thresholds. That is exactly
//! `tax_for(base + amount) - tax_for(base)`, so stacking needs no special
//! table support — see [`BracketTable::tax_for_stacked`].

use serde::{Deserialize, Serialize};

use levy_core::{Money, Rate};

/// One segment of a progressive schedule: income at or above `lower`
/// (and below the next segment's bound) is taxed at `rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSegment {
    /// Inclusive lower bound of the segment.
    pub lower: Money,
    /// Marginal rate applied within the segment.
    pub rate: Rate,
}

/// An ordered progressive rate schedule.
///
/// ## Validity
///
/// Checked by [`BracketTable::validate`] at rule-set load time:
/// non-empty, first bound exactly zero, bounds strictly increasing,
/// every rate in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BracketTable {
    segments: Vec<BracketSegment>,
}

impl BracketTable {
    /// Build a table from segments. Validity is checked separately at
    /// load time so that loader errors carry file context.
    pub fn new(segments: Vec<BracketSegment>) -> Self {
        Self { segments }
    }

    /// The segments, in ascending order of lower bound.
    pub fn segments(&self) -> &[BracketSegment] {
        &self.segments
    }

    /// Structural validity check. Returns a human-readable defect
    /// description on failure; the loader wraps it into a
    /// `RuleConfigError::Malformed`.
    pub fn validate(&self) -> Result<(), String> {
        if self.segments.is_empty() {
            return Err("bracket table has no segments".into());
        }
        if !self.segments[0].lower.is_zero() {
            return Err(format!(
                "first bracket bound must be 0, got {}",
                self.segments[0].lower
            ));
        }
        for pair in self.segments.windows(2) {
            if pair[1].lower <= pair[0].lower {
                return Err(format!(
                    "bracket bounds must strictly increase: {} then {}",
                    pair[0].lower, pair[1].lower
                ));
            }
        }
        for seg in &self.segments {
            if !seg.rate.is_unit_interval() {
                return Err(format!("bracket rate {} outside [0, 1]", seg.rate));
            }
        }
        Ok(())
    }

    /// Exact progressive tax on `amount`. Negative amounts produce zero.
    ///
    /// The result is unrounded; callers round once at the reportable line.
    pub fn tax_for(&self, amount: Money) -> Money {
        let amount = amount.floor_zero();
        let mut total = Money::ZERO;
        for (i, seg) in self.segments.iter().enumerate() {
            if amount <= seg.lower {
                break;
            }
            let upper = self
                .segments
                .get(i + 1)
                .map(|next| next.lower)
                .unwrap_or(amount);
            let in_segment = amount.min(upper) - seg.lower;
            total += in_segment.mul_rate(seg.rate);
        }
        total
    }

    /// Exact tax on `amount` stacked on top of `base`: ordinary income
    /// fills the brackets first, then `amount` occupies the range
    /// `(base, base + amount]` of this table's thresholds.
    pub fn tax_for_stacked(&self, base: Money, amount: Money) -> Money {
        let base = base.floor_zero();
        let amount = amount.floor_zero();
        self.tax_for(base + amount) - self.tax_for(base)
    }

    /// The marginal rate at `amount` (the rate of the segment containing
    /// the next dollar). Zero for negative amounts.
    pub fn marginal_rate(&self, amount: Money) -> Rate {
        let amount = amount.floor_zero();
        let mut rate = Rate::ZERO;
        for seg in &self.segments {
            if amount >= seg.lower {
                rate = seg.rate;
            } else {
                break;
            }
        }
        rate
    }
}
