//! # Threshold & Phaseout Curves
//!
//! Two declarative phaseout shapes cover every reduction rule in the
//! engine:
//!
//! - [`PhaseoutBand`]: a continuous linear phase-in between a lower and
//!   upper bound. Used by the QBI wage-limitation phase-in and the SSTB
//!   exclusion. Continuity at both boundaries is an invariant: the
//!   fraction is exactly 0 at/below the lower bound and exactly 1
//!   at/above the upper bound, with linear interpolation between.
//! - [`SteppedPhaseout`]: a credit-style reduction of a fixed amount per
//!   step of income over a threshold (e.g. $50 per $1,000 over).

use serde::{Deserialize, Serialize};

use levy_core::{Money, Rate};

/// A continuous linear phase-in band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseoutBand {
    /// Below this bound the phased behavior does not apply (fraction 0).
    pub lower: Money,
    /// At or above this bound the phased behavior applies fully
    /// (fraction 1).
    pub upper: Money,
}

impl PhaseoutBand {
    /// Structural validity: `lower < upper`, both non-negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.lower.is_negative() || self.upper.is_negative() {
            return Err("phaseout band bounds must be non-negative".into());
        }
        if self.lower >= self.upper {
            return Err(format!(
                "phaseout band lower {} must be below upper {}",
                self.lower, self.upper
            ));
        }
        Ok(())
    }

    /// The phase-in fraction at `x`, in `[0, 1]`, continuous at both
    /// boundaries.
    pub fn fraction(&self, x: Money) -> Rate {
        if x <= self.lower {
            return Rate::ZERO;
        }
        if x >= self.upper {
            return Rate::ONE;
        }
        (x - self.lower).ratio(self.upper - self.lower).clamp_unit()
    }
}

/// A stepped reduction: `reduction_per_step` is subtracted from the gross
/// amount for every full or partial `step` of income above `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteppedPhaseout {
    /// Income level at which reduction begins.
    pub threshold: Money,
    /// Income step size (partial steps count as full).
    pub step: Money,
    /// Reduction per step.
    pub reduction_per_step: Money,
}

impl SteppedPhaseout {
    /// Structural validity: positive step, non-negative threshold and
    /// reduction.
    pub fn validate(&self) -> Result<(), String> {
        if !self.step.is_positive() {
            return Err("phaseout step must be positive".into());
        }
        if self.threshold.is_negative() || self.reduction_per_step.is_negative() {
            return Err("phaseout threshold and reduction must be non-negative".into());
        }
        Ok(())
    }

    /// Apply the reduction to `gross` at income level `income`, floored
    /// at zero.
    pub fn reduce(&self, gross: Money, income: Money) -> Money {
        let excess = (income - self.threshold).floor_zero();
        if excess.is_zero() {
            return gross;
        }
        // Ceiling division: a partial step triggers a full reduction unit.
        let steps = (excess.as_decimal() / self.step.as_decimal()).ceil();
        let reduction = Money::from_decimal(steps * self.reduction_per_step.as_decimal());
        (gross - reduction).floor_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn band() -> PhaseoutBand {
        PhaseoutBand {
            lower: Money::from_dollars(197_300),
            upper: Money::from_dollars(247_300),
        }
    }

    #[test]
    fn fraction_zero_at_and_below_lower() {
        let b = band();
        assert_eq!(b.fraction(Money::from_dollars(100_000)), Rate::ZERO);
        assert_eq!(b.fraction(Money::from_dollars(197_300)), Rate::ZERO);
    }

    #[test]
    fn fraction_one_at_and_above_upper() {
        let b = band();
        assert_eq!(b.fraction(Money::from_dollars(247_300)), Rate::ONE);
        assert_eq!(b.fraction(Money::from_dollars(500_000)), Rate::ONE);
    }

    #[test]
    fn fraction_midpoint_is_half() {
        let b = band();
        assert_eq!(
            b.fraction(Money::from_dollars(222_300)),
            Rate::new(dec!(0.5))
        );
    }

    #[test]
    fn fraction_continuous_just_inside_bounds() {
        let b = band();
        // One cent inside each boundary stays within one part in 5M of
        // the boundary value: no jump discontinuity.
        let eps_low = b.fraction(Money::from_dollars(197_300) + Money::from_cents(1));
        assert!(eps_low > Rate::ZERO);
        assert!(eps_low.as_decimal() < dec!(0.000001));
        let eps_high = b.fraction(Money::from_dollars(247_300) - Money::from_cents(1));
        assert!(eps_high < Rate::ONE);
        assert!(eps_high.as_decimal() > dec!(0.999999));
    }

    #[test]
    fn band_validation() {
        assert!(band().validate().is_ok());
        let bad = PhaseoutBand {
            lower: Money::from_dollars(10),
            upper: Money::from_dollars(10),
        };
        assert!(bad.validate().is_err());
    }

    fn ctc_style() -> SteppedPhaseout {
        SteppedPhaseout {
            threshold: Money::from_dollars(200_000),
            step: Money::from_dollars(1_000),
            reduction_per_step: Money::from_dollars(50),
        }
    }

    #[test]
    fn stepped_no_reduction_at_threshold() {
        let p = ctc_style();
        assert_eq!(
            p.reduce(Money::from_dollars(2_000), Money::from_dollars(200_000)),
            Money::from_dollars(2_000)
        );
    }

    #[test]
    fn stepped_partial_step_counts_full() {
        let p = ctc_style();
        // $1 over the threshold is one full $1,000 step.
        assert_eq!(
            p.reduce(
                Money::from_dollars(2_000),
                Money::from_dollars(200_001)
            ),
            Money::from_dollars(1_950)
        );
    }

    #[test]
    fn stepped_reduction_floors_at_zero() {
        let p = ctc_style();
        assert_eq!(
            p.reduce(
                Money::from_dollars(2_000),
                Money::from_dollars(300_000)
            ),
            Money::ZERO
        );
    }

    #[test]
    fn stepped_validation_rejects_zero_step() {
        let p = SteppedPhaseout {
            threshold: Money::ZERO,
            step: Money::ZERO,
            reduction_per_step: Money::from_dollars(50),
        };
        assert!(p.validate().is_err());
    }
}
