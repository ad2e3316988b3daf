//! # Fixed-Point Monetary Arithmetic
//!
//! [`Money`] is the only currency representation in the workspace. It wraps
//! a [`rust_decimal::Decimal`] and is never backed by binary floating point.
//!
//! ## Rounding Policy
//!
//! Intermediate arithmetic (sums, rate multiplications, interpolation) is
//! carried at full decimal precision. Rounding to two fractional digits
//! happens **exactly once per reportable line**, via [`Money::to_line()`],
//! at the point a stage commits an output field. The strategy is
//! round-half-up (midpoint away from zero). Mixing per-step and final
//! rounding produces off-by-one-cent drift against reference worksheets,
//! so no other rounding call exists in the workspace.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount with exact decimal representation.
///
/// Serializes as a decimal string (e.g. `"1234.56"`), which keeps hashed
/// snapshots canonical — no floats ever appear in serialized form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Construct from an integer number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Construct from whole dollars.
    pub fn from_dollars(dollars: i64) -> Self {
        Money(Decimal::new(dollars, 0))
    }

    /// Construct from a raw decimal value.
    pub fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    /// The underlying decimal value, at whatever precision it carries.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Round to a reportable line amount: two fractional digits,
    /// round-half-up (midpoint away from zero).
    ///
    /// This is the single rounding point in the workspace. Call it when
    /// committing a value to a breakdown line, never mid-computation.
    pub fn to_line(self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by a rate, exact (no rounding).
    pub fn mul_rate(self, rate: Rate) -> Money {
        Money(self.0 * rate.as_decimal())
    }

    /// The fraction `self / denominator` as a [`Rate`].
    ///
    /// Returns `Rate::ZERO` when the denominator is zero — callers use this
    /// for effective-rate style ratios where a zero base means "no rate".
    pub fn ratio(self, denominator: Money) -> Rate {
        if denominator.0.is_zero() {
            Rate::ZERO
        } else {
            Rate::new(self.0 / denominator.0)
        }
    }

    /// The larger of two amounts.
    pub fn max(self, other: Money) -> Money {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    /// The smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    /// Floor at zero. Used where a statute says "but not below zero".
    pub fn floor_zero(self) -> Money {
        self.max(Money::ZERO)
    }

    /// Whether the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Whether the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Whether the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money(Decimal::from_str(s)?))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dimensionless multiplier (tax rate, phase-in fraction, AGI floor
/// percentage). Carried unrounded; rates are configuration data, not
/// reportable line amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    /// The zero rate.
    pub const ZERO: Rate = Rate(Decimal::ZERO);
    /// The unit rate (100%).
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// Construct from a raw decimal multiplier (`0.22` for 22%).
    pub fn new(value: Decimal) -> Self {
        Rate(value)
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// The complement `1 - self`.
    pub fn complement(self) -> Rate {
        Rate(Decimal::ONE - self.0)
    }

    /// Clamp into `[0, 1]`.
    pub fn clamp_unit(self) -> Rate {
        if self.0 < Decimal::ZERO {
            Rate::ZERO
        } else if self.0 > Decimal::ONE {
            Rate::ONE
        } else {
            self
        }
    }

    /// Whether the rate lies in `[0, 1]`.
    pub fn is_unit_interval(&self) -> bool {
        self.0 >= Decimal::ZERO && self.0 <= Decimal::ONE
    }
}

impl FromStr for Rate {
    type Err = rust_decimal::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Rate(Decimal::from_str(s)?))
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
