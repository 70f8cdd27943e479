//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    60.4 kg × 2.10 per kg in f64 = 126.84000000000002                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                     │
//! │    60_400 g × 210 per kg / 1000 = 12_684 minor units, exactly          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use roost_core::money::Money;
//! use roost_core::weight::Weight;
//!
//! let price_per_kg = Money::from_cents(210);
//! let amount = price_per_kg.for_weight(Weight::from_grams(60_400));
//! assert_eq!(amount.cents(), 12_684);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::weight::{Weight, GRAMS_PER_KG};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor currency units.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Loading.unit_price ──► × net weight ──► Loading.total_cost            │
/// │                                                                         │
/// │  Distribution.unit_price ──► × net weight ──► Distribution.total ──┐   │
/// │                                                                    │   │
/// │  Payment.total_price − paid − discount ──► remaining ──────────────┤   │
/// │                                                                    ▼   │
/// │                                         Customer.outstanding_debts     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use roost_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// Balances (customer debt, payment remainder) are never stored below zero.
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Prices a weight at this per-kilogram rate.
    ///
    /// ## Implementation
    /// `(grams × price + 500) / 1000` in i128, rounding half away from zero.
    /// Exact whenever the product is a whole number of minor units.
    ///
    /// ```text
    /// 60 kg at 20/kg:   60_000 × 20 / 1000 = 1_200
    /// 1.234 kg at 3/kg:  1_234 × 3  / 1000 = 3.702 → 4
    /// ```
    ///
    /// Returns `None` when the amount does not fit in an `i64`.
    pub fn checked_for_weight(&self, weight: Weight) -> Option<Money> {
        let product = weight.grams() as i128 * self.0 as i128;
        let half = GRAMS_PER_KG as i128 / 2;
        let rounded = if product >= 0 {
            (product + half) / GRAMS_PER_KG as i128
        } else {
            (product - half) / GRAMS_PER_KG as i128
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// [`checked_for_weight`](Self::checked_for_weight), saturating at the
    /// `i64` bounds. For already-validated stored values.
    pub fn for_weight(&self, weight: Weight) -> Money {
        self.checked_for_weight(weight).unwrap_or_else(|| {
            if (weight.grams() < 0) == (self.0 < 0) {
                Money(i64::MAX)
            } else {
                Money(i64::MIN)
            }
        })
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `major.minor` for logs and CLI output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_cents(-1).floor_zero(), Money::zero());
        assert_eq!(Money::from_cents(7).floor_zero().cents(), 7);
    }

    #[test]
    fn test_for_weight_exact() {
        // 500 kg at 10/kg
        let cost = Money::from_cents(10).for_weight(Weight::from_kg(500));
        assert_eq!(cost.cents(), 5000);

        // 60 kg at 20/kg
        let amount = Money::from_cents(20).for_weight(Weight::from_kg(60));
        assert_eq!(amount.cents(), 1200);
    }

    #[test]
    fn test_for_weight_rounding() {
        // 1.234 kg × 3 = 3.702 → 4
        assert_eq!(Money::from_cents(3).for_weight(Weight::from_grams(1234)).cents(), 4);
        // 0.5 kg × 1 = 0.5 → 1 (half away from zero)
        assert_eq!(Money::from_cents(1).for_weight(Weight::from_grams(500)).cents(), 1);
        // 0.499 kg × 1 → 0
        assert_eq!(Money::from_cents(1).for_weight(Weight::from_grams(499)).cents(), 0);
        assert!(Money::from_cents(25).for_weight(Weight::zero()).is_zero());
    }

    #[test]
    fn test_for_weight_overflow() {
        let price = Money::from_cents(1_000_000_000);
        let weight = Weight::from_grams(9_000_000_000_000_000_000);
        assert_eq!(price.checked_for_weight(weight), None);
        assert_eq!(price.for_weight(weight), Money::from_cents(i64::MAX));
        assert_eq!(
            Money::from_cents(20).checked_for_weight(Weight::from_kg(60)),
            Some(Money::from_cents(1200))
        );
    }
}
