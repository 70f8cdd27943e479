//! # Weight Module
//!
//! Mass in whole grams. Same reasoning as [`Money`](crate::money::Money):
//! scale readings like `60.4 kg` are stored as `60_400` and never touch a
//! float inside the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Grams in one kilogram.
pub const GRAMS_PER_KG: i64 = 1000;

/// A mass in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Weight(i64);

impl Weight {
    #[inline]
    pub const fn from_grams(grams: i64) -> Self {
        Weight(grams)
    }

    #[inline]
    pub const fn from_kg(kg: i64) -> Self {
        Weight(kg * GRAMS_PER_KG)
    }

    #[inline]
    pub const fn grams(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Weight(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Weight(0)
        } else {
            self
        }
    }

    /// Smaller of two weights.
    #[inline]
    pub fn min(self, other: Weight) -> Weight {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

/// Shows weight as kilograms with three decimals.
impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            f,
            "{}{}.{:03} kg",
            sign,
            abs / GRAMS_PER_KG,
            abs % GRAMS_PER_KG
        )
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight::zero()
    }
}

impl Add for Weight {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl AddAssign for Weight {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Weight {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Weight(self.0 - other.0)
    }
}

impl SubAssign for Weight {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Weight {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Weight(-self.0)
    }
}

/// Per-unit weight times a count.
impl Mul<i64> for Weight {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Weight(self.0 * qty)
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Self {
        iter.fold(Weight::zero(), |acc, w| acc + w)
    }
}
