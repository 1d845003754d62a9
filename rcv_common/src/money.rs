use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of minor units (cents) in one currency unit.
pub const MINOR_UNITS_PER_UNIT: i64 = 100;

//--------------------------------------       Money         ---------------------------------------------------------
/// An amount of money, held as an integer number of minor currency units.
///
/// The ledger never uses floating point for amounts. `Money` is stored as an `INTEGER` column and serializes to
/// JSON as a bare integer.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

// Arithmetic saturates at the bounds of i64. Amounts entering the ledger are capped at `Money::MAX_AMOUNT`, so a
// saturated total means a corrupt ledger, never a real balance.
op!(binary Money, Add, add, saturating_add);
op!(binary Money, Sub, sub, saturating_sub);
op!(inplace Money, AddAssign, add_assign, saturating_add);
op!(inplace Money, SubAssign, sub_assign, saturating_sub);
op!(unary Money, Neg, neg, saturating_neg);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as Money: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| MoneyConversionError(format!("Value {value} is too large to convert to Money")))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / MINOR_UNITS_PER_UNIT.unsigned_abs();
        let cents = abs % MINOR_UNITS_PER_UNIT.unsigned_abs();
        write!(f, "{sign}${units}.{cents:02}")
    }
}

impl Money {
    pub const ZERO: Money = Money(0);
    /// The largest single payment or order total the ledger accepts: ten trillion currency units.
    pub const MAX_AMOUNT: Money = Money(10_000_000_000_000 * MINOR_UNITS_PER_UNIT);

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(MINOR_UNITS_PER_UNIT))
    }

    /// True for amounts in `1..=MAX_AMOUNT`, the range accepted for payments.
    pub fn is_valid_payment(&self) -> bool {
        self.is_positive() && *self <= Self::MAX_AMOUNT
    }

    /// True for amounts in `0..=MAX_AMOUNT`, the range accepted for order totals.
    pub fn is_valid_total(&self) -> bool {
        !self.is_negative() && *self <= Self::MAX_AMOUNT
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Subtracts `rhs`, flooring the result at zero.
    pub fn saturating_sub_floor(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0).max(0))
    }
}
