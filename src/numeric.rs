// Numeric abstraction for prices, amounts and cash
//
// The ledger and matching engine are generic over the quantity type so a
// backtest can run on plain floats or on exact decimals.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// Quantity type used consistently across ledger, books and reports
pub trait Amount:
    Copy
    + PartialOrd
    + Debug
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + SubAssign
{
    const ZERO: Self;
    const ONE: Self;

    /// Division that never panics. Floats follow IEEE semantics; types without
    /// infinities saturate on a zero divisor.
    fn ratio(self, divisor: Self) -> Self;

    fn from_f64(value: f64) -> Option<Self>;

    fn to_f64(self) -> f64;

    fn is_positive(self) -> bool {
        self > Self::ZERO
    }
}

impl Amount for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn ratio(self, divisor: Self) -> Self {
        self / divisor
    }

    fn from_f64(value: f64) -> Option<Self> {
        value.is_finite().then_some(value)
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Amount for Decimal {
    const ZERO: Self = Decimal::ZERO;
    const ONE: Self = Decimal::ONE;

    fn ratio(self, divisor: Self) -> Self {
        match self.checked_div(divisor) {
            Some(quotient) => quotient,
            // Mirror float division: x/0 -> ±inf, 0/0 -> nothing buyable
            None if self.is_zero() => Decimal::ZERO,
            None if (self > Decimal::ZERO) == (divisor >= Decimal::ZERO) => Decimal::MAX,
            None => Decimal::MIN,
        }
    }

    fn from_f64(value: f64) -> Option<Self> {
        <Decimal as FromPrimitive>::from_f64(value)
    }

    fn to_f64(self) -> f64 {
        <Decimal as ToPrimitive>::to_f64(&self).unwrap_or(f64::NAN)
    }
}

/// Smaller of two quantities, preferring `a` on ties
pub fn min_amount<N: Amount>(a: N, b: N) -> N {
    if a <= b {
        a
    } else {
        b
    }
}
