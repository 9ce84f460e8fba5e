//! # Money Module
//!
//! Provides [`Money`] for monetary values and [`Rate`] for percentages.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of cents. Multiplication by a           │
//! │    quantity or a rate is done in i128 and rounded exactly once,         │
//! │    half away from zero, back to whole cents. A result that does not     │
//! │    fit back in i64 is `None`, never truncated.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tallybook_core::{Money, Quantity, Rate};
//!
//! let price = Money::parse("price", "20.00").unwrap();
//! let total = price.checked_times(Quantity::from_units(2)).unwrap();
//! let fee = total.checked_percentage(Rate::from_bps(500)).unwrap();
//! assert_eq!((total - fee).to_string(), "38.00");
//! ```
//!
//! The `+`/`-` operators are for amounts already known to be in range
//! (a fee subtracted from its own total). Anything built from caller input
//! goes through the `checked_*` methods.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::quantity::{Quantity, MILLI_PER_UNIT};
use crate::validation::ValidationResult;

/// Divides with rounding half away from zero. `den` must be positive.
pub(crate) fn div_round(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);
    let half = den / 2;
    if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// Signed so that cash-book balances and differences can go negative;
/// stored amounts (prices, costs, transaction magnitudes) are validated
/// to be non-negative at the edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
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

    /// Converts a decimal amount, rounding to whole cents.
    ///
    /// Returns `None` when the value does not fit in an `i64` of cents.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (rounded * Decimal::ONE_HUNDRED).to_i64().map(Money)
    }

    /// Exact decimal representation (scale 2).
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parses a decimal amount such as `"20.00"` or `"3.5"`.
    ///
    /// ```rust
    /// use tallybook_core::Money;
    ///
    /// assert_eq!(Money::parse("freight", "10.5").unwrap().cents(), 1050);
    /// assert!(Money::parse("freight", "ten").is_err());
    /// ```
    pub fn parse(field: &str, text: &str) -> ValidationResult<Self> {
        let value = Decimal::from_str(text.trim()).map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not a decimal amount", text.trim()),
        })?;

        Money::from_decimal(value).ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "amount is too large".to_string(),
        })
    }

    /// Applies a percentage rate, rounding to the nearest cent.
    ///
    /// Used for payment-method fees and profit margins. Returns `None`
    /// when the result does not fit in an `i64` of cents.
    ///
    /// ```rust
    /// use tallybook_core::{Money, Rate};
    ///
    /// let total = Money::from_cents(4000);
    /// assert_eq!(total.checked_percentage(Rate::from_bps(500)).unwrap().cents(), 200);
    /// ```
    pub fn checked_percentage(&self, rate: Rate) -> Option<Money> {
        let cents = div_round(self.0 as i128 * rate.bps() as i128, Rate::FULL_BPS as i128);
        i64::try_from(cents).ok().map(Money)
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// Returns `None` when the result does not fit in an `i64` of cents.
    ///
    /// ```rust
    /// use tallybook_core::{Money, Quantity};
    ///
    /// let per_kg = Money::from_cents(1250);
    /// let qty = Quantity::from_milli(1_500); // 1.5 kg
    /// assert_eq!(per_kg.checked_times(qty).unwrap().cents(), 1875);
    /// assert!(per_kg.checked_times(Quantity::from_milli(i64::MAX)).is_none());
    /// ```
    pub fn checked_times(&self, quantity: Quantity) -> Option<Money> {
        let cents = div_round(
            self.0 as i128 * quantity.milli() as i128,
            MILLI_PER_UNIT as i128,
        );
        i64::try_from(cents).ok().map(Money)
    }

    /// Price of one unit when this amount covers `quantity` units.
    ///
    /// Returns `None` for a zero or negative quantity, or when the unit
    /// price does not fit in an `i64` of cents.
    pub fn per_unit(&self, quantity: Quantity) -> Option<Money> {
        if !quantity.is_positive() {
            return None;
        }
        let cents = div_round(
            self.0 as i128 * MILLI_PER_UNIT as i128,
            quantity.milli() as i128,
        );
        i64::try_from(cents).ok().map(Money)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts `other`, `None` on overflow.
    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Sums amounts, `None` as soon as the running total overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage in basis points (1 bps = 0.01%).
///
/// `500` is 5.00%, `10_000` is 100%. Used for payment-method fee rates
/// and product profit margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// 100% in basis points.
    pub const FULL_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The rate as a percentage, e.g. `4.99` for 499 bps.
    pub fn to_percent(&self) -> Decimal {
        Decimal::new(self.0 as i64, 2).normalize()
    }

    /// Parses a percentage such as `"4.99"` (two decimal places at most
    /// are kept, rounding half away from zero).
    ///
    /// ```rust
    /// use tallybook_core::Rate;
    ///
    /// assert_eq!(Rate::parse("fee_rate", "4.99").unwrap().bps(), 499);
    /// assert!(Rate::parse("fee_rate", "-1").is_err());
    /// ```
    pub fn parse(field: &str, text: &str) -> ValidationResult<Self> {
        let value = Decimal::from_str(text.trim()).map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not a percentage", text.trim()),
        })?;

        let bps = (value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            * Decimal::ONE_HUNDRED)
            .to_i64();

        match bps {
            Some(bps) if (0..=Rate::FULL_BPS as i64).contains(&bps) => Ok(Rate(bps as u32)),
            _ => Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: 100,
            }),
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.to_percent())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
