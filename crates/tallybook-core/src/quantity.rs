//! # Quantity Module
//!
//! [`Quantity`] counts stock in thousandths of a unit ("milli-units").
//!
//! Materials are bought by the meter, kilogram or liter and are consumed in
//! fractions (0.250 kg of resin per piece), so stock is not an integer.
//! Three decimal places are kept, and they are kept exactly: the value is an
//! `i64`, which lets the database apply relative updates
//! (`stock_milli = stock_milli + ?`) without any rounding drift.
//!
//! Sums and products of caller-supplied quantities use [`Quantity::checked_add`]
//! and [`Quantity::checked_times`]; the operators assume values in range.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::div_round;
use crate::validation::ValidationResult;

/// Number of stored milli-units in one whole unit.
pub const MILLI_PER_UNIT: i64 = 1_000;

/// Decimal places a quantity can carry.
pub const QUANTITY_SCALE: u32 = 3;

/// A stock quantity in thousandths of a unit of measure.
///
/// Signed because it is also used as a ledger delta (negative for sales and
/// material consumption).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Whole units (e.g. 3 chairs).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
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

    /// Converts an exact decimal. Returns `None` when the value carries more
    /// than three decimal places or does not fit.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let scaled = value * Decimal::from(MILLI_PER_UNIT);
        if scaled.fract() != Decimal::ZERO {
            return None;
        }
        scaled.to_i64().map(Quantity)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, QUANTITY_SCALE).normalize()
    }

    /// Parses a strictly positive decimal quantity, as typed by an operator.
    ///
    /// ```rust
    /// use tallybook_core::Quantity;
    ///
    /// assert_eq!(Quantity::parse_positive("quantity", "2.5").unwrap().milli(), 2_500);
    /// assert!(Quantity::parse_positive("quantity", "0").is_err());
    /// assert!(Quantity::parse_positive("quantity", "-1").is_err());
    /// assert!(Quantity::parse_positive("quantity", "1.0001").is_err());
    /// assert!(Quantity::parse_positive("quantity", "lots").is_err());
    /// ```
    pub fn parse_positive(field: &str, text: &str) -> ValidationResult<Self> {
        let text = text.trim();
        let invalid = |reason: String| ValidationError::InvalidQuantity {
            field: field.to_string(),
            reason,
        };

        let value =
            Decimal::from_str(text).map_err(|_| invalid(format!("'{}' is not a number", text)))?;

        let quantity = Quantity::from_decimal(value).ok_or_else(|| {
            invalid(format!(
                "'{}' has more than {} decimal places",
                text, QUANTITY_SCALE
            ))
        })?;

        if !quantity.is_positive() {
            return Err(invalid("must be greater than zero".to_string()));
        }

        Ok(quantity)
    }

    /// Multiplies two quantities (per-unit requirement × units produced),
    /// rounding to the nearest thousandth.
    ///
    /// Returns `None` when the product does not fit in an `i64` of
    /// thousandths.
    ///
    /// ```rust
    /// use tallybook_core::Quantity;
    ///
    /// let per_chair = Quantity::from_units(2);
    /// assert_eq!(per_chair.checked_times(Quantity::from_units(3)), Some(Quantity::from_units(6)));
    ///
    /// let resin = Quantity::from_milli(250); // 0.25 kg per piece
    /// assert_eq!(resin.checked_times(Quantity::from_milli(1_500)).unwrap().milli(), 375);
    ///
    /// assert!(per_chair.checked_times(Quantity::from_milli(i64::MAX)).is_none());
    /// ```
    pub fn checked_times(&self, factor: Quantity) -> Option<Quantity> {
        let milli = div_round(self.0 as i128 * factor.0 as i128, MILLI_PER_UNIT as i128);
        i64::try_from(milli).ok().map(Quantity)
    }

    /// Adds two quantities, `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Quantity) -> Option<Quantity> {
        self.0.checked_add(other.0).map(Quantity)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(Quantity::from_units(5).to_string(), "5");
        assert_eq!(Quantity::from_milli(2_500).to_string(), "2.5");
        assert_eq!(Quantity::from_milli(1).to_string(), "0.001");
        assert_eq!((-Quantity::from_units(2)).to_string(), "-2");
    }

    #[test]
    fn test_from_decimal_rejects_extra_precision() {
        assert_eq!(Quantity::from_decimal(dec!(0.125)), Some(Quantity::from_milli(125)));
        assert_eq!(Quantity::from_decimal(dec!(0.1255)), None);
        assert_eq!(Quantity::from_decimal(dec!(10.000000)), Some(Quantity::from_units(10)));
    }

    #[test]
    fn test_parse_positive_errors_are_quantity_errors() {
        let err = Quantity::parse_positive("quantity", "abc").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQuantity { .. }));

        let err = Quantity::parse_positive("quantity", "0.000").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_arithmetic() {
        let mut stock = Quantity::from_units(10);
        stock += Quantity::from_units(10);
        stock -= Quantity::from_milli(500);
        assert_eq!(stock.milli(), 19_500);

        let total: Quantity = vec![Quantity::from_units(1), Quantity::from_milli(250)]
            .into_iter()
            .sum();
        assert_eq!(total.milli(), 1_250);
    }

    #[test]
    fn test_times_rounds_to_thousandth() {
        // 0.125 * 0.5 = 0.0625 -> 0.063
        assert_eq!(
            Quantity::from_milli(125).checked_times(Quantity::from_milli(500)),
            Some(Quantity::from_milli(63))
        );
        // 0.001 * 0.4 = 0.0004 -> 0
        assert_eq!(
            Quantity::from_milli(1).checked_times(Quantity::from_milli(400)),
            Some(Quantity::zero())
        );
    }

    #[test]
    fn test_overflow_is_reported_not_wrapped() {
        let two = Quantity::from_units(2);
        assert_eq!(two.checked_times(Quantity::from_milli(i64::MAX)), None);
        assert_eq!(
            Quantity::from_units(1_000_000_000).checked_times(Quantity::from_units(1_000_000_000)),
            None
        );

        let half = Quantity::from_milli(i64::MAX / 2 + 1);
        assert_eq!(half.checked_add(half), None);
        assert_eq!(two.checked_add(two), Some(Quantity::from_units(4)));
    }
}
