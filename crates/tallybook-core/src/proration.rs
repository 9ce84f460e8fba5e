//! # Freight Proration
//!
//! Spreads a purchase's freight cost over its lines in proportion to each
//! line's subtotal, and folds the share into an effective unit cost.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  S = Σ sᵢ (line subtotals)        F = freight                          │
//! │                                                                         │
//! │  exact share    = F · sᵢ / S                                            │
//! │  whole cents    = ⌊F · sᵢ / S⌋                                          │
//! │  leftover cents = F − Σ whole cents   (always < number of lines)        │
//! │                                                                         │
//! │  Leftover cents go one each to the lines with the largest fractional    │
//! │  remainders (ties: earlier line first), so Σ shareᵢ == F exactly.       │
//! │                                                                         │
//! │  effective unit cost = (sᵢ + shareᵢ) / quantityᵢ                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! When `S == 0` (every line is free) nothing is prorated: shares are zero
//! and the effective unit cost is the unit cost.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::validation::{validate_quantity, ValidationResult};

/// A purchase line as seen by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProrationLine {
    pub quantity: Quantity,
    pub unit_cost: Money,
}

impl ProrationLine {
    /// `quantity × unit_cost`, `None` if it overflows.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_cost.checked_times(self.quantity)
    }
}

/// A line after freight allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProratedLine {
    pub subtotal: Money,
    pub freight_share: Money,
    pub effective_unit_cost: Money,
}

/// The result of prorating one purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightProration {
    pub subtotal: Money,
    pub freight: Money,
    /// Same order as the input lines.
    pub lines: Vec<ProratedLine>,
}

impl FreightProration {
    /// `subtotal + freight`, the purchase's total amount.
    pub fn total(&self) -> Money {
        self.subtotal + self.freight
    }
}

/// Allocates `freight` across `lines`.
///
/// Amounts are expected to be non-negative (the purchase validator
/// guarantees it).
///
/// ## Errors
/// - `InvalidQuantity` for a line quantity that is not positive
/// - `TooLarge` when a subtotal, the purchase total or an effective unit
///   cost does not fit in cents
///
/// ```rust
/// use tallybook_core::proration::{prorate_freight, ProrationLine};
/// use tallybook_core::{Money, Quantity};
///
/// let lines = [ProrationLine {
///     quantity: Quantity::from_units(10),
///     unit_cost: Money::from_cents(200),
/// }];
/// let result = prorate_freight(&lines, Money::from_cents(1000)).unwrap();
///
/// assert_eq!(result.lines[0].freight_share.cents(), 1000);
/// assert_eq!(result.lines[0].effective_unit_cost.cents(), 300);
/// assert_eq!(result.total().cents(), 3000);
/// ```
pub fn prorate_freight(lines: &[ProrationLine], freight: Money) -> ValidationResult<FreightProration> {
    let mut subtotals = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        validate_quantity(&format!("lines[{index}].quantity"), line.quantity)?;
        let line_subtotal = line
            .subtotal()
            .ok_or_else(|| ValidationError::amount_too_large(format!("lines[{index}].subtotal")))?;
        subtotals.push(line_subtotal);
    }

    let subtotal = Money::checked_sum(subtotals.iter().copied())
        .ok_or_else(|| ValidationError::amount_too_large("subtotal"))?;
    // total() relies on this sum fitting
    subtotal
        .checked_add(freight)
        .ok_or_else(|| ValidationError::amount_too_large("total"))?;

    if !subtotal.is_positive() {
        let lines = lines
            .iter()
            .zip(&subtotals)
            .map(|(line, line_subtotal)| ProratedLine {
                subtotal: *line_subtotal,
                freight_share: Money::zero(),
                effective_unit_cost: line.unit_cost,
            })
            .collect();
        return Ok(FreightProration {
            subtotal,
            freight,
            lines,
        });
    }

    let shares = allocate(&subtotals, subtotal, freight);

    let mut prorated = Vec::with_capacity(lines.len());
    let paired = lines.iter().zip(subtotals.iter().zip(shares));
    for (index, (line, (line_subtotal, share))) in paired.enumerate() {
        // share <= freight and line_subtotal <= subtotal, so the sum fits
        let landed = *line_subtotal + share;
        let effective_unit_cost = landed.per_unit(line.quantity).ok_or_else(|| {
            ValidationError::amount_too_large(format!("lines[{index}].effective_unit_cost"))
        })?;
        prorated.push(ProratedLine {
            subtotal: *line_subtotal,
            freight_share: share,
            effective_unit_cost,
        });
    }

    Ok(FreightProration {
        subtotal,
        freight,
        lines: prorated,
    })
}

/// Largest-remainder split of `freight` by weight `subtotals` (Σ = `total` > 0).
fn allocate(subtotals: &[Money], total: Money, freight: Money) -> Vec<Money> {
    let total = total.cents() as i128;
    let freight_cents = freight.cents() as i128;

    let mut whole = Vec::with_capacity(subtotals.len());
    let mut remainders = Vec::with_capacity(subtotals.len());
    for (index, line) in subtotals.iter().enumerate() {
        let exact = freight_cents * line.cents() as i128;
        whole.push(exact.div_euclid(total));
        remainders.push((exact.rem_euclid(total), index));
    }

    let mut leftover = freight_cents - whole.iter().sum::<i128>();

    // Largest remainder first, earlier line on ties.
    remainders.sort_by(|(rem_a, idx_a), (rem_b, idx_b)| rem_b.cmp(rem_a).then(idx_a.cmp(idx_b)));
    for (_, index) in remainders {
        if leftover <= 0 {
            break;
        }
        whole[index] += 1;
        leftover -= 1;
    }

    whole
        .into_iter()
        .map(|cents| Money::from_cents(cents as i64))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(units_milli: i64, unit_cost_cents: i64) -> ProrationLine {
        ProrationLine {
            quantity: Quantity::from_milli(units_milli),
            unit_cost: Money::from_cents(unit_cost_cents),
        }
    }

    #[test]
    fn test_single_line_takes_all_freight() {
        let result = prorate_freight(&[line(10_000, 200)], Money::from_cents(1000)).unwrap();
        assert_eq!(result.subtotal.cents(), 2000);
        assert_eq!(result.lines[0].freight_share.cents(), 1000);
        assert_eq!(result.lines[0].effective_unit_cost.cents(), 300);
    }

    #[test]
    fn test_proportional_split() {
        // 30.00 and 10.00 share 4.00 of freight as 3.00 / 1.00
        let result = prorate_freight(
            &[line(3_000, 1000), line(1_000, 1000)],
            Money::from_cents(400),
        )
        .unwrap();
        assert_eq!(result.lines[0].freight_share.cents(), 300);
        assert_eq!(result.lines[1].freight_share.cents(), 100);
        assert_eq!(result.lines[0].effective_unit_cost.cents(), 1100);
        assert_eq!(result.lines[1].effective_unit_cost.cents(), 1100);
        assert_eq!(result.total().cents(), 4400);
    }

    #[test]
    fn test_leftover_cent_goes_to_earliest_tie() {
        // 1.00 over three equal lines: 0.34 / 0.33 / 0.33
        let result = prorate_freight(
            &[line(1_000, 500), line(1_000, 500), line(1_000, 500)],
            Money::from_cents(100),
        )
        .unwrap();
        let shares: Vec<i64> = result.lines.iter().map(|l| l.freight_share.cents()).collect();
        assert_eq!(shares, vec![34, 33, 33]);
    }

    #[test]
    fn test_leftover_cent_goes_to_largest_remainder() {
        // weights 1 and 2, freight 0.02: exact 0.00667 / 0.01333
        let result =
            prorate_freight(&[line(1_000, 100), line(1_000, 200)], Money::from_cents(2)).unwrap();
        let shares: Vec<i64> = result.lines.iter().map(|l| l.freight_share.cents()).collect();
        assert_eq!(shares, vec![1, 1]);

        // weights 1 and 3, freight 0.02: exact 0.005 / 0.015 -> tie on .5
        let result =
            prorate_freight(&[line(1_000, 100), line(1_000, 300)], Money::from_cents(2)).unwrap();
        let shares: Vec<i64> = result.lines.iter().map(|l| l.freight_share.cents()).collect();
        assert_eq!(shares, vec![1, 1]);
    }

    #[test]
    fn test_free_lines_are_not_prorated() {
        let result =
            prorate_freight(&[line(5_000, 0), line(2_000, 0)], Money::from_cents(999)).unwrap();
        assert!(result.subtotal.is_zero());
        for prorated in &result.lines {
            assert!(prorated.freight_share.is_zero());
            assert!(prorated.effective_unit_cost.is_zero());
        }
        assert_eq!(result.total().cents(), 999);
    }

    #[test]
    fn test_overflowing_amounts_are_rejected() {
        // 10^13 cents × 10^9 units does not fit in cents
        let err = prorate_freight(
            &[line(1_000_000_000_000, 10_000_000_000_000)],
            Money::from_cents(100),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::amount_too_large("lines[0].subtotal"));

        let half = i64::MAX / 2 + 1;
        let err = prorate_freight(&[line(1_000, half), line(1_000, half)], Money::zero()).unwrap_err();
        assert_eq!(err, ValidationError::amount_too_large("subtotal"));

        let err = prorate_freight(&[line(1_000, i64::MAX)], Money::from_cents(1)).unwrap_err();
        assert_eq!(err, ValidationError::amount_too_large("total"));

        // A landed cost that fits spread over 0.001 units does not
        let err = prorate_freight(&[line(1, i64::MAX)], Money::zero()).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
    }

    #[test]
    fn test_zero_freight_keeps_unit_cost() {
        let result = prorate_freight(&[line(3_000, 250)], Money::zero()).unwrap();
        assert_eq!(result.lines[0].effective_unit_cost.cents(), 250);
    }

    // =========================================================================
    // Property Tests
    // =========================================================================

    fn arb_line() -> impl Strategy<Value = ProrationLine> {
        (1i64..=50_000, 0i64..=100_000).prop_map(|(milli, cents)| line(milli, cents))
    }

    fn arb_lines() -> impl Strategy<Value = Vec<ProrationLine>> {
        prop::collection::vec(arb_line(), 1..20)
    }

    proptest! {
        #[test]
        fn prop_shares_sum_to_freight(lines in arb_lines(), freight in 0i64..1_000_000) {
            let result = prorate_freight(&lines, Money::from_cents(freight)).unwrap();
            let shares: Money = result.lines.iter().map(|l| l.freight_share).sum();
            if result.subtotal.is_positive() {
                prop_assert_eq!(shares.cents(), freight);
            } else {
                prop_assert!(shares.is_zero());
            }
        }

        #[test]
        fn prop_line_costs_sum_to_total(lines in arb_lines(), freight in 0i64..1_000_000) {
            let result = prorate_freight(&lines, Money::from_cents(freight)).unwrap();
            let landed: Money = result.lines.iter().map(|l| l.subtotal + l.freight_share).sum();
            if result.subtotal.is_positive() {
                prop_assert_eq!(landed, result.total());
            } else {
                prop_assert_eq!(landed, result.subtotal);
            }
        }

        #[test]
        fn prop_share_within_one_cent_of_exact(lines in arb_lines(), freight in 0i64..1_000_000) {
            let result = prorate_freight(&lines, Money::from_cents(freight)).unwrap();
            prop_assume!(result.subtotal.is_positive());
            let total = result.subtotal.cents() as i128;
            for prorated in &result.lines {
                let exact_floor = freight as i128 * prorated.subtotal.cents() as i128 / total;
                let share = prorated.freight_share.cents() as i128;
                prop_assert!(share == exact_floor || share == exact_floor + 1);
            }
        }

        #[test]
        fn prop_effective_cost_exact_for_whole_units(
            units in 1i64..100,
            unit_cost in 0i64..10_000,
            extra_per_unit in 0i64..1_000,
        ) {
            // Freight chosen as a whole number of cents per unit, so the
            // effective cost is representable.
            let freight = extra_per_unit * units;
            let lines = [line(units * 1_000, unit_cost)];
            let result = prorate_freight(&lines, Money::from_cents(freight)).unwrap();
            prop_assume!(result.subtotal.is_positive());
            let effective = result.lines[0].effective_unit_cost.cents();
            prop_assert_eq!(effective * units, unit_cost * units + freight);
        }
    }
}
