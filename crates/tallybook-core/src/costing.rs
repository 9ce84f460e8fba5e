//! # Product Costing
//!
//! Builds the cost sheet shown next to a product: what one unit costs to
//! make, what it should sell for at the product's margin, and how the
//! current sale price compares.
//!
//! ```text
//! manufactured (has a bill of materials)   resale (no bill of materials)
//!   material = Σ line.total_cost()           material = acquisition price
//!   labor    = minutes / 60 × hourly rate    labor    = 0
//!
//! base      = material + labor
//! suggested = base + base × margin
//! profit    = sale price − base
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{div_round, Money};
use crate::types::{CompositionLine, Product};
use crate::validation::ValidationResult;

/// Margin given to products created without one (50%).
pub const DEFAULT_PROFIT_MARGIN_BPS: u32 = 5_000;

/// How the sale price compares to the cost sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProfitStatus {
    /// No sale price set yet.
    Neutral,
    /// Sale price below base cost.
    Loss,
    /// Profitable, but below the suggested price.
    Low,
    /// At or above the suggested price.
    Good,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostSheet {
    pub material_cost: Money,
    pub labor_cost: Money,
    pub base_cost: Money,
    pub suggested_price: Money,
    pub sale_price: Money,
    /// `sale_price − base_cost`; negative when sold at a loss.
    pub profit: Money,
    pub status: ProfitStatus,
}

/// Labor cost of `minutes` at `hourly_rate`, rounded to the cent.
/// `None` when the product does not fit in cents.
pub fn labor_cost(minutes: i64, hourly_rate: Money) -> Option<Money> {
    let cents = div_round(hourly_rate.cents() as i128 * minutes as i128, 60);
    i64::try_from(cents).ok().map(Money::from_cents)
}

/// Computes the cost sheet of `product` from its composition lines and the
/// workshop's hourly labor rate.
pub fn cost_sheet(
    product: &Product,
    composition: &[CompositionLine],
    hourly_rate: Money,
) -> ValidationResult<CostSheet> {
    let (material_cost, labor) = if composition.is_empty() {
        (product.acquisition_price(), Money::zero())
    } else {
        let lines = composition
            .iter()
            .map(CompositionLine::total_cost)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ValidationError::amount_too_large("composition"))?;
        (
            Money::checked_sum(lines).ok_or_else(|| ValidationError::amount_too_large("material_cost"))?,
            labor_cost(product.labor_time_minutes, hourly_rate)
                .ok_or_else(|| ValidationError::amount_too_large("labor_cost"))?,
        )
    };

    let base_cost = material_cost
        .checked_add(labor)
        .ok_or_else(|| ValidationError::amount_too_large("base_cost"))?;
    let suggested_price = base_cost
        .checked_percentage(product.profit_margin())
        .and_then(|markup| base_cost.checked_add(markup))
        .ok_or_else(|| ValidationError::amount_too_large("suggested_price"))?;
    let sale_price = product.sale_price();
    let profit = sale_price
        .checked_sub(base_cost)
        .ok_or_else(|| ValidationError::amount_too_large("profit"))?;

    let status = if !sale_price.is_positive() {
        ProfitStatus::Neutral
    } else if profit.is_negative() {
        ProfitStatus::Loss
    } else if sale_price < suggested_price {
        ProfitStatus::Low
    } else {
        ProfitStatus::Good
    };

    Ok(CostSheet {
        material_cost,
        labor_cost: labor,
        base_cost,
        suggested_price,
        sale_price,
        profit,
        status,
    })
}
