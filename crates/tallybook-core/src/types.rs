//! # Domain Types
//!
//! Core domain types used throughout Tallybook.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐  composition   ┌──────────────┐                       │
//! │  │   Product    │◄──────────────►│   Material   │                       │
//! │  │ stock_milli  │  qty per unit  │ stock_milli  │                       │
//! │  │ sale_price   │                │ current_cost │                       │
//! │  └──────┬───────┘                └──────▲───────┘                       │
//! │         │ SaleItem                      │ PurchaseItem                  │
//! │  ┌──────▼───────┐                ┌──────┴───────┐                       │
//! │  │     Sale     │                │   Purchase   │                       │
//! │  │ total_amount │                │ freight_cost │                       │
//! │  └──────┬───────┘                └──────────────┘                       │
//! │         │ 1:1 (derived, net of fee)                                     │
//! │  ┌──────▼───────────────┐                                               │
//! │  │ FinancialTransaction │  revenue / expense, paid / pending            │
//! │  └──────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Conventions
//! - `id`: UUID v4 string, immutable
//! - `*_cents`: money as integer cents, exposed as [`Money`] through accessors
//! - `*_milli`: quantities as integer thousandths, exposed as [`Quantity`]
//! - `*_bps`: percentages in basis points, exposed as [`Rate`]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};
use crate::quantity::Quantity;

// =============================================================================
// Unit of Measure
// =============================================================================

/// How a material is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnitOfMeasure {
    #[default]
    Unit,
    Meter,
    Kilogram,
    Liter,
}

impl UnitOfMeasure {
    /// Short code printed next to quantities (UN, MT, KG, LT).
    pub const fn code(&self) -> &'static str {
        match self {
            UnitOfMeasure::Unit => "UN",
            UnitOfMeasure::Meter => "MT",
            UnitOfMeasure::Kilogram => "KG",
            UnitOfMeasure::Liter => "LT",
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product grouping used by the catalog screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A raw material held in stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub unit: UnitOfMeasure,

    /// Cost of one unit, set by the latest purchase (freight included).
    pub current_cost_cents: i64,

    /// Stock in thousandths of `unit`. Never negative after a commit.
    pub stock_milli: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Material {
    #[inline]
    pub fn current_cost(&self) -> Money {
        Money::from_cents(self.current_cost_cents)
    }

    #[inline]
    pub fn stock(&self) -> Quantity {
        Quantity::from_milli(self.stock_milli)
    }

    /// Value of the stock on hand at the current unit cost, `None` if it
    /// overflows.
    pub fn stock_value(&self) -> Option<Money> {
        self.current_cost().checked_times(self.stock())
    }
}

/// A finished product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,

    /// Optional business identifier, unique when present.
    pub sku: Option<String>,

    pub category_id: Option<String>,

    /// Stock in thousandths of a unit. Never negative after a commit.
    pub stock_milli: i64,

    /// Price paid when the product is bought ready-made (resale items).
    pub acquisition_price_cents: i64,

    /// Minutes of labor needed to make one unit.
    pub labor_time_minutes: i64,

    /// Markup applied on top of the base cost (5000 = 50%).
    pub profit_margin_bps: u32,

    pub sale_price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn stock(&self) -> Quantity {
        Quantity::from_milli(self.stock_milli)
    }

    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn acquisition_price(&self) -> Money {
        Money::from_cents(self.acquisition_price_cents)
    }

    #[inline]
    pub fn profit_margin(&self) -> Rate {
        Rate::from_bps(self.profit_margin_bps)
    }
}

/// One bill-of-materials entry as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductComposition {
    pub id: String,
    pub product_id: String,
    pub material_id: String,

    /// Material needed for one unit of the product.
    pub quantity_milli: i64,
}

impl ProductComposition {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }
}

/// A composition entry joined with its material, as shown on the product
/// screen. The line cost is derived from the material's current cost on
/// every read and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CompositionLine {
    pub id: String,
    pub product_id: String,
    pub material_id: String,
    pub material_name: String,
    pub material_unit: UnitOfMeasure,
    pub quantity_milli: i64,
    pub material_cost_cents: i64,
}

impl CompositionLine {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    /// `quantity × material.current_cost`, rounded to the cent.
    pub fn total_cost(&self) -> Option<Money> {
        Money::from_cents(self.material_cost_cents).checked_times(self.quantity())
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// A purchase header.
///
/// Invariant: `total_amount == Σ item subtotal + freight_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: String,
    pub supplier: Option<String>,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub freight_cost_cents: i64,
    pub total_amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    #[inline]
    pub fn freight_cost(&self) -> Money {
        Money::from_cents(self.freight_cost_cents)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A purchase line with its share of the freight folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub purchase_id: String,
    pub material_id: String,
    pub quantity_milli: i64,
    pub unit_cost_cents: i64,
    pub freight_share_cents: i64,
    pub effective_unit_cost_cents: i64,
}

impl PurchaseItem {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    #[inline]
    pub fn effective_unit_cost(&self) -> Money {
        Money::from_cents(self.effective_unit_cost_cents)
    }

    /// `quantity × unit_cost`, before freight.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_cost().checked_times(self.quantity())
    }
}

// =============================================================================
// Sales
// =============================================================================

/// How a customer pays, and what the processor keeps for itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,

    /// Fee withheld by the card operator (499 = 4.99%). Defaults to 0.
    pub fee_rate_bps: u32,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    #[inline]
    pub fn fee_rate(&self) -> Rate {
        Rate::from_bps(self.fee_rate_bps)
    }
}

/// The status of a sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale was recorded and stock was decremented.
    #[default]
    Completed,
}

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub payment_method_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub total_amount_cents: i64,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A line item in a sale. The subtotal is always recomputed server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity_milli: i64,
    pub unit_price_cents: i64,
    /// `quantity × unit_price`, rounded to the cent.
    pub subtotal_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Cash-Book
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money in.
    Revenue,
    /// Money out.
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Settled on the due date.
    Paid,
    /// Still to be received or paid (credit terms).
    Pending,
}

/// A cash-book entry. The amount is a positive magnitude; the direction is
/// carried by `transaction_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FinancialTransaction {
    pub id: String,
    pub description: String,
    pub amount_cents: i64,
    pub transaction_type: TransactionType,

    /// Date the revenue or expense belongs to.
    #[ts(as = "String")]
    pub competence_date: NaiveDate,

    /// Date the money actually moves.
    #[ts(as = "String")]
    pub due_date: NaiveDate,

    pub status: TransactionStatus,

    /// Originating sale, for entries derived from a sale.
    pub sale_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl FinancialTransaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Amount with the sign of its direction (expenses negative).
    pub fn signed_amount(&self) -> Money {
        match self.transaction_type {
            TransactionType::Revenue => self.amount(),
            TransactionType::Expense => Money::zero() - self.amount(),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Workshop-wide settings (a single row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BusinessSettings {
    /// Cost of one hour of labor, used by the product cost sheet.
    pub hourly_labor_rate_cents: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BusinessSettings {
    #[inline]
    pub fn hourly_labor_rate(&self) -> Money {
        Money::from_cents(self.hourly_labor_rate_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
