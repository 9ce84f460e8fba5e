//! # Input Payloads
//!
//! What callers hand to the processors and repositories. These are
//! deserialized by the request layer and checked by [`crate::validation`]
//! before any transaction is opened.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Rate};
use crate::quantity::Quantity;
use crate::types::{TransactionStatus, TransactionType, UnitOfMeasure};
use crate::validation::ValidationResult;

// =============================================================================
// Processor Inputs
// =============================================================================

/// One line of a sale. Any client-computed subtotal is not accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub payment_method_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub lines: Vec<NewSaleLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchaseLine {
    pub material_id: String,
    pub quantity: Quantity,
    pub unit_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPurchase {
    pub supplier: Option<String>,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
    pub freight_cost: Money,
    pub lines: Vec<NewPurchaseLine>,
}

/// A production run: turn materials into `quantity` units of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduction {
    pub product_id: String,
    pub quantity: Quantity,
}

impl NewProduction {
    /// Builds a production request from an operator-typed quantity such as
    /// `"2.5"`. Anything that is not a positive decimal with at most three
    /// decimal places is rejected with [`ValidationError::InvalidQuantity`].
    pub fn from_text(product_id: impl Into<String>, quantity: &str) -> ValidationResult<Self> {
        Ok(NewProduction {
            product_id: product_id.into(),
            quantity: Quantity::parse_positive("quantity", quantity)?,
        })
    }
}

// =============================================================================
// Catalog Inputs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCategory {
    pub name: String,
}

/// Editable material fields. Stock is not among them: after creation it
/// only moves through purchases and production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaterialDetails {
    pub name: String,
    pub unit: UnitOfMeasure,
    pub current_cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMaterial {
    #[serde(flatten)]
    #[ts(flatten)]
    pub details: MaterialDetails,
    /// Opening stock (may be zero).
    pub initial_stock: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCompositionLine {
    pub material_id: String,
    /// Material needed per unit of product.
    pub quantity: Quantity,
}

/// Editable product fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDetails {
    pub name: String,
    pub sku: Option<String>,
    pub category_id: Option<String>,
    pub acquisition_price: Money,
    pub labor_time_minutes: i64,
    pub profit_margin: Rate,
    pub sale_price: Money,
}

impl ProductDetails {
    /// A product with only a name and price; margin defaults to 50%.
    pub fn named(name: impl Into<String>, sale_price: Money) -> Self {
        ProductDetails {
            name: name.into(),
            sku: None,
            category_id: None,
            acquisition_price: Money::zero(),
            labor_time_minutes: 0,
            profit_margin: Rate::from_bps(crate::costing::DEFAULT_PROFIT_MARGIN_BPS),
            sale_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    #[serde(flatten)]
    #[ts(flatten)]
    pub details: ProductDetails,
    pub initial_stock: Quantity,
    /// Bill of materials; empty for resale items.
    pub composition: Vec<NewCompositionLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPaymentMethod {
    pub name: String,
    pub fee_rate: Rate,
}

// =============================================================================
// Cash-Book Inputs
// =============================================================================

/// A manually recorded cash-book entry (rent, utilities, a cash sale made
/// outside the system).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLedgerEntry {
    pub description: String,
    pub amount: Money,
    pub transaction_type: TransactionType,
    #[ts(as = "String")]
    pub competence_date: NaiveDate,
    /// Defaults to the competence date.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: TransactionStatus,
}

impl NewLedgerEntry {
    pub fn effective_due_date(&self) -> NaiveDate {
        self.due_date.unwrap_or(self.competence_date)
    }
}

/// Inclusive competence-date window for cash-book listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn check(&self) -> ValidationResult<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ValidationError::InvalidFormat {
                    field: "end".to_string(),
                    reason: "must not be before start".to_string(),
                });
            }
        }
        Ok(())
    }
}
