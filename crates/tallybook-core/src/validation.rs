//! # Validation Module
//!
//! Input validation for Tallybook payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer                                                 │
//! │  └── Type validation (deserialization into New* payloads)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any transaction opens)                    │
//! │  ├── Non-empty line lists, positive quantities                          │
//! │  ├── Non-negative money, rates within 0-100%                            │
//! │  └── Text lengths, id format                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Processor (inside the transaction)                            │
//! │  └── Stock availability, reference existence                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                             │
//! │  ├── CHECK (stock_milli >= 0) and friends                               │
//! │  ├── UNIQUE constraints                                                 │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tallybook_core::validation::{validate_sku, validate_quantity};
//! use tallybook_core::Quantity;
//!
//! validate_sku("CHAIR-01").unwrap();
//! validate_quantity("quantity", Quantity::from_units(5)).unwrap();
//! ```

use crate::error::ValidationError;
use crate::input::{
    MaterialDetails, NewCategory, NewCompositionLine, NewLedgerEntry, NewMaterial,
    NewPaymentMethod, NewProduct, NewProduction, NewPurchase, NewSale, ProductDetails,
};
use crate::money::{Money, Rate};
use crate::quantity::Quantity;
use crate::MAX_LINE_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// Text limits, matching the column sizes of the back-office forms.
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_SKU_LEN: usize = 50;
pub const MAX_SUPPLIER_LEN: usize = 100;
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_PAYMENT_METHOD_NAME_LEN: usize = 50;
pub const MAX_CATEGORY_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use tallybook_core::validation::validate_sku;
///
/// assert!(validate_sku("MUG-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a required, length-limited text field.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_optional_text(field, Some(value), max)
}

/// Validates an optional, length-limited text field. Length counts
/// characters, not bytes.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(value) if value.trim().chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a phone number: digits plus `+ - ( )` and spaces.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    validate_optional_text("customer_phone", Some(phone), MAX_PHONE_LEN)?;

    if !phone
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '))
    {
        return Err(ValidationError::InvalidFormat {
            field: "customer_phone".to_string(),
            reason: "must contain only digits, spaces and + - ( )".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a quantity is strictly positive.
///
/// ## Example
/// ```rust
/// use tallybook_core::validation::validate_quantity;
/// use tallybook_core::Quantity;
///
/// assert!(validate_quantity("quantity", Quantity::from_milli(1)).is_ok());
/// assert!(validate_quantity("quantity", Quantity::zero()).is_err());
/// ```
pub fn validate_quantity(field: &str, quantity: Quantity) -> ValidationResult<()> {
    if !quantity.is_positive() {
        return Err(ValidationError::InvalidQuantity {
            field: field.to_string(),
            reason: format!("must be greater than zero, got {}", quantity),
        });
    }
    Ok(())
}

/// Validates a stock quantity that may be zero (opening stock).
pub fn validate_stock(field: &str, quantity: Quantity) -> ValidationResult<()> {
    if quantity.is_negative() {
        return Err(ValidationError::InvalidQuantity {
            field: field.to_string(),
            reason: format!("must not be negative, got {}", quantity),
        });
    }
    Ok(())
}

/// Validates a price or cost.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, donated material)
///
/// ## Example
/// ```rust
/// use tallybook_core::validation::validate_amount;
/// use tallybook_core::Money;
///
/// assert!(validate_amount("price", Money::from_cents(1099)).is_ok());
/// assert!(validate_amount("price", Money::zero()).is_ok());
/// assert!(validate_amount("price", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a cash-book amount, which must be strictly positive.
pub fn validate_entry_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage rate.
///
/// ## Rules
/// - Must be between 0 and 10000 bps (0% to 100%)
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate.bps() > Rate::FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Rate::FULL_BPS as i64,
        });
    }

    Ok(())
}

/// Validates a profit margin. Margins above 100% are allowed (handmade
/// goods often carry 200-300%), negative margins are not representable.
pub fn validate_margin(field: &str, rate: Rate) -> ValidationResult<()> {
    const MAX_MARGIN_BPS: u32 = 100_000;

    if rate.bps() > MAX_MARGIN_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MARGIN_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on a sale or purchase.
///
/// ## Rules
/// - At least one line
/// - At most MAX_LINE_ITEMS (100)
pub fn validate_line_count(field: &str, count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use tallybook_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Structural checks on a sale. Stock and references are checked later,
/// inside the transaction.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_uuid("payment_method_id", &sale.payment_method_id)?;
    validate_optional_text("customer_name", sale.customer_name.as_deref(), MAX_CUSTOMER_NAME_LEN)?;
    if let Some(phone) = sale.customer_phone.as_deref() {
        validate_phone(phone)?;
    }

    validate_line_count("lines", sale.lines.len())?;
    for (i, line) in sale.lines.iter().enumerate() {
        validate_uuid(&format!("lines[{i}].product_id"), &line.product_id)?;
        validate_quantity(&format!("lines[{i}].quantity"), line.quantity)?;
        validate_amount(&format!("lines[{i}].unit_price"), line.unit_price)?;
    }

    Ok(())
}

pub fn validate_new_purchase(purchase: &NewPurchase) -> ValidationResult<()> {
    validate_optional_text("supplier", purchase.supplier.as_deref(), MAX_SUPPLIER_LEN)?;
    validate_amount("freight_cost", purchase.freight_cost)?;

    validate_line_count("lines", purchase.lines.len())?;
    for (i, line) in purchase.lines.iter().enumerate() {
        validate_uuid(&format!("lines[{i}].material_id"), &line.material_id)?;
        validate_quantity(&format!("lines[{i}].quantity"), line.quantity)?;
        validate_amount(&format!("lines[{i}].unit_cost"), line.unit_cost)?;
    }

    Ok(())
}

pub fn validate_new_production(run: &NewProduction) -> ValidationResult<()> {
    validate_uuid("product_id", &run.product_id)?;
    validate_quantity("quantity", run.quantity)
}

pub fn validate_new_category(category: &NewCategory) -> ValidationResult<()> {
    validate_required_text("name", &category.name, MAX_CATEGORY_NAME_LEN)
}

pub fn validate_material_details(material: &MaterialDetails) -> ValidationResult<()> {
    validate_required_text("name", &material.name, MAX_NAME_LEN)?;
    validate_amount("current_cost", material.current_cost)
}

pub fn validate_new_material(material: &NewMaterial) -> ValidationResult<()> {
    validate_material_details(&material.details)?;
    validate_stock("initial_stock", material.initial_stock)
}

pub fn validate_product_details(product: &ProductDetails) -> ValidationResult<()> {
    validate_required_text("name", &product.name, MAX_NAME_LEN)?;
    if let Some(sku) = product.sku.as_deref() {
        validate_sku(sku)?;
    }
    if let Some(category_id) = product.category_id.as_deref() {
        validate_uuid("category_id", category_id)?;
    }
    validate_amount("acquisition_price", product.acquisition_price)?;
    validate_amount("sale_price", product.sale_price)?;
    validate_margin("profit_margin", product.profit_margin)?;

    if product.labor_time_minutes < 0 {
        return Err(ValidationError::OutOfRange {
            field: "labor_time_minutes".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// A bill of materials: positive quantities, each material at most once.
pub fn validate_composition(lines: &[NewCompositionLine]) -> ValidationResult<()> {
    let mut seen = std::collections::HashSet::new();

    for (i, line) in lines.iter().enumerate() {
        validate_uuid(&format!("composition[{i}].material_id"), &line.material_id)?;
        validate_quantity(&format!("composition[{i}].quantity"), line.quantity)?;

        if !seen.insert(line.material_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "composition.material_id".to_string(),
                value: line.material_id.clone(),
            });
        }
    }

    Ok(())
}

pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_details(&product.details)?;
    validate_stock("initial_stock", product.initial_stock)?;
    validate_composition(&product.composition)
}

pub fn validate_new_payment_method(method: &NewPaymentMethod) -> ValidationResult<()> {
    validate_required_text("name", &method.name, MAX_PAYMENT_METHOD_NAME_LEN)?;
    validate_rate("fee_rate", method.fee_rate)
}

pub fn validate_new_ledger_entry(entry: &NewLedgerEntry) -> ValidationResult<()> {
    validate_required_text("description", &entry.description, MAX_DESCRIPTION_LEN)?;
    validate_entry_amount(entry.amount)?;

    if entry.effective_due_date() < entry.competence_date {
        return Err(ValidationError::InvalidFormat {
            field: "due_date".to_string(),
            reason: "must not be before the competence date".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NewPurchaseLine, NewSaleLine};
    use crate::types::{TransactionStatus, TransactionType};
    use chrono::NaiveDate;

    const PM: &str = "550e8400-e29b-41d4-a716-446655440000";
    const PRODUCT: &str = "6ba7b810-9dad-41d1-80b4-00c04fd430c8";

    fn sale(lines: Vec<NewSaleLine>) -> NewSale {
        NewSale {
            payment_method_id: PM.to_string(),
            customer_name: Some("Maria".to_string()),
            customer_phone: Some("+55 (11) 99999-0000".to_string()),
            lines,
        }
    }

    fn sale_line(quantity: Quantity, unit_price_cents: i64) -> NewSaleLine {
        NewSaleLine {
            product_id: PRODUCT.to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("MUG-330").is_ok());
        assert!(validate_sku("chair_01").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_text_length_counts_characters() {
        // 100 two-byte characters are within a 100 character limit
        assert!(validate_required_text("name", &"é".repeat(100), 100).is_ok());
        assert!(validate_required_text("name", &"é".repeat(101), 100).is_err());
        assert!(validate_required_text("name", "  ", 100).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+55 (11) 99999-0000").is_ok());
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone(&"1".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_sale() {
        assert!(validate_new_sale(&sale(vec![sale_line(Quantity::from_units(2), 2000)])).is_ok());

        let err = validate_new_sale(&sale(vec![])).unwrap_err();
        assert_eq!(err, ValidationError::Required { field: "lines".to_string() });

        let err = validate_new_sale(&sale(vec![sale_line(Quantity::zero(), 2000)])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQuantity { ref field, .. } if field == "lines[0].quantity"));

        let err = validate_new_sale(&sale(vec![sale_line(Quantity::from_units(1), -1)])).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        let too_many = (0..=MAX_LINE_ITEMS)
            .map(|_| sale_line(Quantity::from_units(1), 100))
            .collect();
        assert!(validate_new_sale(&sale(too_many)).is_err());
    }

    #[test]
    fn test_validate_purchase() {
        let purchase = NewPurchase {
            supplier: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            freight_cost: Money::from_cents(-1),
            lines: vec![NewPurchaseLine {
                material_id: PRODUCT.to_string(),
                quantity: Quantity::from_units(1),
                unit_cost: Money::zero(),
            }],
        };
        assert!(validate_new_purchase(&purchase).is_err());

        let purchase = NewPurchase {
            freight_cost: Money::zero(),
            ..purchase
        };
        assert!(validate_new_purchase(&purchase).is_ok());
    }

    #[test]
    fn test_validate_composition_rejects_duplicates() {
        let line = NewCompositionLine {
            material_id: PRODUCT.to_string(),
            quantity: Quantity::from_units(2),
        };
        assert!(validate_composition(&[line.clone()]).is_ok());

        let err = validate_composition(&[line.clone(), line]).unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { .. }));
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate("fee_rate", Rate::zero()).is_ok());
        assert!(validate_rate("fee_rate", Rate::from_bps(10_000)).is_ok());
        assert!(validate_rate("fee_rate", Rate::from_bps(10_001)).is_err());
        assert!(validate_margin("profit_margin", Rate::from_bps(30_000)).is_ok());
    }

    #[test]
    fn test_validate_ledger_entry() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
        let entry = NewLedgerEntry {
            description: "Workshop rent".to_string(),
            amount: Money::from_cents(80_000),
            transaction_type: TransactionType::Expense,
            competence_date: day(5),
            due_date: Some(day(10)),
            status: TransactionStatus::Pending,
        };
        assert!(validate_new_ledger_entry(&entry).is_ok());

        let early = NewLedgerEntry { due_date: Some(day(1)), ..entry.clone() };
        assert!(validate_new_ledger_entry(&early).is_err());

        let zero = NewLedgerEntry { amount: Money::zero(), ..entry };
        assert!(validate_new_ledger_entry(&zero).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", PM).is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}
