//! # Sale Processor
//!
//! Records a sale, takes the sold quantities out of product stock and adds
//! the revenue, net of the payment method's fee, to the cash-book.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_sale(NewSale)                              │
//! │                                                                         │
//! │  1. validate_new_sale            (before BEGIN)                         │
//! │  2. demand, subtotals, total     Mug: 2 + 1 = 3; overflow → rejected   │
//! │  3. lock_and_read each product   sorted by id; all checked first        │
//! │  4. resolve payment method       missing → NotFound, rolled back        │
//! │  5. INSERT sale + sale_items                                            │
//! │  6. adjust products by -demand                                          │
//! │  7. settle_sale                  fee, net, paid/pending, due date       │
//! │  8. INSERT financial_transaction revenue = net                          │
//! │  9. COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are not idempotent: submitting the same payload twice records two
//! sales and takes the stock out twice.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use tallybook_core::settlement::{describe_sale_revenue, settle_sale};
use tallybook_core::stock::ensure_available;
use tallybook_core::validation::validate_new_sale;
use tallybook_core::{
    FinancialTransaction, Money, NewSale, Quantity, Sale, SaleItem, SaleStatus, Settlement,
    SettlementPolicy, StockKind, TransactionType, ValidationError,
};

use crate::error::DbError;
use crate::ledger;
use crate::processor::{finish, ProcessResult};
use crate::repository::{finance, payment_method, sale as sales};

/// What a committed sale produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    /// The revenue entry, net of fees.
    pub transaction: FinancialTransaction,
    pub settlement: Settlement,
}

#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
    policy: SettlementPolicy,
}

impl SaleProcessor {
    pub fn new(pool: SqlitePool, policy: SettlementPolicy) -> Self {
        SaleProcessor { pool, policy }
    }

    /// Records a sale in one transaction.
    ///
    /// ## Errors
    /// - `InvalidInput` / `InvalidQuantity`: malformed payload, or a demand,
    ///   subtotal or total too large to represent; nothing written
    /// - `InsufficientStock`: the first product (by id) that falls short
    /// - `NotFound`: unknown product or payment method
    /// - `Internal`: storage failure or lock timeout
    pub async fn create_sale(&self, new: &NewSale) -> ProcessResult<SaleReceipt> {
        validate_new_sale(new)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = self.record(&mut tx, new).await;
        let receipt = finish(tx, result).await?;

        info!(
            sale_id = %receipt.sale.id,
            lines = receipt.items.len(),
            total = %receipt.settlement.total,
            fee = %receipt.settlement.fee,
            net = %receipt.settlement.net,
            status = ?receipt.settlement.status,
            "Sale recorded"
        );

        Ok(receipt)
    }

    async fn record(&self, conn: &mut SqliteConnection, new: &NewSale) -> ProcessResult<SaleReceipt> {
        let mut demand: BTreeMap<&str, Quantity> = BTreeMap::new();
        for (i, line) in new.lines.iter().enumerate() {
            let entry = demand.entry(line.product_id.as_str()).or_default();
            *entry = entry
                .checked_add(line.quantity)
                .ok_or_else(|| ValidationError::quantity_too_large(format!("lines[{i}].quantity")))?;
        }

        let sale_id = Uuid::new_v4().to_string();
        let mut items = Vec::with_capacity(new.lines.len());
        for (i, line) in new.lines.iter().enumerate() {
            let subtotal = line
                .unit_price
                .checked_times(line.quantity)
                .ok_or_else(|| ValidationError::amount_too_large(format!("lines[{i}].subtotal")))?;
            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                quantity_milli: line.quantity.milli(),
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: subtotal.cents(),
            });
        }
        let total = Money::checked_sum(items.iter().map(SaleItem::subtotal))
            .ok_or_else(|| ValidationError::amount_too_large("total"))?;

        for (&product_id, &requested) in &demand {
            let locked = ledger::lock_and_read(conn, StockKind::Product, product_id).await?;
            ensure_available(locked.kind, &locked.id, &locked.name, locked.available, requested)?;
        }

        let method = payment_method::get_in(conn, &new.payment_method_id)
            .await?
            .ok_or_else(|| DbError::not_found("PaymentMethod", &new.payment_method_id))?;

        let sold_at = Utc::now();

        let sale = Sale {
            id: sale_id,
            payment_method_id: method.id.clone(),
            customer_name: non_blank(new.customer_name.as_deref()),
            customer_phone: non_blank(new.customer_phone.as_deref()),
            total_amount_cents: total.cents(),
            status: SaleStatus::Completed,
            created_at: sold_at,
        };

        sales::insert_in(conn, &sale).await?;
        for (position, item) in items.iter().enumerate() {
            sales::insert_item_in(conn, item, position).await?;
        }

        for (&product_id, &quantity) in &demand {
            ledger::adjust(conn, StockKind::Product, product_id, -quantity).await?;
        }

        let settlement = settle_sale(&self.policy, total, &method, sold_at)?;
        let transaction = FinancialTransaction {
            id: Uuid::new_v4().to_string(),
            description: describe_sale_revenue(
                &sale.id,
                sale.customer_name.as_deref(),
                settlement.fee_rate,
                settlement.fee,
            ),
            amount_cents: settlement.net.cents(),
            transaction_type: TransactionType::Revenue,
            competence_date: settlement.competence_date,
            due_date: settlement.due_date,
            status: settlement.status,
            sale_id: Some(sale.id.clone()),
            created_at: sold_at,
        };
        finance::insert_in(conn, &transaction).await?;

        Ok(SaleReceipt {
            sale,
            items,
            transaction,
            settlement,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
