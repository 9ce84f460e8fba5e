//! # Purchase Processor
//!
//! Books a supplier purchase: spreads the freight over the lines, adds the
//! bought quantities to material stock and reprices each material at the
//! effective unit cost it was just bought for.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_purchase(NewPurchase)                         │
//! │                                                                         │
//! │  validate_new_purchase           (before BEGIN)                         │
//! │  lock_and_read each material     sorted by id, once each                │
//! │  stock + incoming                overflow → InvalidQuantity             │
//! │  prorate_freight                 largest remainder, Σ shares == freight │
//! │  INSERT purchase + purchase_items                                       │
//! │  for each line, in entry order:                                         │
//! │      adjust material +quantity                                          │
//! │      current_cost = effective_unit_cost  (later lines win)              │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use tallybook_core::proration::{prorate_freight, ProrationLine};
use tallybook_core::validation::validate_new_purchase;
use tallybook_core::{NewPurchase, Purchase, PurchaseItem, Quantity, StockKind, ValidationError};

use crate::error::DbError;
use crate::ledger;
use crate::processor::{finish, ProcessResult};
use crate::repository::material::set_current_cost_in;
use crate::repository::purchase::{self as purchases, PurchaseRecord};

#[derive(Debug, Clone)]
pub struct PurchaseProcessor {
    pool: SqlitePool,
}

impl PurchaseProcessor {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseProcessor { pool }
    }

    /// Books a purchase in one transaction.
    ///
    /// ## Errors
    /// - `InvalidInput` / `InvalidQuantity`: malformed payload, or amounts and
    ///   stock too large to represent; nothing written
    /// - `NotFound`: unknown material
    /// - `Internal`: storage failure or lock timeout
    pub async fn create_purchase(&self, new: &NewPurchase) -> ProcessResult<PurchaseRecord> {
        validate_new_purchase(new)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = record(&mut tx, new).await;
        let record = finish(tx, result).await?;

        info!(
            purchase_id = %record.purchase.id,
            lines = record.items.len(),
            freight = %record.purchase.freight_cost(),
            total = %record.purchase.total_amount(),
            "Purchase recorded"
        );

        Ok(record)
    }
}

async fn record(conn: &mut SqliteConnection, new: &NewPurchase) -> ProcessResult<PurchaseRecord> {
    let mut incoming: BTreeMap<&str, Quantity> = BTreeMap::new();
    for (i, line) in new.lines.iter().enumerate() {
        let entry = incoming.entry(line.material_id.as_str()).or_default();
        *entry = entry
            .checked_add(line.quantity)
            .ok_or_else(|| ValidationError::quantity_too_large(format!("lines[{i}].quantity")))?;
    }
    for (&material_id, &quantity) in &incoming {
        let locked = ledger::lock_and_read(conn, StockKind::Material, material_id).await?;
        if locked.available.checked_add(quantity).is_none() {
            return Err(ValidationError::quantity_too_large("lines.quantity").into());
        }
    }

    let proration_lines: Vec<ProrationLine> = new
        .lines
        .iter()
        .map(|line| ProrationLine {
            quantity: line.quantity,
            unit_cost: line.unit_cost,
        })
        .collect();
    let proration = prorate_freight(&proration_lines, new.freight_cost)?;

    let purchase = Purchase {
        id: Uuid::new_v4().to_string(),
        supplier: new
            .supplier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        purchase_date: new.purchase_date,
        freight_cost_cents: proration.freight.cents(),
        total_amount_cents: proration.total().cents(),
        created_at: Utc::now(),
    };

    let items: Vec<PurchaseItem> = new
        .lines
        .iter()
        .zip(&proration.lines)
        .map(|(line, prorated)| PurchaseItem {
            id: Uuid::new_v4().to_string(),
            purchase_id: purchase.id.clone(),
            material_id: line.material_id.clone(),
            quantity_milli: line.quantity.milli(),
            unit_cost_cents: line.unit_cost.cents(),
            freight_share_cents: prorated.freight_share.cents(),
            effective_unit_cost_cents: prorated.effective_unit_cost.cents(),
        })
        .collect();

    purchases::insert_in(conn, &purchase).await?;
    for (position, item) in items.iter().enumerate() {
        purchases::insert_item_in(conn, item, position).await?;
    }

    for item in &items {
        ledger::adjust(conn, StockKind::Material, &item.material_id, item.quantity()).await?;
        set_current_cost_in(conn, &item.material_id, item.effective_unit_cost()).await?;
    }

    Ok(PurchaseRecord { purchase, items })
}
