//! # Production Processor
//!
//! Turns raw materials into finished products following the product's bill
//! of materials.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    produce(NewProduction)                               │
//! │                                                                         │
//! │  lock_and_read product           existence                              │
//! │  composition_in(product)         empty → warn, no consumption           │
//! │  for each line (by material id):                                        │
//! │      lock_and_read material                                             │
//! │      required = line.quantity × produced    overflow → InvalidQuantity  │
//! │      available < required → InsufficientStock, nothing written          │
//! │  adjust materials by -required                                          │
//! │  adjust product   by +produced                                          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use tallybook_core::stock::ensure_available;
use tallybook_core::validation::validate_new_production;
use tallybook_core::{NewProduction, Quantity, StockKind, UnitOfMeasure, ValidationError};

use crate::error::DbError;
use crate::ledger;
use crate::processor::{finish, ProcessResult};
use crate::repository::product::composition_in;

/// How much of one material a production run used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialConsumption {
    pub material_id: String,
    pub material_name: String,
    pub unit: UnitOfMeasure,
    pub consumed: Quantity,
    /// Stock left after the run.
    pub remaining: Quantity,
}

/// What a committed production run changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionReport {
    pub product_id: String,
    pub product_name: String,
    pub produced: Quantity,
    /// Product stock after the run.
    pub new_stock: Quantity,
    pub consumption: Vec<MaterialConsumption>,
}

#[derive(Debug, Clone)]
pub struct ProductionProcessor {
    pool: SqlitePool,
}

impl ProductionProcessor {
    pub fn new(pool: SqlitePool) -> Self {
        ProductionProcessor { pool }
    }

    /// Runs a production in one transaction.
    ///
    /// ## Errors
    /// - `InvalidQuantity`: produced quantity not positive, or a requirement
    ///   or the resulting stock too large to represent
    /// - `NotFound`: unknown product
    /// - `InsufficientStock`: the first material (by id) that falls short
    /// - `Internal`: storage failure or lock timeout
    pub async fn produce(&self, run: &NewProduction) -> ProcessResult<ProductionReport> {
        validate_new_production(run)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let result = record(&mut tx, run).await;
        let report = finish(tx, result).await?;

        info!(
            product_id = %report.product_id,
            produced = %report.produced,
            new_stock = %report.new_stock,
            materials = report.consumption.len(),
            "Production recorded"
        );

        Ok(report)
    }
}

async fn record(conn: &mut SqliteConnection, run: &NewProduction) -> ProcessResult<ProductionReport> {
    let product = ledger::lock_and_read(conn, StockKind::Product, &run.product_id).await?;
    let new_stock = product
        .available
        .checked_add(run.quantity)
        .ok_or_else(|| ValidationError::quantity_too_large("quantity"))?;

    let mut composition = composition_in(conn, &run.product_id).await?;
    if composition.is_empty() {
        warn!(
            product_id = %product.id,
            "Product has no composition; producing without consuming materials"
        );
    }
    composition.sort_by(|a, b| a.material_id.cmp(&b.material_id));

    let mut consumption = Vec::with_capacity(composition.len());
    for line in &composition {
        let locked = ledger::lock_and_read(conn, StockKind::Material, &line.material_id).await?;
        let required = line
            .quantity()
            .checked_times(run.quantity)
            .ok_or_else(|| ValidationError::quantity_too_large("quantity"))?;
        if required.is_zero() {
            warn!(
                product_id = %product.id,
                material_id = %locked.id,
                per_unit = %line.quantity(),
                produced = %run.quantity,
                "Material requirement rounds to zero; nothing consumed"
            );
        }
        ensure_available(locked.kind, &locked.id, &locked.name, locked.available, required)?;

        consumption.push(MaterialConsumption {
            material_id: locked.id,
            material_name: locked.name,
            unit: line.material_unit,
            consumed: required,
            remaining: locked.available - required,
        });
    }

    for used in &consumption {
        ledger::adjust(conn, StockKind::Material, &used.material_id, -used.consumed).await?;
    }
    ledger::adjust(conn, StockKind::Product, &product.id, run.quantity).await?;

    Ok(ProductionReport {
        product_id: product.id,
        product_name: product.name,
        produced: run.quantity,
        new_stock,
        consumption,
    })
}
