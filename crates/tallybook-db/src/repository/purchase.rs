//! # Purchase Repository
//!
//! Purchase history. Purchases are written only by
//! [`crate::processor::purchase::PurchaseProcessor`]; this module exposes the
//! reads and the insert helpers it runs inside its transaction.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use tallybook_core::{Purchase, PurchaseItem};

use crate::error::DbResult;

/// A purchase header with its lines, in entry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Lists purchase headers, newest purchase date first.
    pub async fn list(&self) -> DbResult<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, supplier, purchase_date, freight_cost_cents, total_amount_cents, created_at
            FROM purchases
            ORDER BY purchase_date DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = purchases.len(), "Listed purchases");
        Ok(purchases)
    }

    /// Gets a purchase with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<PurchaseRecord>> {
        let mut conn = self.pool.acquire().await?;

        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, supplier, purchase_date, freight_cost_cents, total_amount_cents, created_at
            FROM purchases
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(purchase) = purchase else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, PurchaseItem>(
            r#"
            SELECT
                id, purchase_id, material_id, quantity_milli, unit_cost_cents,
                freight_share_cents, effective_unit_cost_cents
            FROM purchase_items
            WHERE purchase_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(PurchaseRecord { purchase, items }))
    }
}

pub(crate) async fn insert_in(conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<()> {
    debug!(id = %purchase.id, total = purchase.total_amount_cents, "Inserting purchase");

    sqlx::query(
        r#"
        INSERT INTO purchases (
            id, supplier, purchase_date, freight_cost_cents, total_amount_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&purchase.id)
    .bind(&purchase.supplier)
    .bind(purchase.purchase_date)
    .bind(purchase.freight_cost_cents)
    .bind(purchase.total_amount_cents)
    .bind(purchase.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item_in(
    conn: &mut SqliteConnection,
    item: &PurchaseItem,
    position: usize,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO purchase_items (
            id, purchase_id, material_id, position, quantity_milli, unit_cost_cents,
            freight_share_cents, effective_unit_cost_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.purchase_id)
    .bind(&item.material_id)
    .bind(position as i64)
    .bind(item.quantity_milli)
    .bind(item.unit_cost_cents)
    .bind(item.freight_share_cents)
    .bind(item.effective_unit_cost_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
