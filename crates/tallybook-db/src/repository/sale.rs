//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  SaleProcessor::create_sale (one transaction)                           │
//! │     ├── insert_in()       → Sale { status: Completed }                  │
//! │     ├── insert_item_in()  → SaleItem (subtotal recomputed)              │
//! │     ├── insert_item_in()  → SaleItem                                    │
//! │     └── finance::insert_in() → FinancialTransaction (net of fee)        │
//! │                                                                         │
//! │  Afterwards, read-only:                                                 │
//! │     ├── list()  newest first                                            │
//! │     └── get()   header + items                                          │
//! │                                                                         │
//! │  Sales are never edited or voided here.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use tallybook_core::{Sale, SaleItem};

use crate::error::DbResult;

const SELECT_SALE: &str = r#"
    SELECT
        id, payment_method_id, customer_name, customer_phone,
        total_amount_cents, status, created_at
    FROM sales
"#;

/// A sale header with its items, in entry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sale headers, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Gets a sale with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity_milli, unit_price_cents, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Number of recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total = sale.total_amount_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, payment_method_id, customer_name, customer_phone,
            total_amount_cents, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.payment_method_id)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(sale.total_amount_cents)
    .bind(sale.status)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one sale line. `position` preserves the order of entry.
pub(crate) async fn insert_item_in(
    conn: &mut SqliteConnection,
    item: &SaleItem,
    position: usize,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, position, quantity_milli, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(position as i64)
    .bind(item.quantity_milli)
    .bind(item.unit_price_cents)
    .bind(item.subtotal_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
