//! # Stock Ledger
//!
//! The only code that touches `materials.stock_milli` and
//! `products.stock_milli` after a row is created.
//!
//! ## Lock-Then-Adjust
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  lock_and_read(kind, id)                                                │
//! │    UPDATE <table> SET stock_milli = stock_milli WHERE id = ?            │
//! │      → takes the SQLite write lock (held until COMMIT/ROLLBACK);        │
//! │        a concurrent writer waits here, up to the busy timeout           │
//! │    SELECT name, stock_milli FROM <table> WHERE id = ?                   │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  caller checks available >= requested for every row                     │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  adjust(kind, id, delta)                                                │
//! │    UPDATE <table> SET stock_milli = stock_milli + ? WHERE id = ?        │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite has no row-level `SELECT ... FOR UPDATE`; the no-op update is the
//! equivalent, and it is coarser (the whole database), not finer. A
//! processor must make a lock-read its first statement inside the
//! transaction: a deferred transaction that has already read cannot wait
//! for the lock and would fail instead.
//!
//! `adjust` never clamps. The `CHECK (stock_milli >= 0)` column constraint
//! turns a missed availability check into an error instead of negative
//! stock.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use tallybook_core::{Quantity, StockKind};

use crate::error::{DbError, DbResult};

/// A stock row read under the write lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedStock {
    pub kind: StockKind,
    pub id: String,
    pub name: String,
    pub available: Quantity,
}

fn table(kind: StockKind) -> &'static str {
    match kind {
        StockKind::Material => "materials",
        StockKind::Product => "products",
    }
}

fn entity(kind: StockKind) -> &'static str {
    match kind {
        StockKind::Material => "Material",
        StockKind::Product => "Product",
    }
}

/// Acquires the write lock for the enclosing transaction and returns the
/// row's current stock.
///
/// ## Errors
/// - `DbError::NotFound` if no row has this id
/// - `DbError::LockTimeout` if another transaction held the lock longer
///   than the busy timeout
pub async fn lock_and_read(
    conn: &mut SqliteConnection,
    kind: StockKind,
    id: &str,
) -> DbResult<LockedStock> {
    debug!(kind = %kind, id = %id, "Locking stock row");

    let touch = format!(
        "UPDATE {} SET stock_milli = stock_milli WHERE id = ?1",
        table(kind)
    );
    let result = sqlx::query(&touch).bind(id).execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(entity(kind), id));
    }

    let read = format!("SELECT name, stock_milli FROM {} WHERE id = ?1", table(kind));
    let (name, stock_milli): (String, i64) = sqlx::query_as(&read)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(LockedStock {
        kind,
        id: id.to_string(),
        name,
        available: Quantity::from_milli(stock_milli),
    })
}

/// Applies `stock_milli = stock_milli + delta` to one row.
///
/// ## Errors
/// - `DbError::NotFound` if no row has this id
/// - `DbError::ConstraintViolation` if the result would be negative
pub async fn adjust(
    conn: &mut SqliteConnection,
    kind: StockKind,
    id: &str,
    delta: Quantity,
) -> DbResult<()> {
    debug!(kind = %kind, id = %id, delta = %delta, "Adjusting stock");

    let sql = format!(
        "UPDATE {} SET stock_milli = stock_milli + ?2, updated_at = ?3 WHERE id = ?1",
        table(kind)
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(delta.milli())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(entity(kind), id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
