//! # Finance Repository
//!
//! The cash-book: one row per money movement. Sales add their revenue here
//! through the sale processor; everything else (rent, utilities, supplier
//! bills) is recorded manually with [`FinanceRepository::record`].
//!
//! Amounts are stored as positive magnitudes. The direction is carried by
//! `transaction_type`, not by the sign.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tallybook_core::validation::validate_new_ledger_entry;
use tallybook_core::{DateRange, FinancialTransaction, NewLedgerEntry};

use crate::error::DbResult;

const SELECT_TRANSACTION: &str = r#"
    SELECT
        id, description, amount_cents, transaction_type, competence_date,
        due_date, status, sale_id, created_at
    FROM financial_transactions
"#;

#[derive(Debug, Clone)]
pub struct FinanceRepository {
    pool: SqlitePool,
}

impl FinanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FinanceRepository { pool }
    }

    /// Records a manual cash-book entry. The due date defaults to the
    /// competence date.
    pub async fn record(&self, entry: &NewLedgerEntry) -> DbResult<FinancialTransaction> {
        validate_new_ledger_entry(entry)?;

        let transaction = FinancialTransaction {
            id: Uuid::new_v4().to_string(),
            description: entry.description.trim().to_string(),
            amount_cents: entry.amount.cents(),
            transaction_type: entry.transaction_type,
            competence_date: entry.competence_date,
            due_date: entry.effective_due_date(),
            status: entry.status,
            sale_id: None,
            created_at: Utc::now(),
        };

        let mut conn = self.pool.acquire().await?;
        insert_in(&mut conn, &transaction).await?;

        Ok(transaction)
    }

    /// Lists entries whose competence date falls in `range` (both ends
    /// inclusive, either may be open), newest first.
    pub async fn list(&self, range: DateRange) -> DbResult<Vec<FinancialTransaction>> {
        range.check()?;

        let transactions = sqlx::query_as::<_, FinancialTransaction>(&format!(
            r#"
            {SELECT_TRANSACTION}
            WHERE (?1 IS NULL OR competence_date >= ?1)
              AND (?2 IS NULL OR competence_date <= ?2)
            ORDER BY competence_date DESC, created_at DESC
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = transactions.len(), start = ?range.start, end = ?range.end, "Listed transactions");
        Ok(transactions)
    }

    /// The revenue entry a sale produced, if any.
    pub async fn get_for_sale(&self, sale_id: &str) -> DbResult<Option<FinancialTransaction>> {
        let transaction = sqlx::query_as::<_, FinancialTransaction>(&format!(
            "{SELECT_TRANSACTION} WHERE sale_id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }
}

pub(crate) async fn insert_in(
    conn: &mut SqliteConnection,
    transaction: &FinancialTransaction,
) -> DbResult<()> {
    debug!(
        id = %transaction.id,
        amount = transaction.amount_cents,
        kind = ?transaction.transaction_type,
        "Inserting financial transaction"
    );

    sqlx::query(
        r#"
        INSERT INTO financial_transactions (
            id, description, amount_cents, transaction_type, competence_date,
            due_date, status, sale_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.description)
    .bind(transaction.amount_cents)
    .bind(transaction.transaction_type)
    .bind(transaction.competence_date)
    .bind(transaction.due_date)
    .bind(transaction.status)
    .bind(&transaction.sale_id)
    .bind(transaction.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
