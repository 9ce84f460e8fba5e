//! # Payment Method Repository
//!
//! Payment methods and the fee each one withholds. The name decides whether
//! a sale paid with it settles now or on credit terms (see
//! [`tallybook_core::SettlementPolicy`]).

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tallybook_core::validation::{validate_new_payment_method, validate_rate};
use tallybook_core::{NewPaymentMethod, PaymentMethod, Rate};

use crate::error::{DbError, DbResult};

const SELECT_PAYMENT_METHOD: &str =
    "SELECT id, name, fee_rate_bps, created_at FROM payment_methods";

#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    /// Creates a payment method. Names are unique.
    pub async fn create(&self, new: &NewPaymentMethod) -> DbResult<PaymentMethod> {
        validate_new_payment_method(new)?;

        let method = PaymentMethod {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            fee_rate_bps: new.fee_rate.bps(),
            created_at: Utc::now(),
        };

        debug!(id = %method.id, name = %method.name, fee = %new.fee_rate, "Creating payment method");

        sqlx::query(
            "INSERT INTO payment_methods (id, name, fee_rate_bps, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&method.id)
        .bind(&method.name)
        .bind(method.fee_rate_bps)
        .bind(method.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("name", &method.name))?;

        Ok(method)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<PaymentMethod>> {
        let mut conn = self.pool.acquire().await?;
        get_in(&mut conn, id).await
    }

    /// Lists payment methods alphabetically.
    pub async fn list(&self) -> DbResult<Vec<PaymentMethod>> {
        let methods = sqlx::query_as::<_, PaymentMethod>(&format!(
            "{SELECT_PAYMENT_METHOD} ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    /// Changes the fee rate. Sales already recorded keep the fee they were
    /// settled with.
    pub async fn update_fee_rate(&self, id: &str, fee_rate: Rate) -> DbResult<PaymentMethod> {
        validate_rate("fee_rate", fee_rate)?;

        debug!(id = %id, fee = %fee_rate, "Updating payment method fee");

        sqlx::query_as::<_, PaymentMethod>(
            r#"
            UPDATE payment_methods SET fee_rate_bps = ?2
            WHERE id = ?1
            RETURNING id, name, fee_rate_bps, created_at
            "#,
        )
        .bind(id)
        .bind(fee_rate.bps())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("PaymentMethod", id))
    }
}

/// Reads a payment method inside the caller's connection or transaction.
pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PaymentMethod>> {
    let method = sqlx::query_as::<_, PaymentMethod>(&format!(
        "{SELECT_PAYMENT_METHOD} WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(method)
}
