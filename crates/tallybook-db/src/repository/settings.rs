//! # Settings Repository
//!
//! The single `business_settings` row, created by the initial migration.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use tallybook_core::validation::validate_amount;
use tallybook_core::{BusinessSettings, Money};

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self) -> DbResult<BusinessSettings> {
        let mut conn = self.pool.acquire().await?;
        get_in(&mut conn).await
    }

    /// Sets the hourly labor rate used by product cost sheets.
    pub async fn update_hourly_rate(&self, rate: Money) -> DbResult<BusinessSettings> {
        validate_amount("hourly_labor_rate", rate)?;

        debug!(rate = %rate, "Updating hourly labor rate");

        let settings = sqlx::query_as::<_, BusinessSettings>(
            r#"
            UPDATE business_settings
            SET hourly_labor_rate_cents = ?1, updated_at = ?2
            WHERE id = 1
            RETURNING hourly_labor_rate_cents, updated_at
            "#,
        )
        .bind(rate.cents())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }
}

pub(crate) async fn get_in(conn: &mut SqliteConnection) -> DbResult<BusinessSettings> {
    let settings = sqlx::query_as::<_, BusinessSettings>(
        "SELECT hourly_labor_rate_cents, updated_at FROM business_settings WHERE id = 1",
    )
    .fetch_one(&mut *conn)
    .await?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_defaults_and_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let settings = db.settings().get().await.unwrap();
        assert!(settings.hourly_labor_rate().is_zero());

        let updated = db
            .settings()
            .update_hourly_rate(Money::from_cents(2500))
            .await
            .unwrap();
        assert_eq!(updated.hourly_labor_rate_cents, 2500);
        assert_eq!(db.settings().get().await.unwrap().hourly_labor_rate_cents, 2500);
    }

    #[tokio::test]
    async fn test_negative_rate_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .settings()
            .update_hourly_rate(Money::from_cents(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
