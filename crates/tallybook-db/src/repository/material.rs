//! # Material Repository
//!
//! Raw materials. Catalog edits change name, unit and cost; stock moves only
//! through [`crate::ledger`] once the row exists.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tallybook_core::validation::{validate_material_details, validate_new_material};
use tallybook_core::{Material, MaterialDetails, Money, NewMaterial};

use crate::error::{DbError, DbResult};

const SELECT_MATERIAL: &str = r#"
    SELECT id, name, unit, current_cost_cents, stock_milli, created_at, updated_at
    FROM materials
"#;

/// Repository for raw materials.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.materials();
///
/// let thread = repo.create(&new_material).await?;
/// let all = repo.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct MaterialRepository {
    pool: SqlitePool,
}

impl MaterialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MaterialRepository { pool }
    }

    /// Creates a material with its opening stock.
    pub async fn create(&self, new: &NewMaterial) -> DbResult<Material> {
        validate_new_material(new)?;

        let now = Utc::now();
        let material = Material {
            id: Uuid::new_v4().to_string(),
            name: new.details.name.trim().to_string(),
            unit: new.details.unit,
            current_cost_cents: new.details.current_cost.cents(),
            stock_milli: new.initial_stock.milli(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %material.id, name = %material.name, "Creating material");

        sqlx::query(
            r#"
            INSERT INTO materials (
                id, name, unit, current_cost_cents, stock_milli, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&material.id)
        .bind(&material.name)
        .bind(material.unit)
        .bind(material.current_cost_cents)
        .bind(material.stock_milli)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(material)
    }

    /// Gets a material by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Material))` - Material found
    /// * `Ok(None)` - Material not found
    pub async fn get(&self, id: &str) -> DbResult<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(&format!("{SELECT_MATERIAL} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(material)
    }

    /// Lists materials alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(&format!("{SELECT_MATERIAL} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = materials.len(), "Listed materials");
        Ok(materials)
    }

    /// Updates name, unit and current cost. Stock is left untouched.
    pub async fn update(&self, id: &str, details: &MaterialDetails) -> DbResult<Material> {
        validate_material_details(details)?;

        debug!(id = %id, "Updating material");

        let result = sqlx::query(
            r#"
            UPDATE materials SET
                name = ?2,
                unit = ?3,
                current_cost_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(details.name.trim())
        .bind(details.unit)
        .bind(details.current_cost.cents())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Material", id))
    }

    /// Deletes a material that no composition or purchase refers to.
    ///
    /// ## Errors
    /// - `DbError::DeleteProtected` while referenced
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting material");

        let result = sqlx::query("DELETE FROM materials WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).protect_delete("Material", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Material", id));
        }

        Ok(())
    }
}

/// Sets the unit cost of a material inside the caller's transaction.
pub async fn set_current_cost_in(conn: &mut SqliteConnection, id: &str, cost: Money) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE materials SET current_cost_cents = ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(cost.cents())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Material", id));
    }

    Ok(())
}
