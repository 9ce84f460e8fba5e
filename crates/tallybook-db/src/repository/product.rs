//! # Product Repository
//!
//! Database operations for products and their bill of materials.
//!
//! ## Key Operations
//! - CRUD operations (stock is set once, at creation)
//! - Composition replace-on-update
//! - Cost sheet derived from the composition and the labor rate
//!
//! ## Composition Reads
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Composition Is Read                            │
//! │                                                                         │
//! │  product_compositions (product_id, material_id, quantity_milli)         │
//! │       │                                                                 │
//! │       │ JOIN materials ON material_id                                   │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────────────┐               │
//! │  │ CompositionLine                                      │               │
//! │  │ Screw  | UN | 2.000 | cost 0.15 → total_cost 0.30    │               │
//! │  │ Plank  | MT | 1.500 | cost 8.00 → total_cost 12.00   │               │
//! │  └──────────────────────────────────────────────────────┘               │
//! │                                                                         │
//! │  total_cost is recomputed from the material's current cost on every     │
//! │  read, so a purchase that changes the cost shows up immediately.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tallybook_core::costing::{cost_sheet, CostSheet};
use tallybook_core::validation::{
    validate_composition, validate_new_product, validate_product_details,
};
use tallybook_core::{CompositionLine, NewCompositionLine, NewProduct, Product, ProductDetails};

use crate::error::{DbError, DbResult};
use crate::repository::settings;

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, sku, category_id, stock_milli,
        acquisition_price_cents, labor_time_minutes, profit_margin_bps,
        sale_price_cents, created_at, updated_at
    FROM products
"#;

/// A product together with its composition lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductWithComposition {
    #[serde(flatten)]
    pub product: Product,
    pub composition: Vec<CompositionLine>,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let chair = repo.create(&new_product).await?;
/// let sheet = repo.cost_sheet(&chair.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product and its composition in one transaction.
    ///
    /// ## Errors
    /// - `DbError::Validation` for malformed fields or a repeated material
    /// - `DbError::NotFound` for an unknown category or material
    /// - `DbError::UniqueViolation` for a SKU already in use
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;

        let details = &new.details;
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: details.name.trim().to_string(),
            sku: normalize_sku(details.sku.as_deref()),
            category_id: details.category_id.clone(),
            stock_milli: new.initial_stock.milli(),
            acquisition_price_cents: details.acquisition_price.cents(),
            labor_time_minutes: details.labor_time_minutes,
            profit_margin_bps: details.profit_margin.bps(),
            sale_price_cents: details.sale_price.cents(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, lines = new.composition.len(), "Creating product");

        let mut tx = self.pool.begin().await?;

        if let Some(category_id) = product.category_id.as_deref() {
            ensure_category_in(&mut tx, category_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, category_id, stock_milli,
                acquisition_price_cents, labor_time_minutes, profit_margin_bps,
                sale_price_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(product.stock_milli)
        .bind(product.acquisition_price_cents)
        .bind(product.labor_time_minutes)
        .bind(product.profit_margin_bps)
        .bind(product.sale_price_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("sku", product.sku.as_deref().unwrap_or("")))?;

        replace_composition_in(&mut tx, &product.id, &new.composition).await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product with its composition lines.
    pub async fn get_with_composition(&self, id: &str) -> DbResult<Option<ProductWithComposition>> {
        let Some(product) = self.get(id).await? else {
            return Ok(None);
        };
        let composition = self.composition(id).await?;

        Ok(Some(ProductWithComposition {
            product,
            composition,
        }))
    }

    /// Lists products alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Number of products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Updates the editable fields of a product.
    ///
    /// When `composition` is `Some`, the stored composition is replaced by
    /// the given lines (an empty slice clears it); `None` leaves it as is.
    /// Stock is never written here.
    pub async fn update(
        &self,
        id: &str,
        details: &ProductDetails,
        composition: Option<&[NewCompositionLine]>,
    ) -> DbResult<Product> {
        validate_product_details(details)?;
        if let Some(lines) = composition {
            validate_composition(lines)?;
        }

        debug!(id = %id, replace_composition = composition.is_some(), "Updating product");

        let sku = normalize_sku(details.sku.as_deref());
        let mut tx = self.pool.begin().await?;

        if let Some(category_id) = details.category_id.as_deref() {
            ensure_category_in(&mut tx, category_id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                category_id = ?4,
                acquisition_price_cents = ?5,
                labor_time_minutes = ?6,
                profit_margin_bps = ?7,
                sale_price_cents = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(details.name.trim())
        .bind(&sku)
        .bind(&details.category_id)
        .bind(details.acquisition_price.cents())
        .bind(details.labor_time_minutes)
        .bind(details.profit_margin.bps())
        .bind(details.sale_price.cents())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("sku", sku.as_deref().unwrap_or("")))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        if let Some(lines) = composition {
            replace_composition_in(&mut tx, id, lines).await?;
        }

        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Deletes a product and its composition.
    ///
    /// ## Errors
    /// - `DbError::DeleteProtected` once the product appears on a sale
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).protect_delete("Product", id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Composition lines of a product, in the order they were entered.
    pub async fn composition(&self, product_id: &str) -> DbResult<Vec<CompositionLine>> {
        let mut conn = self.pool.acquire().await?;
        composition_in(&mut conn, product_id).await
    }

    /// Cost sheet of a product at today's material costs and labor rate.
    ///
    /// ## Errors
    /// - `DbError::NotFound` if the product doesn't exist
    /// - `DbError::Validation` if a cost does not fit in cents
    pub async fn cost_sheet(&self, id: &str) -> DbResult<CostSheet> {
        let mut conn = self.pool.acquire().await?;

        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        let composition = composition_in(&mut conn, id).await?;
        let settings = settings::get_in(&mut conn).await?;

        Ok(cost_sheet(&product, &composition, settings.hourly_labor_rate())?)
    }
}

/// Reads a product's composition inside the caller's connection or
/// transaction.
pub async fn composition_in(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<Vec<CompositionLine>> {
    let lines = sqlx::query_as::<_, CompositionLine>(
        r#"
        SELECT
            pc.id,
            pc.product_id,
            pc.material_id,
            m.name AS material_name,
            m.unit AS material_unit,
            pc.quantity_milli,
            m.current_cost_cents AS material_cost_cents
        FROM product_compositions pc
        INNER JOIN materials m ON m.id = pc.material_id
        WHERE pc.product_id = ?1
        ORDER BY pc.position
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

async fn replace_composition_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    lines: &[NewCompositionLine],
) -> DbResult<()> {
    sqlx::query("DELETE FROM product_compositions WHERE product_id = ?1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    for (position, line) in lines.iter().enumerate() {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM materials WHERE id = ?1")
            .bind(&line.material_id)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Material", &line.material_id));
        }

        sqlx::query(
            r#"
            INSERT INTO product_compositions (id, product_id, material_id, quantity_milli, position)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(&line.material_id)
        .bind(line.quantity.milli())
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn ensure_category_in(conn: &mut SqliteConnection, category_id: &str) -> DbResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1")
        .bind(category_id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(DbError::not_found("Category", category_id)),
    }
}

fn normalize_sku(sku: Option<&str>) -> Option<String> {
    sku.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
