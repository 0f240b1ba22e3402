//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD (soft delete only - historical sales reference products)
//! - Lookup by SKU or barcode (what a scanner resolves against)
//! - Low-stock / out-of-stock reporting
//!
//! Stock quantity is NOT writable here. Every stock change flows through
//! the stock engine so the movement audit trail stays complete.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use kasuwa_core::clock::Clock;
use kasuwa_core::Product;

use crate::error::{DbError, DbResult};

/// Fields supplied when creating a product.
///
/// `stock_quantity` here is the opening stock; after creation the field is
/// owned by the stock engine.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_kobo: i64,
    pub cost_kobo: i64,
    pub stock_quantity: i64,
    pub min_stock_level: i64,
}

/// Repository for product database operations.
#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ProductRepository { pool, clock }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        let now = self.clock.now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: new.sku,
            barcode: new.barcode,
            name: new.name,
            description: new.description,
            category: new.category,
            price_kobo: new.price_kobo,
            cost_kobo: new.cost_kobo,
            stock_quantity: new.stock_quantity,
            min_stock_level: new.min_stock_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, description, category,
                price_kobo, cost_kobo, stock_quantity, min_stock_level,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_kobo)
        .bind(product.cost_kobo)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, barcode, name, description, category,
                   price_kobo, cost_kobo, stock_quantity, min_stock_level,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, barcode, name, description, category,
                   price_kobo, cost_kobo, stock_quantity, min_stock_level,
                   is_active, created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Resolves a scanned identifier: SKU first, then barcode.
    pub async fn lookup(&self, identifier: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, barcode, name, description, category,
                   price_kobo, cost_kobo, stock_quantity, min_stock_level,
                   is_active, created_at, updated_at
            FROM products
            WHERE (sku = ?1 OR barcode = ?1) AND is_active = 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, barcode, name, description, category,
                   price_kobo, cost_kobo, stock_quantity, min_stock_level,
                   is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates product details.
    ///
    /// Deliberately does NOT touch `stock_quantity`: that column belongs to
    /// the stock engine, which pairs every change with a movement row.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = self.clock.now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                barcode = ?3,
                name = ?4,
                description = ?5,
                category = ?6,
                price_kobo = ?7,
                cost_kobo = ?8,
                min_stock_level = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_kobo)
        .bind(product.cost_kobo)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical sale items still reference this product.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = self.clock.now();

        let result = sqlx::query(
            r#"
            UPDATE products SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products at or below their reorder threshold (but not empty),
    /// most depleted first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, barcode, name, description, category,
                   price_kobo, cost_kobo, stock_quantity, min_stock_level,
                   is_active, created_at, updated_at
            FROM products
            WHERE stock_quantity <= min_stock_level
              AND stock_quantity > 0
              AND is_active = 1
            ORDER BY stock_quantity ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Active products with nothing on the shelf.
    pub async fn out_of_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, barcode, name, description, category,
                   price_kobo, cost_kobo, stock_quantity, min_stock_level,
                   is_active, created_at, updated_at
            FROM products
            WHERE stock_quantity = 0 AND is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
