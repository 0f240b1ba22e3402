//! # Stock Engine
//!
//! The only code allowed to move `products.stock_quantity`.
//!
//! Every change is a guarded UPDATE paired with an append-only row in
//! `stock_movements` capturing previous and new levels, in one transaction.
//! The guard (`stock_quantity + delta >= 0`) means a change that would take
//! the shelf negative simply matches zero rows and the caller converts that
//! into a typed error - the CHECK constraint on the column is the backstop,
//! not the first line of defense.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use kasuwa_core::clock::Clock;
use kasuwa_core::{
    LedgerError, LedgerResult, MovementType, Product, StockMovement, ValidationError,
};

use crate::activity::ActivityLog;
use crate::error::{DbError, DbResult};

/// Applies a signed stock change and records the movement. Crate-internal:
/// the checkout engine calls this for each line's "out" movement inside its
/// own transaction, and [`StockService`] wraps it for manual adjustments.
///
/// Returns `None` when the guard matched no row - either the product does
/// not exist or the change would take stock below zero. The caller re-reads
/// the product to tell those cases apart.
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
    product_id: &str,
    delta: i64,
    movement_type: MovementType,
    reason: &str,
    reference: Option<(&str, &str)>,
    performed_by: &str,
) -> DbResult<Option<StockMovement>> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + ?2, updated_at = ?3
        WHERE id = ?1 AND stock_quantity + ?2 >= 0
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let new_stock: i64 = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

    let movement = StockMovement {
        id: Uuid::new_v4().to_string(),
        product_id: product_id.to_string(),
        movement_type,
        quantity: delta.abs(),
        previous_stock: new_stock - delta,
        new_stock,
        reason: reason.to_string(),
        reference_type: reference.map(|(kind, _)| kind.to_string()),
        reference_id: reference.map(|(_, id)| id.to_string()),
        performed_by: performed_by.to_string(),
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, movement_type, quantity, previous_stock, new_stock,
            reason, reference_type, reference_id, performed_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(&movement.reason)
    .bind(&movement.reference_type)
    .bind(&movement.reference_id)
    .bind(&movement.performed_by)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(Some(movement))
}

async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
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
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Manual stock changes: receiving goods, writing off damage, recounts.
#[derive(Clone)]
pub struct StockService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl StockService {
    /// Creates a new StockService.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        StockService { pool, clock }
    }

    /// Applies a signed stock change with a reason.
    ///
    /// Positive delta is goods coming in, negative is goods going out.
    ///
    /// ## Errors
    /// * `NotFound` - Unknown product
    /// * `InvalidAdjustment` - Change would take stock below zero;
    ///   nothing is written
    pub async fn adjust(
        &self,
        product_id: &str,
        delta: i64,
        reason: &str,
        performed_by: &str,
    ) -> LedgerResult<StockMovement> {
        if delta == 0 {
            return Err(ValidationError::InvalidFormat {
                field: "delta".to_string(),
                reason: "must be non-zero".to_string(),
            }
            .into());
        }
        if reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "reason".to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", product_id))?;

        let movement_type = if delta > 0 {
            MovementType::In
        } else {
            MovementType::Out
        };

        let movement = apply_movement(
            &mut tx,
            now,
            product_id,
            delta,
            movement_type,
            reason,
            None,
            performed_by,
        )
        .await?
        .ok_or(LedgerError::InvalidAdjustment {
            name: product.name.clone(),
            current: product.stock_quantity,
            delta,
        })?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product = %product.name,
            delta,
            new_stock = movement.new_stock,
            "Stock adjusted"
        );

        ActivityLog::new(self.pool.clone(), self.clock.clone())
            .log_best_effort(
                performed_by,
                "adjust_stock",
                "product",
                Some(product_id),
                &format!("{}: {:+} (now {})", product.name, delta, movement.new_stock),
            )
            .await;

        Ok(movement)
    }

    /// Sets stock to an absolute counted level (physical recount).
    ///
    /// Records the difference as an `adjustment` movement. Returns `None`
    /// when the count matches what the system already has.
    pub async fn recount(
        &self,
        product_id: &str,
        counted: i64,
        performed_by: &str,
    ) -> LedgerResult<Option<StockMovement>> {
        if counted < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "counted".to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", product_id))?;

        let delta = counted - product.stock_quantity;
        if delta == 0 {
            return Ok(None);
        }

        let movement = apply_movement(
            &mut tx,
            now,
            product_id,
            delta,
            MovementType::Adjustment,
            "Physical recount",
            None,
            performed_by,
        )
        .await?
        // counted >= 0, so the guard cannot miss for an existing product
        .ok_or_else(|| LedgerError::Internal(format!("recount guard miss for {}", product_id)))?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product = %product.name,
            counted,
            was = product.stock_quantity,
            "Stock recounted"
        );

        Ok(Some(movement))
    }

    /// Movement history for a product, newest first.
    pub async fn movements(&self, product_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, previous_stock, new_stock,
                   reason, reference_type, reference_id, performed_by, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}
