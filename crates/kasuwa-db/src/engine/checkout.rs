//! # Checkout Engine
//!
//! Turns a validated cart into a committed sale.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale                                                            │
//! │                                                                         │
//! │  1. Validate the request (pure, no I/O)                                 │
//! │  ── BEGIN ──────────────────────────────────────────────────────────    │
//! │  2. Resolve every product, snapshot prices, check stock                 │
//! │  3. Total = Σ(line totals) − discount, floored at zero                  │
//! │  4. Insert sale (transaction_id regenerated on collision) + items       │
//! │  5. Guarded stock decrement + movement row per line (stock engine)      │
//! │  6. Credit sale: guarded balance increment (credit engine)              │
//! │  ── COMMIT ─────────────────────────────────────────────────────────    │
//! │  7. Activity log (best effort, never fails the sale)                    │
//! │                                                                         │
//! │  Any error inside the transaction drops it, which rolls everything      │
//! │  back: no sale row, no items, no movements, no stock or balance change. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kasuwa_core::cart::validate_cart;
use kasuwa_core::clock::Clock;
use kasuwa_core::validation::validate_amount_kobo;
use kasuwa_core::{
    CartLine, LedgerError, LedgerResult, Money, MovementType, PaymentMethod, Product, Sale,
    SaleItem, ValidationError,
};

use crate::activity::ActivityLog;
use crate::engine::{credit, stock};
use crate::error::{DbError, DbResult};

/// How many fresh transaction ids to try before giving up. The id carries a
/// millisecond timestamp, so one retry already implies a 1-in-36^5 collision
/// within the same millisecond.
const TXN_ID_ATTEMPTS: u32 = 4;

// =============================================================================
// Request / Result
// =============================================================================

/// A sale as submitted from the till.
///
/// Prices are deliberately absent; the engine snapshots them from the
/// product table at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    pub lines: Vec<CartLine>,
    pub discount_kobo: i64,
    pub payment_method: PaymentMethod,
    /// Required for credit sales; ignored for cash.
    pub customer_id: Option<String>,
    /// Required for credit sales.
    pub credit_due_date: Option<NaiveDate>,
    pub cashier_id: String,
}

/// A committed sale with its line items, ready for receipt printing.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

struct ResolvedLine {
    product: Product,
    quantity: i64,
    line_total_kobo: i64,
}

// =============================================================================
// Checkout Service
// =============================================================================

/// The sale orchestrator.
#[derive(Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        CheckoutService { pool, clock }
    }

    /// Creates a sale: the only write path into `sales` and `sale_items`.
    ///
    /// ## Errors
    /// * `Validation` - Bad cart, negative discount, missing cashier, or a
    ///   credit sale without customer/due date
    /// * `NotFound` - Unknown or inactive product, unknown customer
    /// * `InsufficientStock` - A line asks for more than the shelf holds
    ///   (including lines earlier in the same cart)
    /// * `CreditLimitExceeded` - The purchase would pass the customer's limit
    ///
    /// On any error nothing is written.
    pub async fn create_sale(&self, request: SaleRequest) -> LedgerResult<CompletedSale> {
        validate_cart(&request.lines)?;
        validate_amount_kobo("discount", request.discount_kobo)?;
        if request.cashier_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "cashier_id".to_string(),
            }
            .into());
        }

        let is_credit = request.payment_method == PaymentMethod::Credit;
        let customer_id = if is_credit {
            let id = request.customer_id.clone().ok_or(ValidationError::Required {
                field: "customer_id".to_string(),
            })?;
            if request.credit_due_date.is_none() {
                return Err(ValidationError::Required {
                    field: "credit_due_date".to_string(),
                }
                .into());
            }
            Some(id)
        } else {
            // Cash sales are anonymous; a customer id on one is ignored.
            None
        };

        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // The customer must exist before the sale row references them; the
        // limit itself is enforced by the guarded increment further down.
        if let Some(customer_id) = &customer_id {
            let exists: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM customers WHERE id = ?1 AND is_active = 1",
            )
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
            if exists == 0 {
                return Err(LedgerError::not_found("Customer", customer_id));
            }
        }

        // Resolve products and check stock before writing anything. The
        // guarded decrements below re-check, so a duplicate-product cart
        // that slips past this per-line look still cannot oversell.
        let mut resolved = Vec::with_capacity(request.lines.len());
        let mut subtotal = Money::zero();
        for line in &request.lines {
            let product = fetch_product(&mut tx, &line.product_id).await?;
            let product = match product {
                Some(p) if p.is_active => p,
                _ => return Err(LedgerError::not_found("Product", &line.product_id)),
            };
            if product.stock_quantity < line.quantity {
                return Err(LedgerError::InsufficientStock {
                    name: product.name,
                    available: product.stock_quantity,
                    requested: line.quantity,
                });
            }
            let line_total = product.price() * line.quantity;
            subtotal += line_total;
            resolved.push(ResolvedLine {
                product,
                quantity: line.quantity,
                line_total_kobo: line_total.kobo(),
            });
        }

        let total = subtotal.less_discount(Money::from_kobo(request.discount_kobo));
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            transaction_id: String::new(), // set by insert_sale
            cashier_id: request.cashier_id.clone(),
            customer_id: customer_id.clone(),
            total_kobo: total.kobo(),
            discount_kobo: request.discount_kobo,
            payment_method: request.payment_method,
            credit_due_date: if is_credit { request.credit_due_date } else { None },
            credit_amount_kobo: if is_credit { total.kobo() } else { 0 },
            created_at: now,
        };
        let sale = insert_sale(&mut tx, sale, now.timestamp_millis()).await?;

        let mut items = Vec::with_capacity(resolved.len());
        for line in &resolved {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product.id.clone(),
                quantity: line.quantity,
                unit_price_kobo: line.product.price_kobo,
                total_kobo: line.line_total_kobo,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, quantity, unit_price_kobo, total_kobo, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_kobo)
            .bind(item.total_kobo)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            // Guarded decrement; a miss here means an earlier line of this
            // same cart (or a stale read) already consumed the stock.
            let movement = stock::apply_movement(
                &mut tx,
                now,
                &line.product.id,
                -line.quantity,
                MovementType::Out,
                "sale",
                Some(("sale", &sale.id)),
                &request.cashier_id,
            )
            .await?;

            if movement.is_none() {
                let available = current_stock(&mut tx, &line.product.id).await?;
                return Err(LedgerError::InsufficientStock {
                    name: line.product.name.clone(),
                    available,
                    requested: line.quantity,
                });
            }

            items.push(item);
        }

        if let Some(customer_id) = &customer_id {
            let posted =
                credit::post_credit_sale(&mut tx, now, customer_id, sale.credit_amount_kobo)
                    .await?;
            if !posted {
                let customer = sqlx::query_as::<_, kasuwa_core::Customer>(
                    r#"
                    SELECT id, name, phone, email, address,
                           credit_limit_kobo, outstanding_balance_kobo,
                           is_active, created_at, updated_at
                    FROM customers
                    WHERE id = ?1 AND is_active = 1
                    "#,
                )
                .bind(customer_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?;

                return Err(match customer {
                    None => LedgerError::not_found("Customer", customer_id),
                    Some(c) => LedgerError::CreditLimitExceeded {
                        limit: c.credit_limit(),
                        outstanding: c.outstanding_balance(),
                        attempted: sale.credit_amount(),
                    },
                });
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %sale.transaction_id,
            total = %sale.total(),
            method = ?sale.payment_method,
            lines = items.len(),
            "Sale completed"
        );

        let details = serde_json::json!({
            "transaction_id": sale.transaction_id,
            "total_kobo": sale.total_kobo,
            "method": sale.payment_method,
            "lines": items.len(),
        })
        .to_string();
        ActivityLog::new(self.pool.clone(), self.clock.clone())
            .log_best_effort(&request.cashier_id, "create_sale", "sale", Some(&sale.id), &details)
            .await;

        Ok(CompletedSale { sale, items })
    }
}

// =============================================================================
// Helpers
// =============================================================================

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

async fn current_stock(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    let stock: i64 = sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(stock)
}

/// Inserts the sale row, regenerating the transaction id on the (rare)
/// collision with an existing receipt number.
async fn insert_sale(conn: &mut SqliteConnection, mut sale: Sale, epoch_ms: i64) -> DbResult<Sale> {
    for attempt in 0..TXN_ID_ATTEMPTS {
        sale.transaction_id = generate_transaction_id(epoch_ms);

        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                id, transaction_id, cashier_id, customer_id, total_kobo, discount_kobo,
                payment_method, credit_due_date, credit_amount_kobo, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.transaction_id)
        .bind(&sale.cashier_id)
        .bind(&sale.customer_id)
        .bind(sale.total_kobo)
        .bind(sale.discount_kobo)
        .bind(sale.payment_method)
        .bind(sale.credit_due_date)
        .bind(sale.credit_amount_kobo)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from);

        match result {
            Ok(_) => {
                debug!(transaction_id = %sale.transaction_id, "Sale row inserted");
                return Ok(sale);
            }
            Err(DbError::UniqueViolation { field, .. })
                if field.contains("transaction_id") && attempt + 1 < TXN_ID_ATTEMPTS =>
            {
                warn!(
                    transaction_id = %sale.transaction_id,
                    "Transaction id collision, regenerating"
                );
            }
            Err(err) => return Err(err),
        }
    }

    Err(DbError::Internal(
        "could not generate a unique transaction id".to_string(),
    ))
}

/// Receipt number: `TXN-{epoch_ms}-{5 uppercase alphanumerics}`.
fn generate_transaction_id(epoch_ms: i64) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("TXN-{}-{}", epoch_ms, suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::NewCustomer;
    use crate::repository::product::NewProduct;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn add_product(db: &Database, sku: &str, price_kobo: i64, stock: i64) -> Product {
        db.products()
            .create(NewProduct {
                sku: sku.to_string(),
                barcode: None,
                name: format!("Product {}", sku),
                description: None,
                category: None,
                price_kobo,
                cost_kobo: price_kobo / 2,
                stock_quantity: stock,
                min_stock_level: 2,
            })
            .await
            .unwrap()
    }

    async fn add_customer(db: &Database, limit_kobo: i64) -> kasuwa_core::Customer {
        db.customers()
            .create(NewCustomer {
                name: "Amina Yusuf".to_string(),
                phone: None,
                email: None,
                address: None,
                credit_limit_kobo: limit_kobo,
            })
            .await
            .unwrap()
    }

    fn cash_request(lines: Vec<CartLine>) -> SaleRequest {
        SaleRequest {
            lines,
            discount_kobo: 0,
            payment_method: PaymentMethod::Cash,
            customer_id: None,
            credit_due_date: None,
            cashier_id: "cashier-1".to_string(),
        }
    }

    async fn sale_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cash_sale_happy_path() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;
        let milk = add_product(&db, "MILK-1L", 350, 10).await;

        let completed = db
            .checkout()
            .create_sale(cash_request(vec![
                CartLine::new(&rice.id, 3),
                CartLine::new(&milk.id, 2),
            ]))
            .await
            .unwrap();

        assert_eq!(completed.sale.total_kobo, 3 * 1000 + 2 * 350);
        assert_eq!(completed.sale.credit_amount_kobo, 0);
        assert!(completed.sale.transaction_id.starts_with("TXN-"));
        assert_eq!(completed.items.len(), 2);
        assert_eq!(completed.items[0].unit_price_kobo, 1000);

        // Stock decremented and movements recorded with the sale reference
        let rice_after = db.products().get_by_id(&rice.id).await.unwrap().unwrap();
        assert_eq!(rice_after.stock_quantity, 2);

        let movements = db.stock().movements(&rice.id, 10).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Out);
        assert_eq!(movements[0].previous_stock, 5);
        assert_eq!(movements[0].new_stock, 2);
        assert_eq!(movements[0].reference_type.as_deref(), Some("sale"));
        assert_eq!(movements[0].reference_id.as_deref(), Some(completed.sale.id.as_str()));
    }

    #[tokio::test]
    async fn test_stock_runs_out_across_sales() {
        // Stock 5: selling 3 works, selling 3 more fails with available 2.
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;

        db.checkout()
            .create_sale(cash_request(vec![CartLine::new(&rice.id, 3)]))
            .await
            .unwrap();

        let err = db
            .checkout()
            .create_sale(cash_request(vec![CartLine::new(&rice.id, 3)]))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Insufficient stock for Product RICE-5KG. Available: 2"
        );

        let after = db.products().get_by_id(&rice.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 2);
        assert_eq!(sale_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_line_cart_rolls_back_completely() {
        // Two lines of the same product pass the per-line check (2 <= 3)
        // but the second guarded decrement must fail and undo everything.
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 3).await;

        let err = db
            .checkout()
            .create_sale(cash_request(vec![
                CartLine::new(&rice.id, 2),
                CartLine::new(&rice.id, 2),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { available: 1, .. }));

        let after = db.products().get_by_id(&rice.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 3);
        assert_eq!(sale_count(&db).await, 0);
        assert!(db.stock().movements(&rice.id, 10).await.unwrap().is_empty());

        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);
    }

    #[tokio::test]
    async fn test_discount_floors_at_zero() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;

        let mut request = cash_request(vec![CartLine::new(&rice.id, 1)]);
        request.discount_kobo = 5000;

        let completed = db.checkout().create_sale(request).await.unwrap();
        assert_eq!(completed.sale.total_kobo, 0);
        assert_eq!(completed.sale.discount_kobo, 5000);
    }

    #[tokio::test]
    async fn test_negative_discount_rejected() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;

        let mut request = cash_request(vec![CartLine::new(&rice.id, 1)]);
        request.discount_kobo = -1;

        let err = db.checkout().create_sale(request).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = setup().await;
        let err = db.checkout().create_sale(cash_request(vec![])).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_products_rejected() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;
        db.products().soft_delete(&rice.id).await.unwrap();

        let err = db
            .checkout()
            .create_sale(cash_request(vec![CartLine::new(&rice.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));

        let err = db
            .checkout()
            .create_sale(cash_request(vec![CartLine::new(
                "550e8400-e29b-41d4-a716-446655440000",
                1,
            )]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_credit_sale_requires_customer_and_due_date() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;

        let mut request = cash_request(vec![CartLine::new(&rice.id, 1)]);
        request.payment_method = PaymentMethod::Credit;

        let err = db.checkout().create_sale(request.clone()).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let customer = add_customer(&db, 0).await;
        request.customer_id = Some(customer.id);
        let err = db.checkout().create_sale(request).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_credit_sale_books_balance() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;
        let customer = add_customer(&db, 100_000).await;
        let due = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();

        let mut request = cash_request(vec![CartLine::new(&rice.id, 3)]);
        request.payment_method = PaymentMethod::Credit;
        request.customer_id = Some(customer.id.clone());
        request.credit_due_date = Some(due);

        let completed = db.checkout().create_sale(request).await.unwrap();
        assert_eq!(completed.sale.credit_amount_kobo, 3000);
        assert_eq!(completed.sale.credit_due_date, Some(due));

        let after = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(after.outstanding_balance_kobo, 3000);
    }

    #[tokio::test]
    async fn test_credit_limit_failure_also_rolls_back_stock() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;
        let customer = add_customer(&db, 1000).await; // limit below the total

        let mut request = cash_request(vec![CartLine::new(&rice.id, 3)]);
        request.payment_method = PaymentMethod::Credit;
        request.customer_id = Some(customer.id.clone());
        request.credit_due_date = NaiveDate::from_ymd_opt(2026, 9, 15);

        let err = db.checkout().create_sale(request).await.unwrap_err();
        assert!(matches!(err, LedgerError::CreditLimitExceeded { .. }));

        // The stock decrement inside the same transaction was undone
        let after = db.products().get_by_id(&rice.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 5);
        assert_eq!(sale_count(&db).await, 0);
        assert!(db.stock().movements(&rice.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credit_sale_unknown_customer() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;

        let mut request = cash_request(vec![CartLine::new(&rice.id, 1)]);
        request.payment_method = PaymentMethod::Credit;
        request.customer_id = Some("550e8400-e29b-41d4-a716-446655440000".to_string());
        request.credit_due_date = NaiveDate::from_ymd_opt(2026, 9, 15);

        let err = db.checkout().create_sale(request).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_receipt_queries_after_sale() {
        let db = setup().await;
        let rice = add_product(&db, "RICE-5KG", 1000, 5).await;

        let completed = db
            .checkout()
            .create_sale(cash_request(vec![CartLine::new(&rice.id, 2)]))
            .await
            .unwrap();

        let (sale, items) = db
            .sales()
            .get_with_items(&completed.sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale.transaction_id, completed.sale.transaction_id);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);

        let by_txn = db
            .sales()
            .find_by_transaction_id(&completed.sale.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_txn.id, completed.sale.id);
    }

    #[test]
    fn test_transaction_id_format() {
        let id = generate_transaction_id(1726000000000);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TXN");
        assert_eq!(parts[1], "1726000000000");
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
