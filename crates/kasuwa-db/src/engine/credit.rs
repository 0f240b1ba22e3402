//! # Credit Ledger Engine
//!
//! Owns `customers.outstanding_balance_kobo` and everything that moves it.
//!
//! ## The Ledger Identity
//! ```text
//! outstanding_balance == Σ(credit_amount of credit sales)
//!                      − Σ(payments against those sales)
//! ```
//! The balance column is the single source of truth for limit checks; the
//! identity holds because it only ever changes in the same transaction as
//! the sale or payment row that explains the change. A guarded decrement
//! that finds less balance than the payment being recorded means the ledger
//! has diverged - that is a bug and surfaces as `Internal`, never as a
//! silently clamped balance.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use kasuwa_core::clock::Clock;
use kasuwa_core::validation::validate_payment_amount;
use kasuwa_core::{
    days_overdue, CreditPayment, Customer, LedgerError, LedgerResult, Money, OverdueSeverity,
    Sale, SettlementMethod, ValidationError,
};

use crate::activity::ActivityLog;
use crate::error::{DbError, DbResult};

// =============================================================================
// Crate-internal: posting a credit sale
// =============================================================================

/// Books a credit sale against the customer's balance, enforcing the limit.
///
/// Crate-internal: only the checkout engine calls this, inside its own
/// transaction, so the limit check and the stock decrements commit or roll
/// back together.
///
/// Returns `false` when the guard matched no row: the customer is missing,
/// inactive, or the purchase would push them past a finite limit. The caller
/// re-reads the customer to tell those cases apart. A limit of zero means
/// unlimited credit.
pub(crate) async fn post_credit_sale(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
    customer_id: &str,
    amount_kobo: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET outstanding_balance_kobo = outstanding_balance_kobo + ?2, updated_at = ?3
        WHERE id = ?1
          AND is_active = 1
          AND (credit_limit_kobo = 0
               OR outstanding_balance_kobo + ?2 <= credit_limit_kobo)
        "#,
    )
    .bind(customer_id)
    .bind(amount_kobo)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, transaction_id, cashier_id, customer_id, total_kobo, discount_kobo,
               payment_method, credit_due_date, credit_amount_kobo, created_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

async fn paid_against(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<i64> {
    let paid: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_kobo), 0) FROM credit_payments WHERE sale_id = ?1",
    )
    .bind(sale_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(paid)
}

// =============================================================================
// Requests and views
// =============================================================================

/// A repayment to record against one credit sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub sale_id: String,
    /// Must be the customer the sale was booked to.
    pub customer_id: String,
    pub amount_kobo: i64,
    /// Defaults to the clock's today when absent (back-dated receipts are
    /// allowed; the ledger works off amounts, not dates).
    pub payment_date: Option<NaiveDate>,
    pub method: SettlementMethod,
    pub notes: Option<String>,
    pub recorded_by: String,
}

/// One overdue credit sale, as shown on the collections list.
#[derive(Debug, Clone, Serialize)]
pub struct OverdueCredit {
    pub sale_id: String,
    pub transaction_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub credit_amount: Money,
    pub paid: Money,
    pub remaining: Money,
    pub severity: OverdueSeverity,
}

/// Shop-wide credit position, relative to the injected clock.
#[derive(Debug, Clone, Serialize)]
pub struct CreditSummary {
    /// Sum of outstanding balances over active customers.
    pub total_outstanding: Money,
    /// Active customers currently owing anything.
    pub customers_with_balance: i64,
    pub overdue_count: i64,
    pub overdue_amount: Money,
    /// Payments recorded in the last 7 days, newest first (at most 10).
    pub recent_payments: Vec<CreditPayment>,
    /// Credit sales made this calendar month.
    pub month_credit_count: i64,
    pub month_credit_amount: Money,
}

/// One credit sale in a customer's history, with its repayments.
#[derive(Debug, Clone, Serialize)]
pub struct CreditSaleHistory {
    pub sale: Sale,
    pub paid: Money,
    pub remaining: Money,
    pub payments: Vec<CreditPayment>,
}

/// A customer's full credit account view.
#[derive(Debug, Clone, Serialize)]
pub struct CreditHistory {
    pub customer: Customer,
    /// Credit sales, newest first.
    pub sales: Vec<CreditSaleHistory>,
    pub total_credit: Money,
    pub total_paid: Money,
    pub total_remaining: Money,
}

#[derive(sqlx::FromRow)]
struct OverdueRow {
    sale_id: String,
    transaction_id: String,
    customer_id: String,
    customer_name: String,
    credit_due_date: NaiveDate,
    credit_amount_kobo: i64,
    paid_kobo: i64,
}

// =============================================================================
// Credit Service
// =============================================================================

/// Engine for repayments and credit reporting.
#[derive(Clone)]
pub struct CreditService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl CreditService {
    /// Creates a new CreditService.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        CreditService { pool, clock }
    }

    /// Records a repayment against a credit sale.
    ///
    /// The payment row and the balance decrement land in one transaction.
    ///
    /// ## Errors
    /// * `Validation` - Non-positive amount, the sale is not a credit sale,
    ///   or the request names a different customer than the sale's
    /// * `NotFound` - Unknown sale
    /// * `Overpayment` - Amount exceeds the sale's remaining balance;
    ///   carries that remaining balance so the caller can retry with it
    pub async fn record_payment(&self, request: PaymentRequest) -> LedgerResult<CreditPayment> {
        validate_payment_amount(request.amount_kobo)?;

        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let sale = fetch_sale(&mut tx, &request.sale_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Sale", &request.sale_id))?;

        if !sale.is_credit() {
            return Err(ValidationError::InvalidFormat {
                field: "sale_id".to_string(),
                reason: "not a credit sale".to_string(),
            }
            .into());
        }
        let customer_id = sale
            .customer_id
            .clone()
            .ok_or_else(|| LedgerError::Internal(format!("credit sale {} has no customer", sale.id)))?;
        if customer_id != request.customer_id {
            return Err(ValidationError::InvalidFormat {
                field: "customer_id".to_string(),
                reason: "sale belongs to a different customer".to_string(),
            }
            .into());
        }

        let paid = paid_against(&mut tx, &sale.id).await?;
        let remaining = sale.credit_amount_kobo - paid;
        if request.amount_kobo > remaining {
            return Err(LedgerError::Overpayment {
                remaining: Money::from_kobo(remaining),
                attempted: Money::from_kobo(request.amount_kobo),
            });
        }

        let payment = CreditPayment {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            customer_id: customer_id.clone(),
            amount_kobo: request.amount_kobo,
            payment_date: request.payment_date.unwrap_or_else(|| self.clock.today()),
            method: request.method,
            notes: request.notes,
            recorded_by: request.recorded_by,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO credit_payments (
                id, sale_id, customer_id, amount_kobo, payment_date,
                method, notes, recorded_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(&payment.customer_id)
        .bind(payment.amount_kobo)
        .bind(payment.payment_date)
        .bind(payment.method)
        .bind(&payment.notes)
        .bind(&payment.recorded_by)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        // Guard: the per-sale cap above already bounds the payment, so a
        // miss here means the balance no longer covers what the sale rows
        // say is owed. That is ledger divergence, not a user error.
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET outstanding_balance_kobo = outstanding_balance_kobo - ?2, updated_at = ?3
            WHERE id = ?1 AND outstanding_balance_kobo >= ?2
            "#,
        )
        .bind(&customer_id)
        .bind(payment.amount_kobo)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::Internal(format!(
                "balance for customer {} does not cover payment of {}",
                customer_id,
                payment.amount()
            )));
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale = %sale.transaction_id,
            amount = %payment.amount(),
            "Credit payment recorded"
        );

        ActivityLog::new(self.pool.clone(), self.clock.clone())
            .log_best_effort(
                &payment.recorded_by,
                "record_payment",
                "credit_payment",
                Some(&payment.id),
                &format!("Recorded {} against sale {}", payment.amount(), sale.transaction_id),
            )
            .await;

        Ok(payment)
    }

    /// The unpaid remainder of one credit sale.
    pub async fn remaining_balance(&self, sale_id: &str) -> LedgerResult<Money> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;

        let sale = fetch_sale(&mut conn, sale_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Sale", sale_id))?;
        let paid = paid_against(&mut conn, &sale.id).await?;

        Ok(Money::from_kobo(sale.credit_amount_kobo - paid))
    }

    /// Credit sales past due with money still owed, soonest-due first.
    ///
    /// `min_days_overdue` filters the list (1 = everything past due). The
    /// query is a pure read: calling it never changes what it will return
    /// next time.
    pub async fn overdue_credits(&self, min_days_overdue: i64) -> LedgerResult<Vec<OverdueCredit>> {
        let today = self.clock.today();
        let min_days = min_days_overdue.max(1);

        let rows = sqlx::query_as::<_, OverdueRow>(
            r#"
            SELECT s.id AS sale_id,
                   s.transaction_id AS transaction_id,
                   s.customer_id AS customer_id,
                   c.name AS customer_name,
                   s.credit_due_date AS credit_due_date,
                   s.credit_amount_kobo AS credit_amount_kobo,
                   COALESCE((SELECT SUM(amount_kobo)
                             FROM credit_payments
                             WHERE sale_id = s.id), 0) AS paid_kobo
            FROM sales s
            JOIN customers c ON c.id = s.customer_id
            WHERE s.payment_method = 'credit'
              AND s.credit_due_date IS NOT NULL
              AND s.credit_due_date < ?1
            ORDER BY s.credit_due_date ASC, s.rowid ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut overdue = Vec::new();
        for row in rows {
            let remaining = row.credit_amount_kobo - row.paid_kobo;
            if remaining <= 0 {
                continue;
            }
            let days = days_overdue(row.credit_due_date, today);
            if days < min_days {
                continue;
            }
            let severity = OverdueSeverity::from_days_overdue(days).ok_or_else(|| {
                LedgerError::Internal(format!("overdue sale {} with {} days", row.sale_id, days))
            })?;
            overdue.push(OverdueCredit {
                sale_id: row.sale_id,
                transaction_id: row.transaction_id,
                customer_id: row.customer_id,
                customer_name: row.customer_name,
                due_date: row.credit_due_date,
                days_overdue: days,
                credit_amount: Money::from_kobo(row.credit_amount_kobo),
                paid: Money::from_kobo(row.paid_kobo),
                remaining: Money::from_kobo(remaining),
                severity,
            });
        }

        Ok(overdue)
    }

    /// Shop-wide credit dashboard numbers.
    pub async fn credit_summary(&self) -> LedgerResult<CreditSummary> {
        let today = self.clock.today();

        let (total_outstanding, customers_with_balance): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(outstanding_balance_kobo), 0),
                   COALESCE(SUM(CASE WHEN outstanding_balance_kobo > 0 THEN 1 ELSE 0 END), 0)
            FROM customers
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        let overdue = self.overdue_credits(1).await?;
        let overdue_amount = overdue
            .iter()
            .fold(Money::zero(), |acc, o| acc + o.remaining);

        let week_ago = today - chrono::Duration::days(7);
        let recent_payments = sqlx::query_as::<_, CreditPayment>(
            r#"
            SELECT id, sale_id, customer_id, amount_kobo, payment_date,
                   method, notes, recorded_by, created_at
            FROM credit_payments
            WHERE payment_date >= ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT 10
            "#,
        )
        .bind(week_ago)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let month = format!("{:04}-{:02}", today.year(), today.month());
        let (month_credit_count, month_credit_amount): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(credit_amount_kobo), 0)
            FROM sales
            WHERE payment_method = 'credit' AND strftime('%Y-%m', created_at) = ?1
            "#,
        )
        .bind(&month)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(CreditSummary {
            total_outstanding: Money::from_kobo(total_outstanding),
            customers_with_balance,
            overdue_count: overdue.len() as i64,
            overdue_amount,
            recent_payments,
            month_credit_count,
            month_credit_amount: Money::from_kobo(month_credit_amount),
        })
    }

    /// One customer's credit account: every credit sale with its repayments.
    pub async fn customer_credit_history(&self, customer_id: &str) -> LedgerResult<CreditHistory> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, address,
                   credit_limit_kobo, outstanding_balance_kobo,
                   is_active, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| LedgerError::not_found("Customer", customer_id))?;

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, transaction_id, cashier_id, customer_id, total_kobo, discount_kobo,
                   payment_method, credit_due_date, credit_amount_kobo, created_at
            FROM sales
            WHERE customer_id = ?1 AND payment_method = 'credit'
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let payments = sqlx::query_as::<_, CreditPayment>(
            r#"
            SELECT id, sale_id, customer_id, amount_kobo, payment_date,
                   method, notes, recorded_by, created_at
            FROM credit_payments
            WHERE customer_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut by_sale: HashMap<String, Vec<CreditPayment>> = HashMap::new();
        for payment in payments {
            by_sale.entry(payment.sale_id.clone()).or_default().push(payment);
        }

        let mut total_credit = Money::zero();
        let mut total_paid = Money::zero();
        let mut history = Vec::with_capacity(sales.len());
        for sale in sales {
            let payments = by_sale.remove(&sale.id).unwrap_or_default();
            let paid: i64 = payments.iter().map(|p| p.amount_kobo).sum();
            total_credit += sale.credit_amount();
            total_paid += Money::from_kobo(paid);
            history.push(CreditSaleHistory {
                remaining: Money::from_kobo(sale.credit_amount_kobo - paid),
                paid: Money::from_kobo(paid),
                sale,
                payments,
            });
        }

        Ok(CreditHistory {
            customer,
            sales: history,
            total_credit,
            total_paid,
            total_remaining: total_credit - total_paid,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checkout::SaleRequest;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::NewCustomer;
    use crate::repository::product::NewProduct;
    use chrono::TimeZone;
    use kasuwa_core::clock::FixedClock;
    use kasuwa_core::{CartLine, PaymentMethod};

    const TODAY: (i32, u32, u32) = (2026, 8, 15);

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup(credit_limit_naira: i64) -> (Database, String, Customer) {
        let clock = FixedClock::new(
            Utc.with_ymd_and_hms(TODAY.0, TODAY.1, TODAY.2, 12, 0, 0).unwrap(),
        );
        let db = Database::with_clock(DbConfig::in_memory(), Arc::new(clock))
            .await
            .unwrap();

        let product = db
            .products()
            .create(NewProduct {
                sku: "RICE-1KG".to_string(),
                barcode: None,
                name: "Rice 1kg".to_string(),
                description: None,
                category: None,
                price_kobo: Money::from_naira(10).kobo(),
                cost_kobo: 700,
                stock_quantity: 1000,
                min_stock_level: 5,
            })
            .await
            .unwrap();

        let customer = db
            .customers()
            .create(NewCustomer {
                name: "Amina Yusuf".to_string(),
                phone: Some("08031234567".to_string()),
                email: None,
                address: None,
                credit_limit_kobo: Money::from_naira(credit_limit_naira).kobo(),
            })
            .await
            .unwrap();

        (db, product.id, customer)
    }

    /// Books a credit sale of `naira` (in ₦10 units of the test product).
    async fn credit_sale(db: &Database, product_id: &str, customer_id: &str, naira: i64, due: NaiveDate) -> Sale {
        assert_eq!(naira % 10, 0, "test product is ₦10/unit");
        db.checkout()
            .create_sale(SaleRequest {
                lines: vec![CartLine::new(product_id, naira / 10)],
                discount_kobo: 0,
                payment_method: PaymentMethod::Credit,
                customer_id: Some(customer_id.to_string()),
                credit_due_date: Some(due),
                cashier_id: "cashier-1".to_string(),
            })
            .await
            .unwrap()
            .sale
    }

    fn payment(sale_id: &str, customer_id: &str, naira: i64) -> PaymentRequest {
        PaymentRequest {
            sale_id: sale_id.to_string(),
            customer_id: customer_id.to_string(),
            amount_kobo: Money::from_naira(naira).kobo(),
            payment_date: None,
            method: SettlementMethod::Cash,
            notes: None,
            recorded_by: "manager-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_credit_limit_scenario() {
        // Limit ₦100: ₦80 sale fits, a further ₦30 does not. After paying
        // ₦50 the balance is ₦30; a ₦40 payment against the ₦80 sale
        // overshoots its remaining ₦30 and is rejected.
        let (db, product_id, customer) = setup(100).await;
        let due = date(2026, 9, 15);

        let sale = credit_sale(&db, &product_id, &customer.id, 80, due).await;

        let err = db
            .checkout()
            .create_sale(SaleRequest {
                lines: vec![CartLine::new(&product_id, 3)],
                discount_kobo: 0,
                payment_method: PaymentMethod::Credit,
                customer_id: Some(customer.id.clone()),
                credit_due_date: Some(due),
                cashier_id: "cashier-1".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Credit limit exceeded. Limit: ₦100.00, Outstanding: ₦80.00, New purchase: ₦30.00"
        );

        db.credit().record_payment(payment(&sale.id, &customer.id, 50)).await.unwrap();

        let balance = db
            .customers()
            .get_by_id(&customer.id)
            .await
            .unwrap()
            .unwrap()
            .outstanding_balance_kobo;
        assert_eq!(balance, Money::from_naira(30).kobo());

        let err = db.credit().record_payment(payment(&sale.id, &customer.id, 40)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Payment amount exceeds remaining balance. Remaining: ₦30.00"
        );

        // Rejection left nothing behind
        let remaining = db.credit().remaining_balance(&sale.id).await.unwrap();
        assert_eq!(remaining, Money::from_naira(30));
    }

    #[tokio::test]
    async fn test_zero_limit_means_unlimited() {
        let (db, product_id, customer) = setup(0).await;
        let due = date(2026, 9, 15);

        credit_sale(&db, &product_id, &customer.id, 5000, due).await;

        let balance = db
            .customers()
            .get_by_id(&customer.id)
            .await
            .unwrap()
            .unwrap()
            .outstanding_balance_kobo;
        assert_eq!(balance, Money::from_naira(5000).kobo());
    }

    #[tokio::test]
    async fn test_exact_payoff_clears_balance() {
        let (db, product_id, customer) = setup(100).await;
        let sale = credit_sale(&db, &product_id, &customer.id, 80, date(2026, 9, 15)).await;

        db.credit().record_payment(payment(&sale.id, &customer.id, 30)).await.unwrap();
        db.credit().record_payment(payment(&sale.id, &customer.id, 50)).await.unwrap();

        assert_eq!(
            db.credit().remaining_balance(&sale.id).await.unwrap(),
            Money::zero()
        );
        let balance = db
            .customers()
            .get_by_id(&customer.id)
            .await
            .unwrap()
            .unwrap()
            .outstanding_balance_kobo;
        assert_eq!(balance, 0);
    }

    #[tokio::test]
    async fn test_payment_against_cash_sale_rejected() {
        let (db, product_id, customer) = setup(100).await;

        let completed = db
            .checkout()
            .create_sale(SaleRequest {
                lines: vec![CartLine::new(&product_id, 1)],
                discount_kobo: 0,
                payment_method: PaymentMethod::Cash,
                customer_id: None,
                credit_due_date: None,
                cashier_id: "cashier-1".to_string(),
            })
            .await
            .unwrap();

        let err = db
            .credit()
            .record_payment(payment(&completed.sale.id, &customer.id, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_payment_naming_wrong_customer_rejected() {
        let (db, product_id, customer) = setup(100).await;
        let sale = credit_sale(&db, &product_id, &customer.id, 80, date(2026, 9, 15)).await;

        let other = db
            .customers()
            .create(NewCustomer {
                name: "Bello Musa".to_string(),
                phone: None,
                email: None,
                address: None,
                credit_limit_kobo: 0,
            })
            .await
            .unwrap();

        let err = db
            .credit()
            .record_payment(payment(&sale.id, &other.id, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        // The real customer's balance is untouched
        assert_eq!(
            db.credit().remaining_balance(&sale.id).await.unwrap(),
            Money::from_naira(80)
        );
    }

    #[tokio::test]
    async fn test_payment_against_unknown_sale() {
        let (db, _, _) = setup(100).await;
        let err = db.credit().record_payment(payment("no-such-sale", "no-such-customer", 10)).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_non_positive_payment_rejected() {
        let (db, product_id, customer) = setup(100).await;
        let sale = credit_sale(&db, &product_id, &customer.id, 80, date(2026, 9, 15)).await;

        let mut request = payment(&sale.id, &customer.id, 0);
        assert!(matches!(
            db.credit().record_payment(request.clone()).await.unwrap_err(),
            LedgerError::Validation(_)
        ));
        request.amount_kobo = -100;
        assert!(matches!(
            db.credit().record_payment(request).await.unwrap_err(),
            LedgerError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_overdue_credits_aging_and_order() {
        let (db, product_id, customer) = setup(0).await;

        // Due 40 days ago (critical), 10 days ago (danger), 3 days ago
        // (warning), tomorrow (not overdue).
        let critical = credit_sale(&db, &product_id, &customer.id, 100, date(2026, 7, 6)).await;
        let danger = credit_sale(&db, &product_id, &customer.id, 100, date(2026, 8, 5)).await;
        let warning = credit_sale(&db, &product_id, &customer.id, 100, date(2026, 8, 12)).await;
        credit_sale(&db, &product_id, &customer.id, 100, date(2026, 8, 16)).await;

        let overdue = db.credit().overdue_credits(1).await.unwrap();
        assert_eq!(overdue.len(), 3);

        // Soonest due date first
        assert_eq!(overdue[0].sale_id, critical.id);
        assert_eq!(overdue[0].days_overdue, 40);
        assert_eq!(overdue[0].severity, OverdueSeverity::Critical);
        assert_eq!(overdue[1].sale_id, danger.id);
        assert_eq!(overdue[1].severity, OverdueSeverity::Danger);
        assert_eq!(overdue[2].sale_id, warning.id);
        assert_eq!(overdue[2].severity, OverdueSeverity::Warning);

        // Filtering by minimum age
        let old_only = db.credit().overdue_credits(8).await.unwrap();
        assert_eq!(old_only.len(), 2);

        // Paying one off drops it from the list
        db.credit().record_payment(payment(&warning.id, &customer.id, 100)).await.unwrap();
        let after = db.credit().overdue_credits(1).await.unwrap();
        assert_eq!(after.len(), 2);
        assert!(after.iter().all(|o| o.sale_id != warning.id));
    }

    #[tokio::test]
    async fn test_overdue_credits_is_idempotent() {
        let (db, product_id, customer) = setup(0).await;
        credit_sale(&db, &product_id, &customer.id, 100, date(2026, 8, 1)).await;

        let first = db.credit().overdue_credits(1).await.unwrap();
        let second = db.credit().overdue_credits(1).await.unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].days_overdue, second[0].days_overdue);
        assert_eq!(first[0].remaining, second[0].remaining);
    }

    #[tokio::test]
    async fn test_credit_summary() {
        let (db, product_id, customer) = setup(0).await;

        let overdue_sale = credit_sale(&db, &product_id, &customer.id, 100, date(2026, 8, 1)).await;
        credit_sale(&db, &product_id, &customer.id, 50, date(2026, 9, 1)).await;
        db.credit().record_payment(payment(&overdue_sale.id, &customer.id, 40)).await.unwrap();

        let summary = db.credit().credit_summary().await.unwrap();
        assert_eq!(summary.total_outstanding, Money::from_naira(110));
        assert_eq!(summary.customers_with_balance, 1);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.overdue_amount, Money::from_naira(60));
        assert_eq!(summary.recent_payments.len(), 1);
        assert_eq!(summary.month_credit_count, 2);
        assert_eq!(summary.month_credit_amount, Money::from_naira(150));
    }

    #[tokio::test]
    async fn test_customer_credit_history_matches_balance() {
        let (db, product_id, customer) = setup(0).await;

        let first = credit_sale(&db, &product_id, &customer.id, 100, date(2026, 9, 1)).await;
        credit_sale(&db, &product_id, &customer.id, 50, date(2026, 9, 10)).await;
        db.credit().record_payment(payment(&first.id, &customer.id, 70)).await.unwrap();

        let history = db.credit().customer_credit_history(&customer.id).await.unwrap();
        assert_eq!(history.sales.len(), 2);
        assert_eq!(history.total_credit, Money::from_naira(150));
        assert_eq!(history.total_paid, Money::from_naira(70));
        assert_eq!(history.total_remaining, Money::from_naira(80));

        // The ledger identity: history totals agree with the balance column
        assert_eq!(
            history.customer.outstanding_balance_kobo,
            history.total_remaining.kobo()
        );

        let first_entry = history.sales.iter().find(|h| h.sale.id == first.id).unwrap();
        assert_eq!(first_entry.paid, Money::from_naira(70));
        assert_eq!(first_entry.remaining, Money::from_naira(30));
        assert_eq!(first_entry.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_history_for_unknown_customer() {
        let (db, _, _) = setup(0).await;
        let err = db.credit().customer_credit_history("nope").await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
