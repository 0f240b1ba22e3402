//! # Customer Repository
//!
//! Database operations for credit customers.
//!
//! `outstanding_balance_kobo` is read-only here: it only moves inside the
//! checkout and credit engines, in the same transaction as the sale or
//! payment row that explains the movement.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use kasuwa_core::clock::Clock;
use kasuwa_core::Customer;

use crate::error::{DbError, DbResult};

/// Fields supplied when registering a customer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// 0 means no limit.
    pub credit_limit_kobo: i64,
}

/// Repository for customer database operations.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        CustomerRepository { pool, clock }
    }

    /// Registers a customer.
    ///
    /// Phone and email must be unique among ACTIVE customers; a deactivated
    /// customer's contact details can be reused.
    pub async fn create(&self, new: NewCustomer) -> DbResult<Customer> {
        if let Some(phone) = &new.phone {
            if self.contact_taken("phone", phone).await? {
                return Err(DbError::duplicate("phone", phone));
            }
        }
        if let Some(email) = &new.email {
            if self.contact_taken("email", email).await? {
                return Err(DbError::duplicate("email", email));
            }
        }

        let now = self.clock.now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            credit_limit_kobo: new.credit_limit_kobo,
            outstanding_balance_kobo: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, email, address,
                credit_limit_kobo, outstanding_balance_kobo,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.credit_limit_kobo)
        .bind(customer.outstanding_balance_kobo)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn contact_taken(&self, column: &str, value: &str) -> DbResult<bool> {
        // column is one of two literals, never user input
        let sql = format!(
            "SELECT COUNT(*) FROM customers WHERE {} = ?1 AND is_active = 1",
            column
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Gets a customer by ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, address,
                   credit_limit_kobo, outstanding_balance_kobo,
                   is_active, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists active customers sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, address,
                   credit_limit_kobo, outstanding_balance_kobo,
                   is_active, created_at, updated_at
            FROM customers
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Searches active customers by name or phone substring.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query);

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, email, address,
                   credit_limit_kobo, outstanding_balance_kobo,
                   is_active, created_at, updated_at
            FROM customers
            WHERE is_active = 1 AND (name LIKE ?1 OR phone LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Updates customer details.
    ///
    /// Does NOT touch `outstanding_balance_kobo`; the balance only moves with
    /// a matching sale or payment row.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let now = self.clock.now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                email = ?4,
                address = ?5,
                credit_limit_kobo = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.credit_limit_kobo)
        .bind(customer.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Deactivates a customer. Sale history and any outstanding balance
    /// remain queryable.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating customer");

        let now = self.clock.now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET is_active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }
}
