//! # Sale Repository
//!
//! Read side for completed sales. Sales are only ever written by the
//! checkout engine, inside its transaction; this repository answers
//! receipt lookups and history queries.

use sqlx::SqlitePool;

use kasuwa_core::{Sale, SaleItem};

use crate::error::DbResult;

/// Repository for sale queries.
#[derive(Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const SALE_COLUMNS: &str = "id, transaction_id, cashier_id, customer_id, \
     total_kobo, discount_kobo, payment_method, credit_due_date, \
     credit_amount_kobo, created_at";

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale by its human-readable transaction id (receipt number).
    pub async fn find_by_transaction_id(&self, transaction_id: &str) -> DbResult<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE transaction_id = ?1",
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Line items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_kobo, total_kobo, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// A sale together with its line items, or None if the sale is unknown.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<(Sale, Vec<SaleItem>)>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(&sale.id).await?;
        Ok(Some((sale, items)))
    }

    /// Most recent sales, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sales for one customer, newest first.
    pub async fn for_customer(&self, customer_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE customer_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(customer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_unknown_sale_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        assert!(repo.get_by_id("nope").await.unwrap().is_none());
        assert!(repo
            .find_by_transaction_id("TXN-0-XXXXX")
            .await
            .unwrap()
            .is_none());
        assert!(repo.get_with_items("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sales().recent(10).await.unwrap().is_empty());
    }
}
