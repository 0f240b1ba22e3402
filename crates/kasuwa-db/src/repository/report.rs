//! # Report Repository
//!
//! Aggregate queries for the end-of-day view: how much was sold, how much
//! of it was on credit, and what moved.
//!
//! All SQLite timestamps are stored as UTC RFC 3339 text, so `DATE(...)`
//! buckets by UTC calendar day.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use kasuwa_core::clock::Clock;

use crate::error::DbResult;

/// One day's sales totals (all amounts in kobo).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailySummary {
    pub sale_count: i64,
    pub gross_kobo: i64,
    pub discount_kobo: i64,
    pub cash_kobo: i64,
    pub credit_kobo: i64,
}

/// Sales ranking entry for a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub units_sold: i64,
    pub revenue_kobo: i64,
}

/// Repository for aggregate reporting queries.
#[derive(Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ReportRepository { pool, clock }
    }

    /// Totals for today.
    pub async fn today_summary(&self) -> DbResult<DailySummary> {
        self.daily_summary(self.clock.today()).await
    }

    /// Totals for one calendar day.
    ///
    /// `gross_kobo` is the post-discount amount actually charged;
    /// `credit_kobo` is the slice of it that went on the book.
    pub async fn daily_summary(&self, day: NaiveDate) -> DbResult<DailySummary> {
        let summary = sqlx::query_as::<_, DailySummary>(
            r#"
            SELECT
                COUNT(*) AS sale_count,
                COALESCE(SUM(total_kobo), 0) AS gross_kobo,
                COALESCE(SUM(discount_kobo), 0) AS discount_kobo,
                COALESCE(SUM(CASE WHEN payment_method = 'cash' THEN total_kobo ELSE 0 END), 0)
                    AS cash_kobo,
                COALESCE(SUM(CASE WHEN payment_method = 'credit' THEN credit_amount_kobo ELSE 0 END), 0)
                    AS credit_kobo
            FROM sales
            WHERE DATE(created_at) = ?1
            "#,
        )
        .bind(day.format("%Y-%m-%d").to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Best-selling products over a date range (inclusive), by units sold.
    pub async fn top_products(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                si.product_id AS product_id,
                p.name AS name,
                SUM(si.quantity) AS units_sold,
                SUM(si.total_kobo) AS revenue_kobo
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE DATE(s.created_at) BETWEEN ?1 AND ?2
            GROUP BY si.product_id, p.name
            ORDER BY units_sold DESC, revenue_kobo DESC
            LIMIT ?3
            "#,
        )
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(to.format("%Y-%m-%d").to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_empty_day_summary_is_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let summary = db.reports().today_summary().await.unwrap();

        assert_eq!(summary.sale_count, 0);
        assert_eq!(summary.gross_kobo, 0);
        assert_eq!(summary.cash_kobo, 0);
        assert_eq!(summary.credit_kobo, 0);
    }

    #[tokio::test]
    async fn test_top_products_empty_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

        let rows = db.reports().top_products(from, to, 5).await.unwrap();
        assert!(rows.is_empty());
    }
}
