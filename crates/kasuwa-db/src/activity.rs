//! # Activity Log
//!
//! Fire-and-forget audit trail of who did what.
//!
//! The engines write here AFTER their transaction commits, and a failed log
//! write is demoted to a warning - it must never roll back or fail the
//! business operation it describes.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use kasuwa_core::clock::Clock;

use crate::error::DbResult;

/// Append-only activity log.
#[derive(Clone)]
pub struct ActivityLog {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ActivityLog {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ActivityLog { pool, clock }
    }

    /// Appends one entry. Callers on the hot path should prefer
    /// [`ActivityLog::log_best_effort`].
    pub async fn log(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: Option<&str>,
        details: &str,
    ) -> DbResult<()> {
        let id = Uuid::new_v4().to_string();
        let now = self.clock.now();

        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, actor, action, entity_type, entity_id, details, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(actor)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(details)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends one entry, swallowing failures with a warning.
    ///
    /// Used by the engines after commit: the sale/payment already happened,
    /// and a broken audit trail is not a reason to report it as failed.
    pub async fn log_best_effort(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: Option<&str>,
        details: &str,
    ) {
        if let Err(err) = self
            .log(actor, action, entity_type, entity_id, details)
            .await
        {
            warn!(action = %action, error = %err, "Activity log write failed");
        }
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, actor, action, entity_type, entity_id, details, created_at
            FROM activity_logs
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

/// One row of the audit trail.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_log_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let log = db.activity();

        log.log("user-1", "create_sale", "sale", Some("s-1"), "Created cash sale")
            .await
            .unwrap();
        log.log("user-2", "record_payment", "credit_payment", None, "Recorded ₦50.00")
            .await
            .unwrap();

        let entries = log.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.action == "create_sale"));
    }

    #[tokio::test]
    async fn test_best_effort_never_panics_after_close() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let log = db.activity();
        db.close().await;

        // Pool is closed; the write fails but only warns.
        log.log_best_effort("user-1", "create_sale", "sale", None, "details")
            .await;
    }
}
