//! Activity-log sink.
//!
//! The repository invokes this after a successful mutation (post-commit
//! hook). Recording is fire-and-forget: a failed insert is logged at warn
//! level and never surfaces to the caller.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use taskhive_core::{AuditEntry, AuditSink};

/// PostgreSQL activity-log recorder.
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, entry: AuditEntry) {
        let result = sqlx::query(
            "INSERT INTO activity_log (id, at_utc, actor, action, task_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::now_v7())
        .bind(Utc::now())
        .bind(entry.actor)
        .bind(&entry.action)
        .bind(entry.task_id)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(
                subsystem = "db",
                component = "audit",
                action = %entry.action,
                task_id = %entry.task_id,
                error = %e,
                "failed to record activity entry"
            );
        }
    }
}

/// No-op sink for tests and tooling that do not need an audit trail.
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _entry: AuditEntry) {}
}
