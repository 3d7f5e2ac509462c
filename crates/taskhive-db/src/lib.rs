//! # taskhive-db
//!
//! PostgreSQL persistence layer for taskhive: the task repository, the
//! attachment store with its filesystem backend, the activity-log sink, and
//! the user directory lookup.
//!
//! Table layout (schema managed externally):
//!
//! ```text
//! task          id, owner_id, title, description, status, priority,
//!               category_id, tags JSONB, due_date, completed_at,
//!               attachments JSONB, shared_with JSONB,
//!               is_deleted, deleted_at, created_at, updated_at
//! activity_log  id, at_utc, actor, action, task_id
//! users         id, name, email, ... (owned by the identity service)
//! ```

pub mod attachments;
pub mod audit;
pub mod pool;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use sqlx::PgPool;

use taskhive_core::Result;

pub use attachments::{
    decode_original_filename, sanitize_filename, storage_name_for, validate_upload,
    AttachmentStore, FilesystemBackend, StorageBackend,
};
pub use audit::{NullAuditSink, PgAuditSink};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tasks::PgTaskRepository;
pub use users::PgUserDirectory;

/// Aggregated database handle shared across the API.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub tasks: Arc<PgTaskRepository>,
    pub users: Arc<PgUserDirectory>,
}

impl Database {
    /// Connect and wire the repositories against a storage root for
    /// attachment files.
    pub async fn connect(database_url: &str, storage_root: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::with_pool(pool, storage_root))
    }

    /// Build repositories over an existing pool.
    pub fn with_pool(pool: PgPool, storage_root: &str) -> Self {
        let store = AttachmentStore::new(FilesystemBackend::new(storage_root));
        let audit = Arc::new(PgAuditSink::new(pool.clone()));
        let tasks = Arc::new(PgTaskRepository::new(pool.clone(), store, audit));
        let users = Arc::new(PgUserDirectory::new(pool.clone()));
        Self { pool, tasks, users }
    }
}
