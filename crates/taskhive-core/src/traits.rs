//! Core traits for taskhive abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// TASK REPOSITORY
// =============================================================================

/// Filters and pagination for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksRequest {
    /// Filter by status.
    pub status: Option<TaskStatus>,
    /// Filter by priority.
    pub priority: Option<TaskPriority>,
    /// Filter by category reference (sentinels mean "no filter").
    pub category: Option<String>,
    /// Case-insensitive substring match over title and description.
    pub search: Option<String>,
    /// "dueDate" sorts by due date ascending; anything else sorts by
    /// creation time descending.
    pub sort_by: Option<String>,
    /// 1-based page number; clamped to >= 1.
    pub page: Option<i64>,
    /// Page size; clamped to [1, 100].
    pub limit: Option<i64>,
}

/// One page of tasks plus the unpaged total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

/// Result of an update, carrying warnings for attachment files that could
/// not be removed from disk (their records are retained).
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub task: Task,
    pub warnings: Vec<String>,
}

/// Downloaded attachment bytes plus the user-facing filename.
#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    pub data: Vec<u8>,
    pub filename: String,
}

/// Repository for permission-gated task operations.
///
/// Every operation that takes a `principal` fetches the task first, evaluates
/// permissions against the fetched state, and only then mutates; existence
/// is always checked before permission, so probing a nonexistent id yields
/// `TaskNotFound` rather than `PermissionDenied`.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a task owned by `owner`.
    async fn create(&self, req: CreateTaskRequest, owner: Uuid) -> Result<Task>;

    /// List tasks visible to `principal` (owned or shared), filtered and
    /// paginated.
    async fn list(&self, req: ListTasksRequest, principal: Uuid) -> Result<TaskPage>;

    /// Fetch a single task; requires view access.
    async fn get(&self, id: Uuid, principal: Uuid) -> Result<Task>;

    /// Partial update plus attachment removals/additions; requires edit
    /// access. Owner and share list are never mutated by this path.
    async fn update(
        &self,
        id: Uuid,
        req: UpdateTaskRequest,
        ops: AttachmentOps,
        principal: Uuid,
    ) -> Result<UpdateOutcome>;

    /// Soft-delete; owner only. A deleted task is excluded from lookups, so
    /// deleting it again yields `TaskNotFound`.
    async fn soft_delete(&self, id: Uuid, principal: Uuid) -> Result<Task>;

    /// Grant `collaborator` view or edit access. Owner only (the task lookup
    /// is owner-scoped); a duplicate grant fails with `AlreadyShared`.
    async fn share(
        &self,
        id: Uuid,
        owner: Uuid,
        collaborator: Uuid,
        permission: SharePermission,
    ) -> Result<Task>;

    /// Store an uploaded file and append its record; requires edit access.
    /// The permission check happens before any file is written.
    async fn upload_attachment(
        &self,
        id: Uuid,
        principal: Uuid,
        filename: &str,
        data: &[u8],
    ) -> Result<Task>;

    /// Read an attachment's bytes for serving; requires view access.
    async fn download_attachment(
        &self,
        id: Uuid,
        attachment_id: Uuid,
        principal: Uuid,
    ) -> Result<AttachmentDownload>;
}

// =============================================================================
// COLLABORATOR LOOKUP
// =============================================================================

/// Minimal view of a user supplied by the identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Lookup of registered users for share grants. Registration and
/// authentication live elsewhere; the core only resolves identifiers.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRef>>;
}

// =============================================================================
// AUDIT SINK
// =============================================================================

/// Audit record emitted after a successful mutation.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Operation kind: "create", "update", "delete", "share", "upload".
    pub action: String,
    pub task_id: Uuid,
    pub actor: Uuid,
}

/// Fire-and-forget audit recorder invoked post-commit by the repository.
/// Implementations swallow and log their own failures; recording must never
/// fail a user-facing operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}

// =============================================================================
// GENERATION BACKEND
// =============================================================================

/// External text-generation call used by the drafting client.
///
/// `generate_json` sends one prompt and returns the raw response text, which
/// the caller parses strictly as JSON. Throttling surfaces as
/// `Error::RateLimited` so the retry loop can distinguish it from hard
/// failures.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_json(&self, prompt: &str) -> Result<String>;
}
