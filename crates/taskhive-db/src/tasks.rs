//! Task repository implementation.
//!
//! Tasks are one row each in the `task` table: scalar columns plus JSONB
//! columns for `tags`, `attachments`, and `shared_with`, preserving the
//! document shape of the records. All permission-gated mutations are
//! fetch-then-check-then-update: the task is loaded, the permission
//! evaluator runs against the fetched state, and only then is the row
//! updated (still guarded by `is_deleted = false` so a racing delete loses).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use taskhive_core::{
    can_edit, can_view, is_owner, validate_title, AttachmentDownload, AttachmentOps,
    AttachmentRecord, AuditEntry, AuditSink, CreateTaskRequest, Error, ListTasksRequest,
    Pagination, Result, ShareEntry, SharePermission, Task, TaskPage, TaskPriority, TaskRepository,
    TaskStatus, UpdateOutcome, UpdateTaskRequest,
};

use crate::attachments::AttachmentStore;

/// PostgreSQL implementation of [`TaskRepository`].
pub struct PgTaskRepository {
    pool: PgPool,
    store: AttachmentStore,
    audit: Arc<dyn AuditSink>,
}

// =============================================================================
// LIST QUERY BUILDING
// =============================================================================

/// Visibility predicate: the principal owns the task or appears in its share
/// list (any permission). Parameter `$1` is the principal id.
fn visibility_clause() -> &'static str {
    "(t.owner_id = $1 OR EXISTS (
        SELECT 1 FROM jsonb_array_elements(t.shared_with) s
        WHERE s->>'userId' = $1::text
    ))"
}

/// Escape LIKE metacharacters in a user-supplied search term.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Order clause: due date ascending on request, else newest first.
fn build_order_clause(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("dueDate") => "t.due_date ASC NULLS LAST",
        _ => "t.created_at DESC",
    }
}

/// Append optional filter predicates, advancing the parameter index in the
/// same order `list` binds values.
fn build_filter_clauses(req: &ListTasksRequest, category: Option<Uuid>) -> (String, usize) {
    let mut clauses = String::new();
    let mut param_idx = 2;

    if req.status.is_some() {
        clauses.push_str(&format!(" AND t.status = ${}", param_idx));
        param_idx += 1;
    }
    if req.priority.is_some() {
        clauses.push_str(&format!(" AND t.priority = ${}", param_idx));
        param_idx += 1;
    }
    if category.is_some() {
        clauses.push_str(&format!(" AND t.category_id = ${}", param_idx));
        param_idx += 1;
    }
    if req.search.is_some() {
        clauses.push_str(&format!(
            " AND (t.title ILIKE ${} OR t.description ILIKE ${})",
            param_idx, param_idx
        ));
        param_idx += 1;
    }

    (clauses, param_idx)
}

/// Map a database row to a [`Task`].
fn task_from_row(row: &sqlx::postgres::PgRow) -> Result<Task> {
    let status: String = row.get("status");
    let priority: String = row.get("priority");

    let tags: Vec<String> = serde_json::from_value(row.get::<serde_json::Value, _>("tags"))?;
    let attachments: Vec<AttachmentRecord> =
        serde_json::from_value(row.get::<serde_json::Value, _>("attachments"))?;
    let shared_with: Vec<ShareEntry> =
        serde_json::from_value(row.get::<serde_json::Value, _>("shared_with"))?;

    Ok(Task {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        status: TaskStatus::parse(&status),
        priority: TaskPriority::parse(&priority),
        category_id: row.get("category_id"),
        tags,
        due_date: row.get("due_date"),
        completed_at: row.get("completed_at"),
        attachments,
        shared_with,
        is_deleted: row.get("is_deleted"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const TASK_COLUMNS: &str = "t.id, t.owner_id, t.title, t.description, t.status, t.priority, \
     t.category_id, t.tags, t.due_date, t.completed_at, t.attachments, t.shared_with, \
     t.is_deleted, t.deleted_at, t.created_at, t.updated_at";

impl PgTaskRepository {
    /// Create a new PgTaskRepository with the given pool, attachment store,
    /// and post-commit audit sink.
    pub fn new(pool: PgPool, store: AttachmentStore, audit: Arc<dyn AuditSink>) -> Self {
        Self { pool, store, audit }
    }

    /// Fetch a non-deleted task by id. `None` covers absent and soft-deleted
    /// rows alike; callers translate that to `TaskNotFound`.
    async fn fetch_active(&self, id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM task t WHERE t.id = $1 AND t.is_deleted = false",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| task_from_row(&r)).transpose()
    }

    /// Persist the mutable columns of a task. Guarded by `is_deleted = false`
    /// so an update racing a delete affects zero rows.
    async fn save(&self, task: &Task) -> Result<()> {
        let result = sqlx::query(
            "UPDATE task SET
                title = $2, description = $3, status = $4, priority = $5,
                category_id = $6, tags = $7, due_date = $8, completed_at = $9,
                attachments = $10, shared_with = $11, updated_at = $12
             WHERE id = $1 AND is_deleted = false",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.category_id)
        .bind(serde_json::to_value(&task.tags)?)
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(serde_json::to_value(&task.attachments)?)
        .bind(serde_json::to_value(&task.shared_with)?)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::TaskNotFound(task.id.to_string()));
        }
        Ok(())
    }

    async fn audit(&self, action: &str, task_id: Uuid, actor: Uuid) {
        self.audit
            .record(AuditEntry {
                action: action.to_string(),
                task_id,
                actor,
            })
            .await;
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, req: CreateTaskRequest, owner: Uuid) -> Result<Task> {
        let title = validate_title(&req.title)?;
        let category_id = taskhive_core::normalize_category(req.category.as_deref())?;
        let now = Utc::now();
        let status = req.status.unwrap_or_default();
        let priority = req.priority.unwrap_or_default();
        let tags: Vec<String> = req.tags.iter().map(|t| t.trim().to_string()).collect();
        let completed_at: Option<DateTime<Utc>> =
            (status == TaskStatus::Done).then_some(now);
        let id = Uuid::now_v7();

        let row = sqlx::query(&format!(
            "INSERT INTO task AS t_ (id, owner_id, title, description, status, priority,
                category_id, tags, due_date, completed_at, attachments, shared_with,
                is_deleted, deleted_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, '[]'::jsonb,
                false, NULL, $12, $12)
             RETURNING {}",
            TASK_COLUMNS.replace("t.", "t_.")
        ))
        .bind(id)
        .bind(owner)
        .bind(&title)
        .bind(req.description.as_deref().map(str::trim))
        .bind(status.as_str())
        .bind(priority.as_str())
        .bind(category_id)
        .bind(serde_json::to_value(&tags)?)
        .bind(req.due_date)
        .bind(completed_at)
        .bind(serde_json::to_value(&req.attachments)?)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let task = task_from_row(&row)?;
        info!(
            subsystem = "db",
            component = "task_repo",
            op = "create",
            task_id = %task.id,
            principal = %owner,
            "task created"
        );
        self.audit("create", task.id, owner).await;
        Ok(task)
    }

    async fn list(&self, req: ListTasksRequest, principal: Uuid) -> Result<TaskPage> {
        let pagination = Pagination::clamp(req.page, req.limit);
        let category = taskhive_core::normalize_category(req.category.as_deref())?;
        let search_pattern = req
            .search
            .as_deref()
            .map(|s| format!("%{}%", escape_like(s.trim())));

        let (filters, param_idx) = build_filter_clauses(&req, category);
        let base = format!(
            "FROM task t WHERE t.is_deleted = false AND {}{}",
            visibility_clause(),
            filters
        );

        // Unpaged total of the filtered set.
        let count_sql = format!("SELECT COUNT(*) {}", base);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(principal);
        if let Some(status) = req.status {
            count_query = count_query.bind(status.as_str());
        }
        if let Some(priority) = req.priority {
            count_query = count_query.bind(priority.as_str());
        }
        if let Some(category) = category {
            count_query = count_query.bind(category);
        }
        if let Some(pattern) = &search_pattern {
            count_query = count_query.bind(pattern);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let page_sql = format!(
            "SELECT {} {} ORDER BY {} LIMIT ${} OFFSET ${}",
            TASK_COLUMNS,
            base,
            build_order_clause(req.sort_by.as_deref()),
            param_idx,
            param_idx + 1
        );

        let mut page_query = sqlx::query(&page_sql).bind(principal);
        if let Some(status) = req.status {
            page_query = page_query.bind(status.as_str());
        }
        if let Some(priority) = req.priority {
            page_query = page_query.bind(priority.as_str());
        }
        if let Some(category) = category {
            page_query = page_query.bind(category);
        }
        if let Some(pattern) = &search_pattern {
            page_query = page_query.bind(pattern);
        }
        let rows = page_query
            .bind(pagination.limit)
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(task_from_row(&row)?);
        }

        debug!(
            subsystem = "db",
            component = "task_repo",
            op = "list",
            principal = %principal,
            result_count = tasks.len(),
            total,
            "task listing"
        );

        Ok(TaskPage {
            tasks,
            total,
            page: pagination.page,
            limit: pagination.limit,
            pages: pagination.pages(total),
        })
    }

    async fn get(&self, id: Uuid, principal: Uuid) -> Result<Task> {
        // Existence before permission: probing a nonexistent id must yield
        // NotFound for everyone.
        let task = self
            .fetch_active(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if !can_view(&task, principal) {
            return Err(Error::PermissionDenied(
                "You do not have access to this task".to_string(),
            ));
        }
        Ok(task)
    }

    async fn update(
        &self,
        id: Uuid,
        req: UpdateTaskRequest,
        ops: AttachmentOps,
        principal: Uuid,
    ) -> Result<UpdateOutcome> {
        let mut task = self
            .fetch_active(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if !can_edit(&task, principal) {
            return Err(Error::PermissionDenied(
                "You do not have permission to edit this task".to_string(),
            ));
        }

        task.apply_update(&req, Utc::now())?;

        // Removals first (files are deleted before records are dropped),
        // then additions.
        let mut warnings = Vec::new();
        if !ops.is_empty() {
            let records = std::mem::take(&mut task.attachments);
            let (mut kept, removal_warnings) =
                self.store.remove_attachments(records, &ops.remove).await;
            kept.extend(ops.add);
            task.attachments = kept;
            warnings = removal_warnings;
        }

        self.save(&task).await?;
        self.audit("update", task.id, principal).await;
        Ok(UpdateOutcome { task, warnings })
    }

    async fn soft_delete(&self, id: Uuid, principal: Uuid) -> Result<Task> {
        let mut task = self
            .fetch_active(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if !is_owner(&task, principal) {
            return Err(Error::PermissionDenied(
                "Only the owner can delete a task".to_string(),
            ));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE task SET is_deleted = true, deleted_at = $2, updated_at = $2
             WHERE id = $1 AND is_deleted = false",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::TaskNotFound(id.to_string()));
        }

        task.is_deleted = true;
        task.deleted_at = Some(now);
        task.updated_at = now;

        info!(
            subsystem = "db",
            component = "task_repo",
            op = "soft_delete",
            task_id = %id,
            principal = %principal,
            "task soft-deleted"
        );
        self.audit("delete", id, principal).await;
        Ok(task)
    }

    async fn share(
        &self,
        id: Uuid,
        owner: Uuid,
        collaborator: Uuid,
        permission: SharePermission,
    ) -> Result<Task> {
        // Owner-scoped lookup: a non-owner (even an edit collaborator) sees
        // NotFound here, never a hint that the task exists.
        let row = sqlx::query(&format!(
            "SELECT {} FROM task t
             WHERE t.id = $1 AND t.owner_id = $2 AND t.is_deleted = false",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        let mut task = row
            .map(|r| task_from_row(&r))
            .transpose()?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        if task.shared_with.iter().any(|s| s.user_id == collaborator) {
            return Err(Error::AlreadyShared(collaborator));
        }

        task.shared_with.push(ShareEntry {
            user_id: collaborator,
            permission,
        });
        task.updated_at = Utc::now();
        self.save(&task).await?;

        info!(
            subsystem = "db",
            component = "task_repo",
            op = "share",
            task_id = %id,
            principal = %owner,
            collaborator = %collaborator,
            "task shared"
        );
        self.audit("share", id, owner).await;
        Ok(task)
    }

    async fn upload_attachment(
        &self,
        id: Uuid,
        principal: Uuid,
        filename: &str,
        data: &[u8],
    ) -> Result<Task> {
        let mut task = self
            .fetch_active(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        // Permission is checked before any byte hits the disk.
        if !can_edit(&task, principal) {
            return Err(Error::PermissionDenied(
                "You do not have permission to edit this task".to_string(),
            ));
        }

        let record = self.store.store_upload(filename, data).await?;
        task.attachments.push(record);
        task.updated_at = Utc::now();
        self.save(&task).await?;
        self.audit("upload", id, principal).await;
        Ok(task)
    }

    async fn download_attachment(
        &self,
        id: Uuid,
        attachment_id: Uuid,
        principal: Uuid,
    ) -> Result<AttachmentDownload> {
        let task = self.get(id, principal).await?;
        let record = task
            .attachments
            .iter()
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| Error::NotFound(format!("Attachment {} not found", attachment_id)))?;

        let data = self.store.read(record).await.map_err(|e| {
            warn!(
                subsystem = "db",
                component = "task_repo",
                attachment_id = %attachment_id,
                error = %e,
                "attachment bytes unreadable"
            );
            e
        })?;

        Ok(AttachmentDownload {
            data,
            filename: record.filename.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_order_clause() {
        assert_eq!(build_order_clause(Some("dueDate")), "t.due_date ASC NULLS LAST");
        assert_eq!(build_order_clause(Some("anything")), "t.created_at DESC");
        assert_eq!(build_order_clause(None), "t.created_at DESC");
    }

    #[test]
    fn test_filter_clauses_number_params_in_bind_order() {
        let req = ListTasksRequest {
            status: Some(TaskStatus::Pending),
            search: Some("report".to_string()),
            ..Default::default()
        };
        let (clauses, next) = build_filter_clauses(&req, None);
        assert!(clauses.contains("t.status = $2"));
        assert!(clauses.contains("t.title ILIKE $3"));
        assert_eq!(next, 4);
    }

    #[test]
    fn test_filter_clauses_empty() {
        let (clauses, next) = build_filter_clauses(&ListTasksRequest::default(), None);
        assert!(clauses.is_empty());
        assert_eq!(next, 2);
    }

    #[test]
    fn test_filter_clauses_all() {
        let req = ListTasksRequest {
            status: Some(TaskStatus::Done),
            priority: Some(TaskPriority::High),
            search: Some("x".to_string()),
            ..Default::default()
        };
        let (clauses, next) = build_filter_clauses(&req, Some(Uuid::new_v4()));
        assert!(clauses.contains("t.status = $2"));
        assert!(clauses.contains("t.priority = $3"));
        assert!(clauses.contains("t.category_id = $4"));
        assert!(clauses.contains("ILIKE $5"));
        assert_eq!(next, 6);
    }

    #[test]
    fn test_visibility_clause_matches_share_entry_shape() {
        // ShareEntry serializes camelCase; the SQL probes the same key.
        let entry = ShareEntry {
            user_id: Uuid::nil(),
            permission: SharePermission::View,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("userId").is_some());
        assert!(visibility_clause().contains("'userId'"));
    }
}
