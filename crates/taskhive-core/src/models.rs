//! Core data model for taskhive.
//!
//! A [`Task`] is a single row/document owned by its creator. Collaboration is
//! recorded inline in `shared_with`; attachments live inline in `attachments`
//! and never exist independently of their task. Deletion is always soft: the
//! record is retained and excluded from normal lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Stable wire/database string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Parse a stored status string. Unknown values fall back to `Pending`.
    pub fn parse(s: &str) -> Self {
        match s {
            "in-progress" => Self::InProgress,
            "done" => Self::Done,
            _ => Self::Pending,
        }
    }
}

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Parse a stored priority string. Unknown values fall back to `Medium`.
    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Medium,
        }
    }
}

/// Access level granted to a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    #[default]
    View,
    Edit,
}

/// One collaborator grant on a task. At most one entry per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntry {
    pub user_id: Uuid,
    pub permission: SharePermission,
}

/// Metadata for one uploaded file, owned by its task.
///
/// `filename` is the decoded original name shown to users; `stored_name` is
/// the collision-proof name relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRecord {
    pub id: Uuid,
    pub filename: String,
    pub stored_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A task record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub attachments: Vec<AttachmentRecord>,
    pub shared_with: Vec<ShareEntry>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Raw category reference; sentinel values are normalized to "none".
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Upload records already persisted to storage by the caller.
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
}

/// Partial update: only provided fields are applied. Ownership and the share
/// list are never touched by this path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Attachment mutations applied alongside an update: removals first, then
/// additions.
#[derive(Debug, Clone, Default)]
pub struct AttachmentOps {
    pub remove: Vec<Uuid>,
    pub add: Vec<AttachmentRecord>,
}

impl AttachmentOps {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// Validate and trim a task title.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Normalize a raw category reference.
///
/// Empty strings and the literal sentinels `"undefined"` / `"null"` (sent by
/// sloppy clients) mean "no category". Anything else must parse as a UUID.
pub fn normalize_category(raw: Option<&str>) -> Result<Option<Uuid>> {
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("undefined")
        || trimmed.eq_ignore_ascii_case("null")
    {
        return Ok(None);
    }
    trimmed
        .parse::<Uuid>()
        .map(Some)
        .map_err(|_| Error::Validation(format!("Invalid category reference: {}", trimmed)))
}

impl Task {
    /// Merge a partial update into this task.
    ///
    /// Only provided fields change. Moving status to `Done` stamps
    /// `completed_at`; moving it away clears the stamp. Returns a validation
    /// error for an empty title or malformed category reference.
    pub fn apply_update(&mut self, req: &UpdateTaskRequest, now: DateTime<Utc>) -> Result<()> {
        if let Some(title) = &req.title {
            self.title = validate_title(title)?;
        }
        if let Some(description) = &req.description {
            self.description = Some(description.trim().to_string());
        }
        if let Some(status) = req.status {
            if status == TaskStatus::Done {
                if self.status != TaskStatus::Done {
                    self.completed_at = Some(now);
                }
            } else {
                self.completed_at = None;
            }
            self.status = status;
        }
        if let Some(priority) = req.priority {
            self.priority = priority;
        }
        if let Some(category) = &req.category {
            self.category_id = normalize_category(Some(category))?;
        }
        if let Some(tags) = &req.tags {
            self.tags = tags.iter().map(|t| t.trim().to_string()).collect();
        }
        if let Some(due) = req.due_date {
            self.due_date = Some(due);
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task(owner: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: "Write report".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            category_id: None,
            tags: vec![],
            due_date: None,
            completed_at: None,
            attachments: vec![],
            shared_with: vec![],
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn test_validate_title_rejects_whitespace_only() {
        assert!(matches!(validate_title("   "), Err(Error::Validation(_))));
    }

    #[test]
    fn test_normalize_category_sentinels() {
        assert_eq!(normalize_category(None).unwrap(), None);
        assert_eq!(normalize_category(Some("")).unwrap(), None);
        assert_eq!(normalize_category(Some("undefined")).unwrap(), None);
        assert_eq!(normalize_category(Some("NULL")).unwrap(), None);
    }

    #[test]
    fn test_normalize_category_parses_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(
            normalize_category(Some(&id.to_string())).unwrap(),
            Some(id)
        );
    }

    #[test]
    fn test_normalize_category_rejects_garbage() {
        assert!(matches!(
            normalize_category(Some("work-stuff")),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_apply_update_partial() {
        let mut task = sample_task(Uuid::new_v4());
        let created = task.created_at;
        let req = UpdateTaskRequest {
            priority: Some(TaskPriority::Urgent),
            ..Default::default()
        };
        task.apply_update(&req, Utc::now()).unwrap();

        assert_eq!(task.priority, TaskPriority::Urgent);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, created);
    }

    #[test]
    fn test_apply_update_done_stamps_completed_at() {
        let mut task = sample_task(Uuid::new_v4());
        let req = UpdateTaskRequest {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        let now = Utc::now();
        task.apply_update(&req, now).unwrap();
        assert_eq!(task.completed_at, Some(now));

        // Re-opening clears the stamp.
        let reopen = UpdateTaskRequest {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        task.apply_update(&reopen, Utc::now()).unwrap();
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn test_apply_update_done_twice_keeps_first_stamp() {
        let mut task = sample_task(Uuid::new_v4());
        let first = Utc::now();
        task.apply_update(
            &UpdateTaskRequest {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
            first,
        )
        .unwrap();
        task.apply_update(
            &UpdateTaskRequest {
                status: Some(TaskStatus::Done),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(task.completed_at, Some(first));
    }

    #[test]
    fn test_apply_update_rejects_empty_title() {
        let mut task = sample_task(Uuid::new_v4());
        let req = UpdateTaskRequest {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(task.apply_update(&req, Utc::now()).is_err());
        assert_eq!(task.title, "Write report");
    }

    #[test]
    fn test_apply_update_clears_category_via_sentinel() {
        let mut task = sample_task(Uuid::new_v4());
        task.category_id = Some(Uuid::new_v4());
        let req = UpdateTaskRequest {
            category: Some("".to_string()),
            ..Default::default()
        };
        task.apply_update(&req, Utc::now()).unwrap();
        assert_eq!(task.category_id, None);
    }

    #[test]
    fn test_status_round_trip() {
        for s in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(TaskStatus::parse(s.as_str()), s);
        }
    }

    #[test]
    fn test_status_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }

    #[test]
    fn test_priority_unknown_falls_back_to_medium() {
        assert_eq!(TaskPriority::parse("critical"), TaskPriority::Medium);
    }
}
