//! Task CRUD, sharing, and attachment handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskhive_core::{
    AttachmentOps, AttachmentRecord, CreateTaskRequest, Error, ListTasksRequest, SharePermission,
    Task, TaskRepository, UpdateTaskRequest, UserDirectory, UserRef,
};

use super::{parse_task_id, principal};
use crate::{ApiError, AppState};

pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = principal(&headers)?;
    let task = state.db.tasks.create(req, owner).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Task created successfully",
            "task": task,
        })),
    ))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<ListTasksRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let page = state.db.tasks.list(req, who).await?;
    Ok(Json(page))
}

pub async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let task = state.db.tasks.get(parse_task_id(&id)?, who).await?;
    Ok(Json(task))
}

/// PATCH body: a partial task plus attachment record removals and
/// already-stored additions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskBody {
    #[serde(flatten)]
    pub update: UpdateTaskRequest,
    #[serde(default)]
    pub remove_attachments: Vec<Uuid>,
    /// Attachment records to append, for files already on storage.
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
}

/// Updated task plus warnings for attachment files that could not be
/// removed from disk.
#[derive(Debug, Serialize)]
pub struct UpdateTaskResponse {
    pub message: String,
    pub task: Task,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateTaskBody>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let ops = AttachmentOps {
        remove: body.remove_attachments,
        add: body.attachments,
    };
    let outcome = state
        .db
        .tasks
        .update(parse_task_id(&id)?, body.update, ops, who)
        .await?;
    Ok(Json(UpdateTaskResponse {
        message: "Task updated successfully".to_string(),
        task: outcome.task,
        warnings: outcome.warnings,
    }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    state.db.tasks.soft_delete(parse_task_id(&id)?, who).await?;
    Ok(Json(serde_json::json!({
        "message": "Task deleted successfully",
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTaskRequest {
    pub email: String,
    #[serde(default)]
    pub permission: SharePermission,
}

/// Look up the collaborator named in a share request.
async fn resolve_collaborator(users: &dyn UserDirectory, email: &str) -> Result<UserRef, Error> {
    users
        .find_by_email(email)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No registered user with email {}", email)))
}

pub async fn share_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ShareTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = principal(&headers)?;
    let collaborator = resolve_collaborator(state.db.users.as_ref(), &req.email).await?;
    let task = state
        .db
        .tasks
        .share(parse_task_id(&id)?, owner, collaborator.id, req.permission)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Task shared successfully",
        "task": task,
    })))
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let task_id = parse_task_id(&id)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("Failed to read upload: {}", e)))?;
        let task = state
            .db
            .tasks
            .upload_attachment(task_id, who, &filename, &data)
            .await?;
        return Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Attachment uploaded successfully",
                "task": task,
            })),
        ));
    }

    Err(Error::Validation("No file found in upload".to_string()).into())
}

pub async fn download_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, attachment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let attachment_id: Uuid = attachment_id
        .parse()
        .map_err(|_| Error::NotFound(format!("Attachment {} not found", attachment_id)))?;

    let download = state
        .db
        .tasks
        .download_attachment(parse_task_id(&id)?, attachment_id, who)
        .await?;

    // Quotes in the original filename would break the header value.
    let safe_name = download.filename.replace('"', "_");
    let disposition = format!("attachment; filename=\"{}\"", safe_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.data,
    ))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, attachment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let attachment_id: Uuid = attachment_id
        .parse()
        .map_err(|_| Error::NotFound(format!("Attachment {} not found", attachment_id)))?;

    let ops = AttachmentOps {
        remove: vec![attachment_id],
        add: vec![],
    };
    let outcome = state
        .db
        .tasks
        .update(parse_task_id(&id)?, UpdateTaskRequest::default(), ops, who)
        .await?;
    Ok(Json(UpdateTaskResponse {
        message: "Attachment removed successfully".to_string(),
        task: outcome.task,
        warnings: outcome.warnings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    struct StaticDirectory {
        user: Option<UserRef>,
    }

    #[async_trait]
    impl UserDirectory for StaticDirectory {
        async fn find_by_email(&self, _email: &str) -> taskhive_core::Result<Option<UserRef>> {
            Ok(self.user.clone())
        }
    }

    #[tokio::test]
    async fn test_resolve_collaborator_finds_registered_user() {
        let id = Uuid::new_v4();
        let users = StaticDirectory {
            user: Some(UserRef {
                id,
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
            }),
        };
        let found = resolve_collaborator(&users, "ana@example.com")
            .await
            .unwrap();
        assert_eq!(found.id, id);
    }

    #[tokio::test]
    async fn test_resolve_collaborator_unknown_email_is_not_found() {
        let users = StaticDirectory { user: None };
        let err = resolve_collaborator(&users, "ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_update_body_accepts_attachment_records() {
        let attachment_id = Uuid::new_v4();
        let removal_id = Uuid::new_v4();
        let body: UpdateTaskBody = serde_json::from_value(serde_json::json!({
            "title": "renamed",
            "attachments": [{
                "id": attachment_id,
                "filename": "notes.txt",
                "storedName": "upload-1700000000000-000000001.txt",
                "uploadedAt": Utc::now(),
            }],
            "removeAttachments": [removal_id],
        }))
        .unwrap();

        assert_eq!(body.update.title.as_deref(), Some("renamed"));
        assert_eq!(body.attachments.len(), 1);
        assert_eq!(body.attachments[0].id, attachment_id);
        assert_eq!(body.remove_attachments, vec![removal_id]);
    }

    #[test]
    fn test_update_body_attachment_fields_default_empty() {
        let body: UpdateTaskBody =
            serde_json::from_value(serde_json::json!({ "title": "renamed" })).unwrap();
        assert!(body.attachments.is_empty());
        assert!(body.remove_attachments.is_empty());
    }
}
