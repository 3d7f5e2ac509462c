//! AI drafting handlers.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskhive_ai::{CancelFlag, CategoryRef, TaskDraft};
use taskhive_core::{CreateTaskRequest, ListTasksRequest, Task, TaskRepository};

use super::principal;
use crate::{ApiError, AppState};

/// Category context supplied by the client so drafts can reference
/// categories that exist for this user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub id: Uuid,
    pub name: String,
}

fn to_category_refs(input: Option<Vec<CategoryInput>>) -> Vec<CategoryRef> {
    input
        .unwrap_or_default()
        .into_iter()
        .map(|c| CategoryRef {
            id: c.id,
            name: c.name,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTaskRequest {
    pub description: String,
    #[serde(default)]
    pub categories: Option<Vec<CategoryInput>>,
}

pub async fn generate_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal(&headers)?;
    let categories = to_category_refs(req.categories);
    let draft = state
        .drafting
        .generate_task(&req.description, &categories)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Task draft generated successfully",
        "taskDetails": draft,
        "aiGenerated": true,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

pub async fn breakdown_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BreakdownRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal(&headers)?;
    let breakdown = state
        .drafting
        .breakdown_task(&req.title, &req.description)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Task breakdown generated successfully",
        "breakdown": breakdown,
        "aiGenerated": true,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

pub async fn enhance_description(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EnhanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal(&headers)?;
    let enhanced = state
        .drafting
        .enhance_description(&req.title, &req.description)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Description enhanced successfully",
        "enhanced": enhanced,
        "aiGenerated": true,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

pub async fn assess_priority(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PriorityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal(&headers)?;
    let assessment = state
        .drafting
        .assess_priority(&req.title, &req.description, req.due_date)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Priority assessed successfully",
        "priority": assessment,
        "aiGenerated": true,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGenerateRequest {
    pub descriptions: Vec<String>,
    #[serde(default)]
    pub categories: Option<Vec<CategoryInput>>,
}

pub async fn batch_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BatchGenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal(&headers)?;
    let categories = to_category_refs(req.categories);
    let drafts = state
        .drafting
        .batch_generate(&req.descriptions, &categories, &CancelFlag::new())
        .await?;
    let count = drafts.len();
    Ok(Json(serde_json::json!({
        "message": format!("Generated {} task drafts", count),
        "drafts": drafts,
        "count": count,
        "aiGenerated": true,
    })))
}

/// Optional override for the recent-task context; when absent the caller's
/// latest tasks are used.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsRequest {
    #[serde(default)]
    pub recent_tasks: Option<Vec<String>>,
}

pub async fn suggest_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<SuggestionsRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let Json(req) = body.unwrap_or_default();

    let recent = match req.recent_tasks {
        Some(titles) => titles,
        None => {
            let page = state
                .db
                .tasks
                .list(ListTasksRequest::default(), who)
                .await?;
            page.tasks.into_iter().map(|t| t.title).collect()
        }
    };

    let suggestions = state.drafting.suggest_tasks(&recent).await?;
    Ok(Json(serde_json::json!({
        "message": "Suggestions generated successfully",
        "suggestions": suggestions.suggestions,
        "aiGenerated": true,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskWithAiRequest {
    pub description: String,
    #[serde(default)]
    pub categories: Option<Vec<CategoryInput>>,
    /// Persist the draft immediately. Off by default: the draft is returned
    /// for review without touching the database.
    #[serde(default)]
    pub auto_save: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskWithAiResponse {
    pub message: String,
    pub draft: TaskDraft,
    pub task: Option<Task>,
    pub saved: bool,
}

/// Fold the draft's checklist into the persisted description so nothing the
/// model produced is lost on save.
fn draft_to_create_request(draft: &TaskDraft) -> CreateTaskRequest {
    let mut description = draft.description.clone();
    if !draft.checklist.is_empty() {
        description.push_str("\n\nChecklist:");
        for item in &draft.checklist {
            description.push_str(&format!("\n- [ ] {}", item));
        }
    }
    CreateTaskRequest {
        title: draft.title.clone(),
        description: Some(description),
        priority: Some(draft.priority),
        tags: draft.tags.clone(),
        due_date: draft.due_date,
        ..Default::default()
    }
}

pub async fn create_task_with_ai(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskWithAiRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let who = principal(&headers)?;
    let categories = to_category_refs(req.categories);
    let draft = state
        .drafting
        .generate_task(&req.description, &categories)
        .await?;

    let task = if req.auto_save {
        Some(state.db.tasks.create(draft_to_create_request(&draft), who).await?)
    } else {
        None
    };

    let saved = task.is_some();
    let (status, message) = if saved {
        (StatusCode::CREATED, "Task generated and saved successfully")
    } else {
        (StatusCode::OK, "Task draft generated; review before saving")
    };
    Ok((
        status,
        Json(CreateTaskWithAiResponse {
            message: message.to_string(),
            draft,
            task,
            saved,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhive_core::TaskPriority;

    #[test]
    fn test_draft_to_create_request_folds_checklist() {
        let draft = TaskDraft {
            title: "Plan offsite".to_string(),
            description: "Book the venue".to_string(),
            priority: TaskPriority::High,
            estimated_time: None,
            suggested_due_date: Some(7),
            tags: vec!["events".to_string()],
            checklist: vec!["shortlist venues".to_string(), "confirm dates".to_string()],
            due_date: None,
        };
        let req = draft_to_create_request(&draft);
        assert_eq!(req.title, "Plan offsite");
        let description = req.description.unwrap();
        assert!(description.contains("- [ ] shortlist venues"));
        assert!(description.contains("- [ ] confirm dates"));
        assert_eq!(req.priority, Some(TaskPriority::High));
    }

    #[test]
    fn test_draft_without_checklist_keeps_description_untouched() {
        let draft = TaskDraft {
            title: "t".to_string(),
            description: "plain".to_string(),
            priority: TaskPriority::Medium,
            estimated_time: None,
            suggested_due_date: None,
            tags: vec![],
            checklist: vec![],
            due_date: None,
        };
        let req = draft_to_create_request(&draft);
        assert_eq!(req.description.unwrap(), "plain");
    }

    #[test]
    fn test_create_with_ai_body_defaults_to_preview() {
        let req: CreateTaskWithAiRequest =
            serde_json::from_str(r#"{"description": "plan the launch"}"#).unwrap();
        assert!(!req.auto_save);
    }

    #[test]
    fn test_create_with_ai_body_accepts_auto_save() {
        let req: CreateTaskWithAiRequest =
            serde_json::from_str(r#"{"description": "plan the launch", "autoSave": true}"#)
                .unwrap();
        assert!(req.auto_save);
    }
}
