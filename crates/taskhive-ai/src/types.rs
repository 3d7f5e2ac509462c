//! Structured outputs returned by the drafting endpoints.
//!
//! Each type mirrors the JSON schema its prompt asks the model to produce.
//! Parsing is strict: a response that does not deserialize into the expected
//! shape is an upstream failure, never silently patched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskhive_core::TaskPriority;

/// A drafted task ready for review or direct persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Free-text effort estimate, e.g. "2 hours".
    #[serde(default)]
    pub estimated_time: Option<String>,
    /// Day offset from "now" suggested by the model; resolved into
    /// `due_date` after parsing.
    #[serde(default)]
    pub suggested_due_date: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<String>,
    /// Absolute due date computed from `suggested_due_date`. Filled in by the
    /// client, never by the model.
    #[serde(default, skip_deserializing)]
    pub due_date: Option<DateTime<Utc>>,
}

/// A single subtask in a breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
}

/// Decomposition of a task into ordered subtasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBreakdown {
    pub analysis: String,
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub total_estimated_time: Option<String>,
    #[serde(default)]
    pub recommended_approach: Option<String>,
}

/// Rewritten description with extracted structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedDescription {
    pub enhanced_description: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
}

/// Priority recommendation for an existing task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAssessment {
    pub priority: TaskPriority,
    pub reasoning: String,
    /// 1 (can wait) to 10 (drop everything).
    pub urgency_score: u8,
}

/// One suggested follow-up task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub title: String,
    pub reason: String,
    #[serde(default)]
    pub priority: TaskPriority,
}

/// Follow-up suggestions based on recent activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSuggestions {
    pub suggestions: Vec<Suggestion>,
}

/// Category context passed to the task-details prompt so the model can pick
/// from categories that actually exist.
#[derive(Debug, Clone)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_draft_parses_model_output() {
        let raw = r#"{
            "title": "Write quarterly report",
            "description": "Summarize Q3 metrics",
            "priority": "high",
            "estimatedTime": "3 hours",
            "suggestedDueDate": 7,
            "tags": ["reporting"],
            "checklist": ["gather metrics", "draft", "review"]
        }"#;
        let draft: TaskDraft = serde_json::from_str(raw).unwrap();
        assert_eq!(draft.title, "Write quarterly report");
        assert_eq!(draft.priority, TaskPriority::High);
        assert_eq!(draft.suggested_due_date, Some(7));
        assert_eq!(draft.checklist.len(), 3);
        assert!(draft.due_date.is_none());
    }

    #[test]
    fn test_task_draft_defaults_optional_fields() {
        let raw = r#"{"title": "t", "description": "d"}"#;
        let draft: TaskDraft = serde_json::from_str(raw).unwrap();
        assert_eq!(draft.priority, TaskPriority::Medium);
        assert!(draft.tags.is_empty());
        assert!(draft.suggested_due_date.is_none());
    }

    #[test]
    fn test_breakdown_requires_subtasks_field() {
        let raw = r#"{"analysis": "too big"}"#;
        assert!(serde_json::from_str::<TaskBreakdown>(raw).is_err());
    }

    #[test]
    fn test_priority_assessment_parses() {
        let raw = r#"{"priority": "urgent", "reasoning": "deadline today", "urgencyScore": 9}"#;
        let a: PriorityAssessment = serde_json::from_str(raw).unwrap();
        assert_eq!(a.priority, TaskPriority::Urgent);
        assert_eq!(a.urgency_score, 9);
    }
}
