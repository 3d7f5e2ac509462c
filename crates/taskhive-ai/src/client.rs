//! Drafting client: retry, parsing, and batch orchestration over a
//! [`GenerationBackend`].
//!
//! Retry policy: up to [`DRAFT_RETRY_ATTEMPTS`] attempts per call, retrying
//! only on throttling. Retry *i* waits `i * DRAFT_RETRY_BASE_MS` before the
//! next attempt (6s, then 12s). Any other failure is returned immediately.
//!
//! Batch policy: at most [`DRAFT_BATCH_MAX`] descriptions, processed
//! sequentially with a [`DRAFT_BATCH_PACING_MS`] pause between items (not
//! after the last). The first failure aborts the batch; a cancellation flag
//! is checked before each item.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use taskhive_core::defaults::{
    DRAFT_BATCH_MAX, DRAFT_BATCH_PACING_MS, DRAFT_MIN_DESCRIPTION_LEN, DRAFT_RETRY_ATTEMPTS,
    DRAFT_RETRY_BASE_MS,
};
use taskhive_core::{Error, GenerationBackend, Result};

use crate::prompts;
use crate::types::{
    CategoryRef, EnhancedDescription, PriorityAssessment, TaskBreakdown, TaskDraft,
    TaskSuggestions,
};

/// Cooperative cancellation flag for batch drafting. Cloned handles share
/// the same flag.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// High-level drafting API over a pluggable generation backend.
#[derive(Clone)]
pub struct DraftingClient {
    backend: Arc<dyn GenerationBackend>,
}

impl DraftingClient {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// One generation call with throttle-only retry.
    async fn safe_generate(&self, prompt: &str) -> Result<String> {
        for attempt in 1..=DRAFT_RETRY_ATTEMPTS {
            match self.backend.generate_json(prompt).await {
                Ok(text) => {
                    debug!(
                        subsystem = "ai",
                        attempt,
                        response_len = text.len(),
                        "generation succeeded"
                    );
                    return Ok(text);
                }
                Err(Error::RateLimited(msg)) if attempt < DRAFT_RETRY_ATTEMPTS => {
                    let wait_ms = u64::from(attempt) * DRAFT_RETRY_BASE_MS;
                    warn!(
                        subsystem = "ai",
                        attempt,
                        wait_ms,
                        error = %msg,
                        "generation throttled, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                }
                Err(Error::RateLimited(msg)) => {
                    return Err(Error::ExternalService(format!(
                        "Generation still throttled after {} attempts: {}",
                        DRAFT_RETRY_ATTEMPTS, msg
                    )));
                }
                Err(e) => return Err(e),
            }
        }
        // Unreachable: the loop always returns on its final iteration.
        Err(Error::ExternalService(
            "Generation retry loop exhausted".to_string(),
        ))
    }

    /// Generate and strictly parse one structured response.
    async fn generate_parsed<T: DeserializeOwned>(&self, prompt: &str) -> Result<T> {
        let raw = self.safe_generate(prompt).await?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::ExternalService(format!("Generation returned malformed JSON: {}", e))
        })
    }

    /// Draft a full task from a free-text description.
    pub async fn generate_task(
        &self,
        description: &str,
        categories: &[CategoryRef],
    ) -> Result<TaskDraft> {
        validate_description(description)?;
        let prompt = prompts::task_details(description.trim(), categories);
        let mut draft: TaskDraft = self.generate_parsed(&prompt).await?;
        draft.due_date = resolve_due_date(draft.suggested_due_date, Utc::now());
        info!(
            subsystem = "ai",
            operation = "generate_task",
            title = %draft.title,
            "drafted task"
        );
        Ok(draft)
    }

    /// Decompose a task into ordered subtasks.
    pub async fn breakdown_task(&self, title: &str, description: &str) -> Result<TaskBreakdown> {
        validate_title(title)?;
        self.generate_parsed(&prompts::breakdown(title.trim(), description))
            .await
    }

    /// Rewrite a task description with extracted structure.
    pub async fn enhance_description(
        &self,
        title: &str,
        description: &str,
    ) -> Result<EnhancedDescription> {
        validate_title(title)?;
        self.generate_parsed(&prompts::enhance(title.trim(), description))
            .await
    }

    /// Assess the priority of an existing task.
    pub async fn assess_priority(
        &self,
        title: &str,
        description: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<PriorityAssessment> {
        validate_title(title)?;
        let due = due_date.map(|d| d.date_naive().to_string());
        self.generate_parsed(&prompts::priority(title.trim(), description, due.as_deref()))
            .await
    }

    /// Suggest follow-up tasks from recent task titles.
    pub async fn suggest_tasks(&self, recent_titles: &[String]) -> Result<TaskSuggestions> {
        self.generate_parsed(&prompts::suggestions(recent_titles))
            .await
    }

    /// Draft one task per description, sequentially.
    ///
    /// The batch is validated in full before the first call: too many items
    /// or any too-short description fails without contacting the backend.
    pub async fn batch_generate(
        &self,
        descriptions: &[String],
        categories: &[CategoryRef],
        cancel: &CancelFlag,
    ) -> Result<Vec<TaskDraft>> {
        if descriptions.len() > DRAFT_BATCH_MAX {
            return Err(Error::Validation(format!(
                "Batch accepts at most {} descriptions, got {}",
                DRAFT_BATCH_MAX,
                descriptions.len()
            )));
        }
        for d in descriptions {
            validate_description(d)?;
        }

        let mut drafts = Vec::with_capacity(descriptions.len());
        for (i, description) in descriptions.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(DRAFT_BATCH_PACING_MS)).await;
            }
            if cancel.is_cancelled() {
                info!(
                    subsystem = "ai",
                    operation = "batch_generate",
                    completed = i,
                    "batch cancelled"
                );
                return Err(Error::Cancelled(format!(
                    "Batch cancelled after {} of {} items",
                    i,
                    descriptions.len()
                )));
            }
            drafts.push(self.generate_task(description, categories).await?);
        }
        Ok(drafts)
    }
}

fn validate_description(description: &str) -> Result<()> {
    if description.trim().len() < DRAFT_MIN_DESCRIPTION_LEN {
        return Err(Error::Validation(format!(
            "Description must be at least {} characters",
            DRAFT_MIN_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Task title is required".to_string()));
    }
    Ok(())
}

/// Resolve a relative day offset into an absolute midnight-UTC due date.
/// Negative and absent offsets yield no due date.
fn resolve_due_date(offset_days: Option<i64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let days = u64::try_from(offset_days?).ok()?;
    let date = now.date_naive().checked_add_days(Days::new(days))?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGenerationBackend, MockOutcome};
    use chrono::TimeZone;

    const DRAFT_JSON: &str = r#"{
        "title": "Drafted",
        "description": "from the model",
        "priority": "high",
        "suggestedDueDate": 3,
        "tags": ["x"],
        "checklist": ["a", "b"]
    }"#;

    fn client_with(mock: &MockGenerationBackend) -> DraftingClient {
        DraftingClient::new(Arc::new(mock.clone()))
    }

    #[test]
    fn test_resolve_due_date_offsets() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap();
        let due = resolve_due_date(Some(7), now).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap());

        assert!(resolve_due_date(None, now).is_none());
        assert!(resolve_due_date(Some(-1), now).is_none());
        assert_eq!(
            resolve_due_date(Some(0), now).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_task_parses_and_resolves_due_date() {
        let mock = MockGenerationBackend::new();
        mock.push_ok(DRAFT_JSON);
        let client = client_with(&mock);

        let draft = client.generate_task("write the report", &[]).await.unwrap();
        assert_eq!(draft.title, "Drafted");
        assert!(draft.due_date.is_some());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_description_is_rejected_without_a_call() {
        let mock = MockGenerationBackend::new();
        let client = client_with(&mock);

        let err = client.generate_task("ab", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_two_throttles() {
        let mock = MockGenerationBackend::new();
        mock.push_throttled();
        mock.push_throttled();
        mock.push_ok(DRAFT_JSON);
        let client = client_with(&mock);

        let start = tokio::time::Instant::now();
        let draft = client.generate_task("write the report", &[]).await.unwrap();
        assert_eq!(draft.title, "Drafted");
        assert_eq!(mock.call_count(), 3);
        // 6s after the first throttle, 12s after the second.
        assert_eq!(start.elapsed(), Duration::from_millis(18_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_three_throttles() {
        let mock = MockGenerationBackend::new();
        for _ in 0..3 {
            mock.push_throttled();
        }
        let client = client_with(&mock);

        let err = client.generate_task("write the report", &[]).await.unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
        assert!(err.to_string().contains("3 attempts"));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_failure_is_not_retried() {
        let mock = MockGenerationBackend::new();
        mock.push(MockOutcome::Failure("boom".to_string()));
        let client = client_with(&mock);

        let start = tokio::time::Instant::now();
        let err = client.generate_task("write the report", &[]).await.unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_json_is_an_upstream_failure() {
        let mock = MockGenerationBackend::new();
        mock.push_ok("not json at all");
        let client = client_with(&mock);

        let err = client.generate_task("write the report", &[]).await.unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_over_cap_fails_before_any_call() {
        let mock = MockGenerationBackend::new();
        let client = client_with(&mock);

        let descriptions: Vec<String> = (0..11).map(|i| format!("task number {}", i)).collect();
        let err = client
            .batch_generate(&descriptions, &[], &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_paces_sequential_calls() {
        let mock = MockGenerationBackend::new();
        mock.push_ok_n(DRAFT_JSON, 3);
        let client = client_with(&mock);

        let descriptions: Vec<String> = (0..3).map(|i| format!("task number {}", i)).collect();
        let start = tokio::time::Instant::now();
        let drafts = client
            .batch_generate(&descriptions, &[], &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(mock.call_count(), 3);

        // Two pacing pauses, none after the last item.
        assert_eq!(start.elapsed(), Duration::from_millis(10_000));
        let calls = mock.calls();
        assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(5_000));
        assert_eq!(calls[2].at - calls[1].at, Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_fails_fast_on_item_error() {
        let mock = MockGenerationBackend::new();
        mock.push_ok(DRAFT_JSON);
        mock.push(MockOutcome::Failure("down".to_string()));
        let client = client_with(&mock);

        let descriptions: Vec<String> = (0..3).map(|i| format!("task number {}", i)).collect();
        let err = client
            .batch_generate(&descriptions, &[], &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
        // Third description is never attempted.
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_cancellation_stops_before_next_item() {
        let mock = MockGenerationBackend::new();
        mock.push_ok_n(DRAFT_JSON, 3);
        let client = client_with(&mock);
        let cancel = CancelFlag::new();

        let descriptions: Vec<String> = (0..3).map(|i| format!("task number {}", i)).collect();
        let flag = cancel.clone();
        let handle = {
            let client = client.clone();
            tokio::spawn(async move {
                client.batch_generate(&descriptions, &[], &flag).await
            })
        };

        // Let the first item complete, then cancel during the pacing pause.
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        cancel.cancel();
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_short_item_rejected_before_any_call() {
        let mock = MockGenerationBackend::new();
        let client = client_with(&mock);

        let descriptions = vec!["a perfectly fine description".to_string(), "no".to_string()];
        let err = client
            .batch_generate(&descriptions, &[], &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }
}
