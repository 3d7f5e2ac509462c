//! # taskhive-ai
//!
//! AI-assisted task drafting: prompt construction, a hosted Gemini backend,
//! and a client that layers throttle-aware retry, strict JSON parsing, and
//! paced batch generation on top of any [`taskhive_core::GenerationBackend`].

pub mod client;
pub mod config;
pub mod gemini;
pub mod mock;
pub mod prompts;
pub mod types;

pub use client::{CancelFlag, DraftingClient};
pub use config::DraftingConfig;
pub use gemini::GeminiBackend;
pub use types::{
    CategoryRef, EnhancedDescription, PriorityAssessment, Subtask, Suggestion, TaskBreakdown,
    TaskDraft, TaskSuggestions,
};
