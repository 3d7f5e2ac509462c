//! Structured logging field name constants for taskhive.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation tools can query by standardized names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

/// Correlation ID propagated across a request. Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "ai", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "task_repo", "attachment_store", "drafting", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "list", "share", "generate", "batch_generate"
pub const OPERATION: &str = "op";

/// Task UUID being operated on.
pub const TASK_ID: &str = "task_id";

/// Principal (authenticated user) performing the operation.
pub const PRINCIPAL: &str = "principal";

/// Attachment UUID being operated on.
pub const ATTACHMENT_ID: &str = "attachment_id";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a listing.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";
pub const RESPONSE_LEN: &str = "response_len";

/// Retry attempt number (1-based) for drafting calls.
pub const ATTEMPT: &str = "attempt";

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
