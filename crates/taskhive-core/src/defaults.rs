//! Default values shared across taskhive crates.

/// Default page size for task listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Hard ceiling on requested page size; larger values are clamped.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Total attempts (first call + retries) for a drafting call.
pub const DRAFT_RETRY_ATTEMPTS: u32 = 3;

/// Linear backoff base for throttled drafting calls, in milliseconds.
/// Retry *i* waits `i * DRAFT_RETRY_BASE_MS` (6s, 12s).
pub const DRAFT_RETRY_BASE_MS: u64 = 6_000;

/// Pacing delay between successive batch drafting calls, in milliseconds.
pub const DRAFT_BATCH_PACING_MS: u64 = 5_000;

/// Maximum descriptions accepted by a single batch drafting call.
pub const DRAFT_BATCH_MAX: usize = 10;

/// Minimum description length for a drafting request.
pub const DRAFT_MIN_DESCRIPTION_LEN: usize = 3;

/// Maximum attachment upload size in bytes (5 MB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Default attachment storage root.
pub const UPLOAD_DIR: &str = "./uploads";
