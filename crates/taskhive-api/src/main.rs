//! taskhive-api - HTTP API server for taskhive

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use taskhive_ai::{DraftingClient, GeminiBackend};
use taskhive_db::Database;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub drafting: Arc<DraftingClient>,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    //
    // Environment variables:
    //   LOG_FORMAT - "json" or "text" (default: "text")
    //   RUST_LOG   - standard env filter (default: "taskhive_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskhive_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/taskhive".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let upload_dir = std::env::var("UPLOAD_DIR")
        .unwrap_or_else(|_| taskhive_core::defaults::UPLOAD_DIR.to_string());

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url, &upload_dir).await?;
    info!("Database connected");

    // Drafting backend
    let backend = GeminiBackend::from_env()?;
    let drafting = Arc::new(DraftingClient::new(Arc::new(backend)));

    let state = AppState { db, drafting };

    // Uploads are capped at 5 MB; allow some slack for multipart framing.
    let body_limit = taskhive_core::defaults::MAX_UPLOAD_BYTES as usize + 64 * 1024;

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/tasks",
            post(handlers::tasks::create_task).get(handlers::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(handlers::tasks::get_task)
                .patch(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/tasks/:id/share", post(handlers::tasks::share_task))
        .route(
            "/tasks/:id/attachments",
            post(handlers::tasks::upload_attachment),
        )
        .route(
            "/tasks/:id/attachments/:attachment_id",
            get(handlers::tasks::download_attachment)
                .delete(handlers::tasks::delete_attachment),
        )
        .route("/ai/generate-task", post(handlers::ai::generate_task))
        .route("/ai/breakdown", post(handlers::ai::breakdown_task))
        .route("/ai/enhance", post(handlers::ai::enhance_description))
        .route("/ai/priority", post(handlers::ai::assess_priority))
        .route("/ai/batch-generate", post(handlers::ai::batch_generate))
        .route("/ai/suggestions", post(handlers::ai::suggest_tasks))
        .route("/ai/create-task", post(handlers::ai::create_task_with_ai))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

/// HTTP-facing error. Everything funnels through `From<taskhive_core::Error>`
/// so handlers can use `?` on repository and drafting calls.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Core(taskhive_core::Error),
}

impl From<taskhive_core::Error> for ApiError {
    fn from(err: taskhive_core::Error) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use taskhive_core::Error;

        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Core(err) => match err {
                Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                Error::PermissionDenied(msg) => (StatusCode::FORBIDDEN, msg),
                Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
                Error::TaskNotFound(msg) => (StatusCode::NOT_FOUND, msg),
                Error::AlreadyShared(user) => (
                    StatusCode::CONFLICT,
                    format!("Task is already shared with user {}", user),
                ),
                Error::ExternalService(msg) => (StatusCode::BAD_GATEWAY, msg),
                Error::RateLimited(msg) => (StatusCode::BAD_GATEWAY, msg),
                // Internal details stay in the logs, not in responses.
                other => {
                    tracing::error!(error = %other, "internal error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        let body = Json(serde_json::json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
