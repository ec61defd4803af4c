//! HTTP API for Member QA.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/ask?question=…` | Answer a natural-language question |
//! | `GET` | `/health` | Health check |
//!
//! # Error Contract
//!
//! Client errors return a JSON body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! An empty or whitespace-only question is rejected here with `400`; it
//! never reaches the pipeline. A question the pipeline cannot answer is
//! **not** an error — the terminal fallback sentence comes back as a
//! normal `200`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the bundled chat
//! UI (or any browser client) can call the API cross-origin.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use member_qa_core::answer::answer_question;

use crate::cache::CorpusCache;
use crate::config::Config;
use crate::source::HttpMessageSource;

/// Shared application state, constructed once at startup and passed to
/// every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The refreshable corpus cache (single logical index).
    pub cache: Arc<CorpusCache>,
    /// Candidates retrieved per question.
    pub top_k: usize,
}

/// Build the application router. Split from [`run_server`] so tests can
/// drive the API in-process without binding a socket.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", get(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured bind address.
///
/// A refresh is attempted before accepting traffic so the first request
/// doesn't pay the full fetch latency; if the upstream is down, the
/// service still boots and serves whatever snapshot seeded the cache.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let source = HttpMessageSource::new(
        &config.source,
        Some(config.cache.snapshot_path.clone()),
    )?;
    let cache = Arc::new(CorpusCache::new(
        Arc::new(source),
        config.cache.snapshot_paths(),
        Duration::from_secs(config.cache.ttl_secs),
        config.retrieval.max_features,
    ));

    cache.ensure_fresh().await;
    info!("Corpus preloaded: {} documents", cache.current().len());

    let state = AppState {
        cache,
        top_k: config.retrieval.top_k,
    };
    let app = router(state);

    info!("Member QA listening on http://{}", config.server.bind);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
}

/// Handler for `GET /health`. Used by smoke tests and load balancers.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ============ GET /ask ============

/// Query parameters for `GET /ask`. A missing `question` is treated the
/// same as an empty one.
#[derive(Deserialize)]
struct AskParams {
    #[serde(default)]
    question: String,
}

/// JSON response body for `GET /ask`.
#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

/// Handler for `GET /ask`.
///
/// Validates the question, guarantees corpus freshness (the only
/// suspension point on the request path), then runs the pure pipeline:
/// rank, filter, synthesize. One `Arc<Corpus>` is held for the whole
/// request; a concurrent rebuild swaps the cache without affecting it.
async fn handle_ask(
    State(state): State<AppState>,
    Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, ApiError> {
    if params.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    state.cache.ensure_fresh().await;
    let corpus = state.cache.current();

    let candidates = corpus.rank(&params.question, state.top_k);
    debug!(
        "question={:?} candidates={}",
        params.question,
        candidates.len()
    );

    let answer = answer_question(&params.question, candidates);
    Ok(Json(AskResponse { answer }))
}
