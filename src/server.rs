//! Read-only HTTP query API over the stamped database.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/list-langs/` | All language varieties as fixed-order tuples |
//! | `GET`  | `/chars/?chars=…` | Sparse readings table for a string of characters |
//! | `GET`  | `/health` | Health check (returns the dataset version) |
//!
//! Both data endpoints wrap their payload as `{ "version": <string>, "data": … }`
//! so frontends can detect dataset staleness. The version is loaded once at
//! startup; a process restart is the only way to pick up a rebuilt database.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "chars is required" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the API is public and
//! read-only.

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::models::Language;
use crate::query::{self, CharsTable};

/// Shared application state handed to every handler.
///
/// The pool is read-only and the version string never changes for the
/// process lifetime; handlers share both by cheap clone.
#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    version: String,
    max_chars: usize,
}

impl AppState {
    /// Open the database read-only and load the version marker. Fails when
    /// the database is missing or unstamped; the server must never answer
    /// without a version.
    pub async fn load(config: &Config) -> Result<Self> {
        let pool = db::connect_read_only(&config.db.path).await?;
        let version = query::load_version(&pool).await?;
        Ok(Self {
            pool,
            version,
            max_chars: config.server.max_chars,
        })
    }
}

/// Starts the HTTP server on the configured bind address and runs until the
/// process is terminated. This is the `mcpdict serve` entry point.
pub async fn run_server(config: &Config) -> Result<()> {
    let state = AppState::load(config).await?;
    let listener = TcpListener::bind(&config.server.bind).await?;

    println!(
        "MCPDict API (dataset version {}) listening on http://{}",
        state.version,
        listener.local_addr()?
    );

    serve_on(listener, state).await
}

/// Serve on an already-bound listener. Split out so tests can bind an
/// ephemeral port first.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Build the router with all routes and the permissive CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/list-langs/", get(handle_list_langs))
        .route("/chars/", get(handle_chars))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Database access failures map to a generic 500. The detail goes to the
/// server log, not the client.
fn internal(err: anyhow::Error) -> AppError {
    eprintln!("internal error: {:#}", err);
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: "database error".to_string(),
    }
}

// ============ Response envelope ============

/// `{ "version": <string>, "data": … }` wrapper shared by both data endpoints.
#[derive(Serialize)]
struct VersionedResponse<T> {
    version: String,
    data: T,
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`. Reports the dataset version so load balancers
/// and deploy scripts can confirm which build is live.
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
    })
}

// ============ GET /list-langs/ ============

/// Handler for `GET /list-langs/`.
///
/// Returns every language variety as a fixed-order 14-element tuple, ordered
/// by `語言ID` ascending. Read-only; a database failure yields a 500 rather
/// than a partial list.
async fn handle_list_langs(
    State(state): State<AppState>,
) -> Result<Json<VersionedResponse<Vec<Language>>>, AppError> {
    let data = query::list_langs(&state.pool).await.map_err(internal)?;
    Ok(Json(VersionedResponse {
        version: state.version.clone(),
        data,
    }))
}

// ============ GET /chars/ ============

#[derive(Deserialize)]
struct CharsParams {
    chars: Option<String>,
}

/// Handler for `GET /chars/?chars=…`.
///
/// A missing or empty `chars` parameter is a client error, as is exceeding
/// the configured distinct-character limit. Unknown characters are not
/// errors; they simply contribute empty cells.
async fn handle_chars(
    State(state): State<AppState>,
    Query(params): Query<CharsParams>,
) -> Result<Json<VersionedResponse<CharsTable>>, AppError> {
    let chars = params.chars.as_deref().unwrap_or("").trim();
    if chars.is_empty() {
        return Err(bad_request("chars is required"));
    }

    let distinct = query::distinct_chars(chars).len();
    if distinct > state.max_chars {
        return Err(bad_request(format!(
            "too many chars; max={}",
            state.max_chars
        )));
    }

    let data = query::chars_table(&state.pool, chars)
        .await
        .map_err(internal)?;

    Ok(Json(VersionedResponse {
        version: state.version.clone(),
        data,
    }))
}
