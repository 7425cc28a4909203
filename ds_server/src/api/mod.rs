//! HTTP API for the darts scoring service.
//!
//! # Modules
//!
//! - [`players`]: Player roster
//! - [`games`]: Match creation, state, throws and undo
//! - [`error`]: JSON error responses
//! - [`request_id`]: Request correlation, access logs and HTTP metrics
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                          - Storage health
//! POST /api/v1/players                  - Register player
//! GET  /api/v1/players                  - List players
//! POST /api/v1/games                    - Create game (201)
//! GET  /api/v1/games?limit=N            - Recent games
//! GET  /api/v1/games/{id}               - Match state
//! POST /api/v1/games/{id}/throws        - Record a visit
//! POST /api/v1/games/{id}/undo          - Remove the last visit
//! ```
//!
//! Every `/api/v1` route is also served under `/api`.
//!
//! # CORS
//!
//! CORS is configured permissively; the scoring UI is served from a
//! different origin.

pub mod error;
pub mod games;
pub mod players;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use ds_game::{GameManager, GameResult};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use error::ApiError;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub game_manager: Arc<GameManager>,
    /// Deadline for reads; writes are bounded by the manager's write timeout
    /// and the storage pool
    pub request_timeout: Duration,
    /// Games listed when the request has no `limit`
    pub list_limit: u32,
}

impl AppState {
    pub fn new(
        game_manager: Arc<GameManager>,
        request_timeout: Duration,
        list_limit: u32,
    ) -> Self {
        Self {
            game_manager,
            request_timeout,
            list_limit,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use ds_server::api::{create_router, AppState};
/// # use ds_game::{GameManager, InMemoryGameRepository};
/// # use std::{sync::Arc, time::Duration};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let timeout = Duration::from_secs(3);
/// let manager = GameManager::new(Arc::new(InMemoryGameRepository::new()))
///     .with_write_timeout(timeout);
/// let app = create_router(AppState::new(Arc::new(manager), timeout, 50));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8081").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let api_routes = create_api_router();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes.clone())
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id::request_id_middleware))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn create_api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/players",
            post(players::create_player).get(players::list_players),
        )
        .route("/games", post(games::create_game).get(games::list_games))
        .route("/games/{game_id}", get(games::get_game))
        .route("/games/{game_id}/throws", post(games::add_throw))
        .route("/games/{game_id}/undo", post(games::undo_last_throw))
}

/// Run a manager call under the request deadline.
///
/// Only for calls that are safe to abandon halfway.
pub(crate) async fn with_timeout<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: Future<Output = GameResult<T>>,
{
    match tokio::time::timeout(state.request_timeout, call).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(ApiError::Timeout(state.request_timeout)),
    }
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8081/health
/// # {"status":"healthy","storage":true,"version":"0.1.0","timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy = match with_timeout(&state, state.game_manager.health_check()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
