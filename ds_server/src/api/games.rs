//! Match handlers.
//!
//! Every successful call that touches one match answers with the full,
//! freshly reconstructed match state.
//!
//! # Examples
//!
//! Create a game:
//! ```bash
//! curl -X POST http://localhost:8081/api/v1/games \
//!   -H "Content-Type: application/json" \
//!   -d '{"mode": "X01", "startingScore": 501, "legs": 3, "sets": 1,
//!        "doubleOut": true, "players": ["<player id>", "<player id>"]}'
//! ```
//!
//! Record a visit:
//! ```bash
//! curl -X POST http://localhost:8081/api/v1/games/<game id>/throws \
//!   -H "Content-Type: application/json" \
//!   -d '{"playerId": "<player id>", "visitScore": 60, "dartsThrown": 3}'
//! ```

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use ds_game::game::{
    CreateGameRequest, GameId, GameStatus, GameSummary, MatchState, ThrowRequest,
};
use serde::Deserialize;

use super::error::ApiError;
use super::request_id::RequestId;
use super::{AppState, with_timeout};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct ListGamesQuery {
    pub limit: Option<u32>,
}

/// Create a game and seat the listed players in order.
///
/// Returns `201 Created` with the initial match state.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid configuration, no players or a duplicate player
/// - `404 Not Found`: A player id is not registered
pub async fn create_game(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MatchState>), ApiError> {
    let Json(request) = payload?;
    let game = state.game_manager.create_game(request).await?;

    metrics::games_created_total(game.config.mode().as_str());
    tracing::info!(
        request_id = request_id.as_str(),
        game_id = %game.id,
        players = game.players.len(),
        "Game created"
    );
    Ok((StatusCode::CREATED, Json(game)))
}

/// Most recent games first, without throw history.
///
/// `limit` defaults to the configured list limit.
pub async fn list_games(
    State(state): State<AppState>,
    query: Result<Query<ListGamesQuery>, QueryRejection>,
) -> Result<Json<Vec<GameSummary>>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.filter(|&l| l > 0).unwrap_or(state.list_limit);
    let games = with_timeout(&state, state.game_manager.list_games(Some(limit))).await?;
    Ok(Json(games))
}

/// Current state of one game.
pub async fn get_game(
    State(state): State<AppState>,
    game_id: Result<Path<GameId>, PathRejection>,
) -> Result<Json<MatchState>, ApiError> {
    let Path(game_id) = game_id?;
    let game = with_timeout(&state, state.game_manager.get_game(game_id)).await?;
    Ok(Json(game))
}

/// Record one visit.
///
/// The request deadline only covers waiting for the match; once the throw
/// is being written the handler answers with the outcome.
///
/// # Errors
///
/// - `400 Bad Request`: Out-of-range input, wrong player, or the match is over
/// - `404 Not Found`: Unknown game
/// - `504 Gateway Timeout`: The match stayed busy; nothing was recorded
pub async fn add_throw(
    State(state): State<AppState>,
    request_id: RequestId,
    game_id: Result<Path<GameId>, PathRejection>,
    payload: Result<Json<ThrowRequest>, JsonRejection>,
) -> Result<Json<MatchState>, ApiError> {
    let Path(game_id) = game_id?;
    let Json(request) = payload?;
    let game = state.game_manager.add_throw(game_id, request).await?;

    metrics::throws_recorded_total();
    // A finished match rejects further throws, so this fires once per win.
    if game.status == GameStatus::Finished {
        metrics::games_finished_total();
        tracing::info!(
            request_id = request_id.as_str(),
            game_id = %game.id,
            winner_id = ?game.winner_id,
            "Game finished"
        );
    }
    Ok(Json(game))
}

/// Remove the most recent visit.
///
/// Bounded like [`add_throw`].
///
/// # Errors
///
/// - `400 Bad Request`: Nothing to undo
/// - `404 Not Found`: Unknown game
/// - `504 Gateway Timeout`: The match stayed busy; nothing was removed
pub async fn undo_last_throw(
    State(state): State<AppState>,
    request_id: RequestId,
    game_id: Result<Path<GameId>, PathRejection>,
) -> Result<Json<MatchState>, ApiError> {
    let Path(game_id) = game_id?;
    let game = state.game_manager.undo_last_throw(game_id).await?;

    metrics::throws_undone_total();
    tracing::info!(
        request_id = request_id.as_str(),
        game_id = %game.id,
        remaining_throws = game.history.len(),
        "Throw undone"
    );
    Ok(Json(game))
}
