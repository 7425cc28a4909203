//! Player roster handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use ds_game::game::{CreatePlayerRequest, Player};

use super::error::ApiError;
use super::request_id::RequestId;
use super::{AppState, with_timeout};

/// Register a player.
///
/// ```bash
/// curl -X POST http://localhost:8081/api/v1/players \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Ada"}'
/// ```
///
/// Returns `201 Created` with the stored player; a blank name is a `400`.
pub async fn create_player(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<CreatePlayerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let Json(request) = payload?;
    let player = state.game_manager.create_player(&request.name).await?;

    tracing::info!(
        request_id = request_id.as_str(),
        player_id = %player.id,
        "Player registered"
    );
    Ok((StatusCode::CREATED, Json(player)))
}

/// List all players, oldest first.
pub async fn list_players(State(state): State<AppState>) -> Result<Json<Vec<Player>>, ApiError> {
    let players = with_timeout(&state, state.game_manager.list_players()).await?;
    Ok(Json(players))
}
