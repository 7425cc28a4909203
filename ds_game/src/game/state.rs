//! Full match state assembled from one snapshot of stored data.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{
    GameId, GamePlayer, GameRecord, GameStatus, MatchConfig, PlayerId, PlayerScore, Throw,
};
use super::reconstruct::reconstruct;
use super::score::MatchScore;
use super::status::{StatusUpdate, derive_status};
use super::throw_log::ThrowLog;

/// Consistent copy of everything stored for one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub record: GameRecord,
    pub players: Vec<GamePlayer>,
    pub throws: ThrowLog,
}

/// Derived state of a match, recomputed on every read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub id: GameId,
    pub config: MatchConfig,
    pub status: GameStatus,
    pub winner_id: Option<PlayerId>,
    pub players: Vec<GamePlayer>,
    pub history: Vec<Throw>,
    pub scores: Vec<PlayerScore>,
    pub current_player_id: Option<PlayerId>,
    pub match_score: Option<MatchScore>,
    pub created_at: DateTime<Utc>,
}

impl MatchState {
    /// Replay the snapshot.
    ///
    /// Returns the state together with the status update to persist, if the
    /// derived status or winner differs from the stored one.
    pub fn from_snapshot(snapshot: GameSnapshot) -> (Self, Option<StatusUpdate>) {
        let GameSnapshot {
            record,
            mut players,
            throws,
        } = snapshot;
        players.sort_by_key(|p| p.seat);

        let replay = reconstruct(&record.config, &players, throws.as_slice());
        let update = derive_status(replay.match_score.as_ref(), &replay.scores, throws.len());
        let changed = update
            .differs_from(record.status, record.winner_id)
            .then_some(update);

        let state = Self {
            id: record.id,
            config: record.config,
            status: update.status,
            winner_id: update.winner_id,
            players,
            history: throws.into_vec(),
            scores: replay.scores,
            current_player_id: replay.current_player_id,
            match_score: replay.match_score,
            created_at: record.created_at,
        };
        (state, changed)
    }
}
