//! Match data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::errors::{GameError, GameResult};

/// Game ID type
pub type GameId = Uuid;

/// Player ID type
pub type PlayerId = Uuid;

/// Throw ID type
pub type ThrowId = Uuid;

/// Starting score used when an X01 match doesn't specify one
pub const DEFAULT_STARTING_SCORE: u32 = 501;

/// Highest score a single visit of three darts can produce
pub const MAX_VISIT_SCORE: u32 = 180;

/// Darts per visit
pub const MAX_DARTS_PER_VISIT: u8 = 3;

/// Scoring mode tag.
///
/// Only `X01` derives scores; any other tag is kept verbatim and the match
/// is tracked without remaining scores or a leg/set tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameMode {
    X01,
    Other(String),
}

impl GameMode {
    pub fn as_str(&self) -> &str {
        match self {
            GameMode::X01 => "X01",
            GameMode::Other(tag) => tag,
        }
    }

    pub fn is_x01(&self) -> bool {
        matches!(self, GameMode::X01)
    }
}

impl From<String> for GameMode {
    fn from(tag: String) -> Self {
        let tag = tag.trim();
        if tag == "X01" {
            GameMode::X01
        } else {
            GameMode::Other(tag.to_string())
        }
    }
}

impl From<GameMode> for String {
    fn from(mode: GameMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable match parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    mode: GameMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    starting_score: Option<u32>,
    legs: u32,
    sets: u32,
    double_out: bool,
}

impl MatchConfig {
    /// Validate and build a configuration for a new match
    ///
    /// # Errors
    ///
    /// * `GameError::MissingMode` - Mode is blank
    /// * `GameError::InvalidLegs` / `GameError::InvalidSets` - Non-positive thresholds
    /// * `GameError::InvalidStartingScore` - Explicit starting score that isn't positive
    pub fn new(
        mode: &str,
        starting_score: Option<i64>,
        legs: i64,
        sets: i64,
        double_out: bool,
    ) -> GameResult<Self> {
        let mode = mode.trim();
        if mode.is_empty() {
            return Err(GameError::MissingMode);
        }
        let legs = u32::try_from(legs)
            .ok()
            .filter(|&l| l > 0)
            .ok_or(GameError::InvalidLegs(legs))?;
        let sets = u32::try_from(sets)
            .ok()
            .filter(|&s| s > 0)
            .ok_or(GameError::InvalidSets(sets))?;
        let starting_score = match starting_score {
            Some(score) => Some(
                u32::try_from(score)
                    .ok()
                    .filter(|&s| s > 0)
                    .ok_or(GameError::InvalidStartingScore(score))?,
            ),
            None => None,
        };

        Ok(Self {
            mode: GameMode::from(mode.to_string()),
            starting_score,
            legs,
            sets,
            double_out,
        })
    }

    /// Rebuild a configuration from stored values.
    ///
    /// Stored rows were validated at creation; thresholds that are somehow
    /// non-positive are clamped to 1 rather than rejected.
    pub fn restore(
        mode: String,
        starting_score: Option<i32>,
        legs: i32,
        sets: i32,
        double_out: bool,
    ) -> Self {
        Self {
            mode: GameMode::from(mode),
            starting_score: starting_score
                .and_then(|s| u32::try_from(s).ok())
                .filter(|&s| s > 0),
            legs: u32::try_from(legs).unwrap_or(0).max(1),
            sets: u32::try_from(sets).unwrap_or(0).max(1),
            double_out,
        }
    }

    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    /// Starting score of every leg (501 unless configured)
    pub fn starting_score(&self) -> u32 {
        self.starting_score.unwrap_or(DEFAULT_STARTING_SCORE)
    }

    /// Starting score exactly as configured
    pub fn configured_starting_score(&self) -> Option<u32> {
        self.starting_score
    }

    pub fn legs_to_win(&self) -> u32 {
        self.legs
    }

    pub fn sets_to_win(&self) -> u32 {
        self.sets
    }

    pub fn double_out(&self) -> bool {
        self.double_out
    }
}

/// Roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Player seated in a game. Seats start at 1 and define turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePlayer {
    pub id: PlayerId,
    pub name: String,
    pub seat: u32,
}

/// One recorded visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Throw {
    pub id: ThrowId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub visit_score: u32,
    pub darts_thrown: u8,
    pub created_at: DateTime<Utc>,
}

impl Throw {
    /// Log ordering key
    pub fn order_key(&self) -> (DateTime<Utc>, ThrowId) {
        (self.created_at, self.id)
    }
}

/// Coarse lifecycle status persisted with the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Pending,
    InProgress,
    Finished,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Pending => "pending",
            GameStatus::InProgress => "in_progress",
            GameStatus::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(GameStatus::Pending),
            "in_progress" => Some(GameStatus::InProgress),
            "finished" => Some(GameStatus::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored game row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: GameId,
    pub config: MatchConfig,
    pub status: GameStatus,
    pub winner_id: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
}

/// Game as listed in the history view (no throws, no scores)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameId,
    pub config: MatchConfig,
    pub status: GameStatus,
    pub players: Vec<GamePlayer>,
    pub winner_id: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
}

impl GameSummary {
    pub fn new(record: GameRecord, players: Vec<GamePlayer>) -> Self {
        Self {
            id: record.id,
            config: record.config,
            status: record.status,
            players,
            winner_id: record.winner_id,
            created_at: record.created_at,
        }
    }
}

/// Per-player view of the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    pub player_id: PlayerId,
    /// Remaining score in the current leg; absent for modes without scoring
    pub remaining: Option<u32>,
    /// Last accepted visit in the current leg
    pub last_visit: Option<u32>,
    /// Legs won in the current set
    pub legs_won: u32,
    /// Sets won in the match
    pub sets_won: u32,
}

impl PlayerScore {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            remaining: None,
            last_visit: None,
            legs_won: 0,
            sets_won: 0,
        }
    }
}

/// Body of a create-game request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    #[serde(default)]
    pub mode: String,
    pub starting_score: Option<i64>,
    #[serde(default)]
    pub legs: i64,
    #[serde(default)]
    pub sets: i64,
    #[serde(default)]
    pub double_out: bool,
    #[serde(rename = "players", default)]
    pub player_ids: Vec<PlayerId>,
}

impl CreateGameRequest {
    /// Validate the configuration part of the request
    pub fn config(&self) -> GameResult<MatchConfig> {
        MatchConfig::new(
            &self.mode,
            self.starting_score,
            self.legs,
            self.sets,
            self.double_out,
        )
    }
}

/// Body of a create-player request
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlayerRequest {
    pub name: String,
}

/// Body of a record-throw request, before range checks
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrowRequest {
    pub player_id: PlayerId,
    pub visit_score: i64,
    pub darts_thrown: i64,
}

/// A throw that passed validation and is ready to be appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrowDraft {
    pub player_id: PlayerId,
    pub visit_score: u32,
    pub darts_thrown: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_starting_score() {
        let config = MatchConfig::new("X01", None, 3, 1, true).unwrap();
        assert_eq!(config.starting_score(), DEFAULT_STARTING_SCORE);
        assert_eq!(config.configured_starting_score(), None);
        assert!(config.mode().is_x01());
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        assert!(matches!(
            MatchConfig::new("  ", None, 1, 1, false),
            Err(GameError::MissingMode)
        ));
        assert!(matches!(
            MatchConfig::new("X01", None, 0, 1, false),
            Err(GameError::InvalidLegs(0))
        ));
        assert!(matches!(
            MatchConfig::new("X01", None, 1, -2, false),
            Err(GameError::InvalidSets(-2))
        ));
        assert!(matches!(
            MatchConfig::new("X01", Some(0), 1, 1, false),
            Err(GameError::InvalidStartingScore(0))
        ));
    }

    #[test]
    fn test_other_modes_are_accepted() {
        let config = MatchConfig::new("Cricket", None, 1, 1, false).unwrap();
        assert_eq!(config.mode(), &GameMode::Other("Cricket".to_string()));
        assert!(!config.mode().is_x01());
    }

    #[test]
    fn test_restore_clamps_thresholds() {
        let config = MatchConfig::restore("X01".to_string(), Some(301), 0, -1, true);
        assert_eq!(config.legs_to_win(), 1);
        assert_eq!(config.sets_to_win(), 1);
        assert_eq!(config.starting_score(), 301);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            GameStatus::Pending,
            GameStatus::InProgress,
            GameStatus::Finished,
        ] {
            assert_eq!(GameStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(GameStatus::parse("abandoned"), None);
    }

    #[test]
    fn test_config_serializes_camel_case() {
        let config = MatchConfig::new("X01", Some(301), 2, 1, true).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["mode"], "X01");
        assert_eq!(json["startingScore"], 301);
        assert_eq!(json["doubleOut"], true);
    }

    #[test]
    fn test_create_game_request_parses_players() {
        let id = Uuid::new_v4();
        let body = format!(
            r#"{{"mode":"X01","legs":3,"sets":1,"doubleOut":true,"players":["{id}"]}}"#
        );
        let request: CreateGameRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(request.player_ids, vec![id]);
        assert_eq!(request.starting_score, None);
        assert!(request.config().is_ok());
    }
}
