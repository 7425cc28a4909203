//! Game error types.

use std::time::Duration;
use thiserror::Error;

use super::models::{GameId, PlayerId};

/// Coarse classification of a [`GameError`].
///
/// Transport layers map kinds to responses; the individual variants stay
/// available for callers that need the exact condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid match configuration, detected before any throw exists
    Configuration,
    /// Throw submitted by the wrong player or after the match finished
    TurnViolation,
    /// Darts thrown or visit score outside its domain
    InputRange,
    /// Undo requested on an empty throw log
    EmptyUndo,
    /// Unknown game or player identity
    NotFound,
    /// Storage failure
    Internal,
    /// Gave up waiting before anything was written
    Timeout,
}

impl ErrorKind {
    /// Stable snake_case code for the kind
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::TurnViolation => "turn_violation",
            ErrorKind::InputRange => "input_range",
            ErrorKind::EmptyUndo => "empty_undo",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
            ErrorKind::Timeout => "timeout",
        }
    }
}

/// Game errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Mode missing or blank
    #[error("mode is required")]
    MissingMode,

    /// Legs-to-win must be positive
    #[error("legs must be > 0, got {0}")]
    InvalidLegs(i64),

    /// Sets-to-win must be positive
    #[error("sets must be > 0, got {0}")]
    InvalidSets(i64),

    /// Explicit starting score must be positive
    #[error("startingScore must be > 0, got {0}")]
    InvalidStartingScore(i64),

    /// A game needs at least one seated player
    #[error("at least one player is required")]
    NoPlayers,

    /// The same player was seated twice
    #[error("player {0} is listed more than once")]
    DuplicatePlayer(PlayerId),

    /// Player names must not be blank
    #[error("player name is required")]
    InvalidPlayerName,

    /// Match already has a winner
    #[error("game is already finished")]
    GameFinished,

    /// Throw from a player who is not seated in this game
    #[error("player {0} is not part of this game")]
    PlayerNotInGame(PlayerId),

    /// Throw from a seated player whose turn it is not
    #[error("not this player's turn: expected {expected}, got {actual}")]
    OutOfTurn { expected: PlayerId, actual: PlayerId },

    /// Darts thrown outside 1..=3
    #[error("dartsThrown must be between 1 and 3, got {0}")]
    InvalidDartsThrown(i64),

    /// Visit score outside 0..=180
    #[error("visitScore must be between 0 and 180, got {0}")]
    InvalidVisitScore(i64),

    /// Undo with no recorded throws
    #[error("no throws to undo")]
    NothingToUndo,

    /// Unknown game
    #[error("game not found: {0}")]
    GameNotFound(GameId),

    /// Unknown player
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The match stayed busy past the deadline; nothing was written
    #[error("timed out after {} ms waiting for the game", .0.as_millis())]
    Timeout(Duration),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl GameError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::MissingMode
            | GameError::InvalidLegs(_)
            | GameError::InvalidSets(_)
            | GameError::InvalidStartingScore(_)
            | GameError::NoPlayers
            | GameError::DuplicatePlayer(_)
            | GameError::InvalidPlayerName => ErrorKind::Configuration,
            GameError::GameFinished
            | GameError::PlayerNotInGame(_)
            | GameError::OutOfTurn { .. } => ErrorKind::TurnViolation,
            GameError::InvalidDartsThrown(_) | GameError::InvalidVisitScore(_) => {
                ErrorKind::InputRange
            }
            GameError::NothingToUndo => ErrorKind::EmptyUndo,
            GameError::GameNotFound(_) | GameError::PlayerNotFound(_) => ErrorKind::NotFound,
            GameError::Database(_) => ErrorKind::Internal,
            GameError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database errors are sanitized to prevent information disclosure about
    /// the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            GameError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_kinds() {
        assert_eq!(GameError::MissingMode.kind(), ErrorKind::Configuration);
        assert_eq!(GameError::GameFinished.kind(), ErrorKind::TurnViolation);
        assert_eq!(GameError::InvalidVisitScore(181).kind(), ErrorKind::InputRange);
        assert_eq!(GameError::NothingToUndo.kind(), ErrorKind::EmptyUndo);
        assert_eq!(
            GameError::GameNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GameError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            GameError::Timeout(Duration::from_millis(5)).kind().code(),
            "timeout"
        );
    }

    #[test]
    fn test_client_message_hides_database_details() {
        let err = GameError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");

        let err = GameError::InvalidDartsThrown(4);
        assert!(err.client_message().contains("dartsThrown"));
    }
}
