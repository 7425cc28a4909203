//! Darts scoring engine.
//!
//! Everything in this module is synchronous and free of I/O. Match progress
//! is never stored: it is rebuilt from the configuration and the full throw
//! log every time it is needed.
//!
//! - [`reconstruct`]: replays the log into per-player scores and the
//!   leg/set/match tree
//! - [`turn`]: whose turn it is and whether a throw may be appended
//! - [`status`]: pending / in_progress / finished plus the winner
//! - [`state`]: runs all of the above over one stored snapshot

pub mod errors;
pub mod models;
pub mod reconstruct;
pub mod score;
pub mod state;
pub mod status;
pub mod throw_log;
pub mod turn;

pub use errors::{ErrorKind, GameError, GameResult};
pub use models::{
    CreateGameRequest, CreatePlayerRequest, DEFAULT_STARTING_SCORE, GameId, GameMode, GamePlayer,
    GameRecord, GameStatus, GameSummary, MatchConfig, Player, PlayerId, PlayerScore, Throw,
    ThrowDraft, ThrowId, ThrowRequest,
};
pub use reconstruct::{Reconstruction, VisitOutcome, apply_visit, reconstruct};
pub use score::{LegScore, MatchScore, Phase, SetScore};
pub use state::{GameSnapshot, MatchState};
pub use status::{StatusUpdate, derive_status};
pub use throw_log::ThrowLog;
pub use turn::{next_player, validate};
