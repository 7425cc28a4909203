//! # Darts Scoring
//!
//! A darts match engine that never stores progress: per-player remaining
//! scores, leg and set progression, turn order and the winner are all
//! rebuilt from the match configuration and the ordered throw log.
//!
//! ## Scoring rules (X01)
//!
//! - Every leg starts each player at the configured score (501 by default)
//! - A visit that would go below zero is a bust and leaves the score unchanged
//! - Under double-out, a visit that would leave exactly 1 is also a bust
//! - Reaching exactly zero wins the leg; enough legs win a set, enough sets
//!   win the match
//! - A bust still ends the player's turn
//!
//! ## Core Modules
//!
//! - [`game`]: Pure scoring engine and match models
//! - [`db`]: Storage trait with PostgreSQL and in-memory implementations
//! - [`manager`]: Operations that combine storage and the engine
//!
//! ## Example
//!
//! ```
//! use ds_game::game::{GamePlayer, MatchConfig, reconstruct};
//! use uuid::Uuid;
//!
//! let config = MatchConfig::new("X01", None, 3, 1, true).unwrap();
//! let players = vec![GamePlayer { id: Uuid::new_v4(), name: "Ada".into(), seat: 1 }];
//!
//! let replay = reconstruct(&config, &players, &[]);
//! assert_eq!(replay.scores[0].remaining, Some(501));
//! assert_eq!(replay.current_player_id, Some(players[0].id));
//! ```

/// Pure scoring engine, errors and data models.
pub mod game;
pub use game::{
    GameError, GameResult, GameStatus, MatchConfig, MatchState, Throw, ThrowLog, ThrowRequest,
};

/// Persistence layer.
pub mod db;
pub use db::{Database, DatabaseConfig, GameRepository, InMemoryGameRepository, PgGameRepository};

/// Match manager.
pub mod manager;
pub use manager::{DEFAULT_LIST_LIMIT, GameManager};
