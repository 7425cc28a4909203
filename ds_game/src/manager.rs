//! Match manager.
//!
//! Runs every operation against a [`GameRepository`]: loads the stored
//! snapshot, replays it through the engine, persists derived status changes
//! and applies the one mutation the operation asks for. Mutations of one
//! match are serialized; different matches proceed in parallel.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db::GameRepository;
use crate::game::{
    CreateGameRequest, GameError, GameId, GameResult, GameSummary, MatchState, Player,
    ThrowRequest, validate,
};

/// Number of games listed when the caller doesn't ask for a limit
pub const DEFAULT_LIST_LIMIT: u32 = 50;

type LockMap = StdMutex<HashMap<GameId, Arc<Mutex<()>>>>;

/// Exclusive access to one match.
///
/// Dropping the lease releases the match and forgets its lock once nobody
/// else holds or waits for it, so the lock map only holds matches that are
/// currently in use.
struct MatchLease<'a> {
    locks: &'a LockMap,
    game_id: GameId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MatchLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        self.guard.take();
        // The map's own reference is the last one left.
        if locks
            .get(&self.game_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.game_id);
        }
    }
}

/// Entry point for all player and match operations
pub struct GameManager {
    repository: Arc<dyn GameRepository>,
    /// Locks of the matches with an operation in flight
    locks: LockMap,
    /// Deadline for the part of a throw or undo that precedes the write
    write_timeout: Option<Duration>,
}

impl GameManager {
    pub fn new(repository: Arc<dyn GameRepository>) -> Self {
        Self {
            repository,
            locks: StdMutex::new(HashMap::new()),
            write_timeout: None,
        }
    }

    /// Bound how long a throw or undo may wait for its match and load it.
    ///
    /// When the deadline passes first the call fails with
    /// `GameError::Timeout` and nothing is written. Once the write has been
    /// issued the call always runs to completion.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    async fn before_write<T, F>(&self, phase: F) -> GameResult<T>
    where
        F: Future<Output = GameResult<T>>,
    {
        match self.write_timeout {
            Some(limit) => tokio::time::timeout(limit, phase)
                .await
                .map_err(|_| GameError::Timeout(limit))?,
            None => phase.await,
        }
    }

    async fn lock_game(&self, game_id: GameId) -> MatchLease<'_> {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(game_id)
            .or_default()
            .clone();

        let mut lease = MatchLease {
            locks: &self.locks,
            game_id,
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }

    /// Replay the stored game and persist its status if the replay changed it.
    /// Callers hold the match lock.
    async fn load_state(&self, game_id: GameId) -> GameResult<MatchState> {
        let snapshot = self.repository.load_game(game_id).await?;
        let (state, changed) = MatchState::from_snapshot(snapshot);

        if let Some(update) = changed {
            self.repository.update_status(game_id, update).await?;
            match update.winner_id {
                Some(winner) => log::info!("Game {} finished, winner {}", game_id, winner),
                None => log::info!("Game {} is now {}", game_id, update.status),
            }
        }
        Ok(state)
    }

    /// Register a player under a trimmed, non-blank name
    ///
    /// # Errors
    ///
    /// * `GameError::InvalidPlayerName` - Name is blank
    pub async fn create_player(&self, name: &str) -> GameResult<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::InvalidPlayerName);
        }

        let player = self.repository.create_player(name).await?;
        log::info!("Registered player {} ({})", player.name, player.id);
        Ok(player)
    }

    pub async fn list_players(&self) -> GameResult<Vec<Player>> {
        self.repository.list_players().await
    }

    /// Create a match and seat the requested players in order
    ///
    /// # Errors
    ///
    /// * Configuration errors from [`CreateGameRequest::config`]
    /// * `GameError::NoPlayers` - Empty player list
    /// * `GameError::DuplicatePlayer` - A player is listed twice
    /// * `GameError::PlayerNotFound` - A player id is not registered
    pub async fn create_game(&self, request: CreateGameRequest) -> GameResult<MatchState> {
        let config = request.config()?;
        if request.player_ids.is_empty() {
            return Err(GameError::NoPlayers);
        }
        let mut seen = HashSet::with_capacity(request.player_ids.len());
        if let Some(duplicate) = request.player_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(GameError::DuplicatePlayer(*duplicate));
        }

        let game_id = self
            .repository
            .create_game(&config, &request.player_ids)
            .await?;
        log::info!(
            "Created {} game {} for {} players (legs {}, sets {}, double out {})",
            config.mode(),
            game_id,
            request.player_ids.len(),
            config.legs_to_win(),
            config.sets_to_win(),
            config.double_out()
        );

        let _lease = self.lock_game(game_id).await;
        self.load_state(game_id).await
    }

    /// Current state of a match
    ///
    /// # Errors
    ///
    /// * `GameError::GameNotFound` - No such game
    pub async fn get_game(&self, game_id: GameId) -> GameResult<MatchState> {
        let _lease = self.lock_game(game_id).await;
        self.load_state(game_id).await
    }

    /// Most recent games first. `None` or zero means [`DEFAULT_LIST_LIMIT`].
    pub async fn list_games(&self, limit: Option<u32>) -> GameResult<Vec<GameSummary>> {
        let limit = limit.filter(|&l| l > 0).unwrap_or(DEFAULT_LIST_LIMIT);
        self.repository.list_games(limit).await
    }

    /// Validate and record one visit
    ///
    /// # Errors
    ///
    /// * `GameError::GameNotFound` - No such game
    /// * Input-range and turn errors from [`validate`]; the log is untouched
    /// * `GameError::Timeout` - See [`GameManager::with_write_timeout`]
    pub async fn add_throw(
        &self,
        game_id: GameId,
        request: ThrowRequest,
    ) -> GameResult<MatchState> {
        let (_lease, draft) = self
            .before_write(async {
                let lease = self.lock_game(game_id).await;
                let state = self.load_state(game_id).await?;
                let draft = validate(&state, &request)?;
                Ok::<_, GameError>((lease, draft))
            })
            .await?;

        let throw = self.repository.append_throw(game_id, draft).await?;
        log::debug!(
            "Game {}: player {} scored {} with {} darts",
            game_id,
            throw.player_id,
            throw.visit_score,
            throw.darts_thrown
        );

        self.load_state(game_id).await
    }

    /// Remove the most recent visit
    ///
    /// # Errors
    ///
    /// * `GameError::GameNotFound` - No such game
    /// * `GameError::NothingToUndo` - No throws recorded
    /// * `GameError::Timeout` - See [`GameManager::with_write_timeout`]
    pub async fn undo_last_throw(&self, game_id: GameId) -> GameResult<MatchState> {
        let _lease = self
            .before_write(async {
                let lease = self.lock_game(game_id).await;
                let state = self.load_state(game_id).await?;
                if state.history.is_empty() {
                    return Err(GameError::NothingToUndo);
                }
                Ok::<_, GameError>(lease)
            })
            .await?;

        let removed = self.repository.delete_last_throw(game_id).await?;
        log::info!(
            "Game {}: undid visit of {} by player {}",
            game_id,
            removed.visit_score,
            removed.player_id
        );

        self.load_state(game_id).await
    }

    pub async fn health_check(&self) -> GameResult<()> {
        self.repository.health_check().await
    }
}
