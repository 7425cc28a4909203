//! Repository trait definitions for testability and dependency injection.
//!
//! The match manager only talks to storage through [`GameRepository`], so the
//! same code runs against PostgreSQL in production and against
//! [`InMemoryGameRepository`](super::InMemoryGameRepository) in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::game::{
    GameError, GameId, GamePlayer, GameRecord, GameResult, GameSnapshot, GameStatus, GameSummary,
    MatchConfig, Player, PlayerId, StatusUpdate, Throw, ThrowDraft, ThrowLog,
};

/// Trait for match storage operations
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Register a player
    async fn create_player(&self, name: &str) -> GameResult<Player>;

    /// All registered players, oldest first
    async fn list_players(&self) -> GameResult<Vec<Player>>;

    /// Store a new game and seat `player_ids` in order, starting at seat 1
    ///
    /// # Errors
    ///
    /// * `GameError::PlayerNotFound` - One of the ids is not registered
    async fn create_game(&self, config: &MatchConfig, player_ids: &[PlayerId])
    -> GameResult<GameId>;

    /// Load the game row, its seated players and its full throw log
    ///
    /// # Errors
    ///
    /// * `GameError::GameNotFound` - No such game
    async fn load_game(&self, game_id: GameId) -> GameResult<GameSnapshot>;

    /// Most recent games first, at most `limit` of them
    async fn list_games(&self, limit: u32) -> GameResult<Vec<GameSummary>>;

    /// Append a throw after every throw already recorded for the game
    async fn append_throw(&self, game_id: GameId, draft: ThrowDraft) -> GameResult<Throw>;

    /// Remove the most recent throw of the game
    ///
    /// # Errors
    ///
    /// * `GameError::NothingToUndo` - The game has no throws
    async fn delete_last_throw(&self, game_id: GameId) -> GameResult<Throw>;

    /// Persist a derived status and winner
    async fn update_status(&self, game_id: GameId, update: StatusUpdate) -> GameResult<()>;

    /// Check that storage is reachable
    async fn health_check(&self) -> GameResult<()>;
}

/// PostgreSQL implementation of `GameRepository`
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const THROW_COLUMNS: &str = "id, game_id, player_id, visit_score, darts_thrown, created_at";

fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_db_int(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

fn game_record_from_row(row: &PgRow) -> GameRecord {
    let raw_status: String = row.get("status");
    let status = GameStatus::parse(&raw_status).unwrap_or_else(|| {
        log::warn!("Unknown stored game status {:?}, treating as pending", raw_status);
        GameStatus::Pending
    });

    GameRecord {
        id: row.get("id"),
        config: MatchConfig::restore(
            row.get("mode"),
            row.get("starting_score"),
            row.get("legs"),
            row.get("sets"),
            row.get("double_out"),
        ),
        status,
        winner_id: row.get("winner_id"),
        created_at: row.get("created_at"),
    }
}

fn throw_from_row(row: &PgRow) -> Throw {
    let darts_thrown: i16 = row.get("darts_thrown");
    Throw {
        id: row.get("id"),
        game_id: row.get("game_id"),
        player_id: row.get("player_id"),
        visit_score: from_db_int(row.get("visit_score")),
        darts_thrown: u8::try_from(darts_thrown).unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

fn game_player_from_row(row: &PgRow) -> GamePlayer {
    GamePlayer {
        id: row.get("id"),
        name: row.get("name"),
        seat: from_db_int(row.get("seat")),
    }
}

#[async_trait]
impl GameRepository for PgGameRepository {
    async fn create_player(&self, name: &str) -> GameResult<Player> {
        let id = Uuid::new_v4();
        let row = sqlx::query("INSERT INTO players (id, name) VALUES ($1, $2) RETURNING created_at")
            .bind(id)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(Player {
            id,
            name: name.to_string(),
            created_at: row.get("created_at"),
        })
    }

    async fn list_players(&self) -> GameResult<Vec<Player>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM players ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| Player {
                id: r.get("id"),
                name: r.get("name"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    async fn create_game(
        &self,
        config: &MatchConfig,
        player_ids: &[PlayerId],
    ) -> GameResult<GameId> {
        let mut tx = self.pool.begin().await?;

        let known: Vec<Uuid> = sqlx::query("SELECT id FROM players WHERE id = ANY($1)")
            .bind(player_ids)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(|r| r.get("id"))
            .collect();
        if let Some(missing) = player_ids.iter().find(|id| !known.contains(id)) {
            return Err(GameError::PlayerNotFound(*missing));
        }

        let game_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO games (id, mode, starting_score, legs, sets, double_out, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(game_id)
        .bind(config.mode().as_str())
        .bind(config.configured_starting_score().map(to_db_int))
        .bind(to_db_int(config.legs_to_win()))
        .bind(to_db_int(config.sets_to_win()))
        .bind(config.double_out())
        .bind(GameStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        for (seat, player_id) in (1..).zip(player_ids) {
            sqlx::query("INSERT INTO game_players (game_id, player_id, seat) VALUES ($1, $2, $3)")
                .bind(game_id)
                .bind(player_id)
                .bind(seat)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(game_id)
    }

    async fn load_game(&self, game_id: GameId) -> GameResult<GameSnapshot> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, mode, starting_score, legs, sets, double_out, status, winner_id, created_at
             FROM games WHERE id = $1",
        )
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GameError::GameNotFound(game_id))?;
        let record = game_record_from_row(&row);

        let players = sqlx::query(
            "SELECT p.id, p.name, gp.seat
             FROM game_players gp JOIN players p ON p.id = gp.player_id
             WHERE gp.game_id = $1
             ORDER BY gp.seat",
        )
        .bind(game_id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(game_player_from_row)
        .collect();

        let throws = sqlx::query(&format!(
            "SELECT {THROW_COLUMNS} FROM throws WHERE game_id = $1 ORDER BY created_at, id"
        ))
        .bind(game_id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(throw_from_row)
        .collect();

        tx.commit().await?;
        Ok(GameSnapshot {
            record,
            players,
            throws: ThrowLog::new(throws),
        })
    }

    async fn list_games(&self, limit: u32) -> GameResult<Vec<GameSummary>> {
        let rows = sqlx::query(
            "SELECT id, mode, starting_score, legs, sets, double_out, status, winner_id, created_at
             FROM games ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        let records: Vec<GameRecord> = rows.iter().map(game_record_from_row).collect();
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();

        let mut seated: HashMap<GameId, Vec<GamePlayer>> = HashMap::new();
        let player_rows = sqlx::query(
            "SELECT gp.game_id, p.id, p.name, gp.seat
             FROM game_players gp JOIN players p ON p.id = gp.player_id
             WHERE gp.game_id = ANY($1)
             ORDER BY gp.game_id, gp.seat",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for row in &player_rows {
            seated
                .entry(row.get("game_id"))
                .or_default()
                .push(game_player_from_row(row));
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let players = seated.remove(&record.id).unwrap_or_default();
                GameSummary::new(record, players)
            })
            .collect())
    }

    async fn append_throw(&self, game_id: GameId, draft: ThrowDraft) -> GameResult<Throw> {
        let id = Uuid::new_v4();
        // Never earlier than the latest stored throw, so the new row sorts last.
        let row = sqlx::query(
            "INSERT INTO throws (id, game_id, player_id, visit_score, darts_thrown, created_at)
             VALUES ($1, $2, $3, $4, $5, GREATEST(
                 now(),
                 COALESCE(
                     (SELECT max(created_at) FROM throws WHERE game_id = $2) + interval '1 microsecond',
                     now()
                 )
             ))
             RETURNING created_at",
        )
        .bind(id)
        .bind(game_id)
        .bind(draft.player_id)
        .bind(to_db_int(draft.visit_score))
        .bind(i16::from(draft.darts_thrown))
        .fetch_one(&self.pool)
        .await?;
        let created_at: DateTime<Utc> = row.get("created_at");

        Ok(Throw {
            id,
            game_id,
            player_id: draft.player_id,
            visit_score: draft.visit_score,
            darts_thrown: draft.darts_thrown,
            created_at,
        })
    }

    async fn delete_last_throw(&self, game_id: GameId) -> GameResult<Throw> {
        let row = sqlx::query(&format!(
            "DELETE FROM throws WHERE id = (
                 SELECT id FROM throws WHERE game_id = $1
                 ORDER BY created_at DESC, id DESC LIMIT 1
             )
             RETURNING {THROW_COLUMNS}"
        ))
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GameError::NothingToUndo)?;

        Ok(throw_from_row(&row))
    }

    async fn update_status(&self, game_id: GameId, update: StatusUpdate) -> GameResult<()> {
        let result = sqlx::query("UPDATE games SET status = $2, winner_id = $3 WHERE id = $1")
            .bind(game_id)
            .bind(update.status.as_str())
            .bind(update.winner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GameError::GameNotFound(game_id));
        }
        Ok(())
    }

    async fn health_check(&self) -> GameResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_int_conversions_saturate() {
        assert_eq!(to_db_int(180), 180);
        assert_eq!(to_db_int(u32::MAX), i32::MAX);
        assert_eq!(from_db_int(3), 3);
        assert_eq!(from_db_int(-1), 0);
    }
}
