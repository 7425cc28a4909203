//! In-process implementation of [`GameRepository`].
//!
//! Used by the test suites and by the server's `--in-memory` mode. Nothing
//! survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::GameRepository;
use crate::game::{
    GameError, GameId, GamePlayer, GameRecord, GameResult, GameSnapshot, GameStatus, GameSummary,
    MatchConfig, Player, PlayerId, StatusUpdate, Throw, ThrowDraft, ThrowLog,
};

#[derive(Default)]
struct Store {
    players: HashMap<PlayerId, Player>,
    games: HashMap<GameId, GameSnapshot>,
}

/// `GameRepository` backed by a `HashMap` behind an async `RwLock`
#[derive(Default)]
pub struct InMemoryGameRepository {
    store: RwLock<Store>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn create_player(&self, name: &str) -> GameResult<Player> {
        let player = Player {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.store
            .write()
            .await
            .players
            .insert(player.id, player.clone());
        Ok(player)
    }

    async fn list_players(&self) -> GameResult<Vec<Player>> {
        let store = self.store.read().await;
        let mut players: Vec<Player> = store.players.values().cloned().collect();
        players.sort_by_key(|p| (p.created_at, p.id));
        Ok(players)
    }

    async fn create_game(
        &self,
        config: &MatchConfig,
        player_ids: &[PlayerId],
    ) -> GameResult<GameId> {
        let mut store = self.store.write().await;

        let mut seated = Vec::with_capacity(player_ids.len());
        for (seat, id) in (1..).zip(player_ids) {
            let player = store
                .players
                .get(id)
                .ok_or(GameError::PlayerNotFound(*id))?;
            seated.push(GamePlayer {
                id: player.id,
                name: player.name.clone(),
                seat,
            });
        }

        let game_id = Uuid::new_v4();
        store.games.insert(
            game_id,
            GameSnapshot {
                record: GameRecord {
                    id: game_id,
                    config: config.clone(),
                    status: GameStatus::Pending,
                    winner_id: None,
                    created_at: Utc::now(),
                },
                players: seated,
                throws: ThrowLog::default(),
            },
        );
        Ok(game_id)
    }

    async fn load_game(&self, game_id: GameId) -> GameResult<GameSnapshot> {
        self.store
            .read()
            .await
            .games
            .get(&game_id)
            .cloned()
            .ok_or(GameError::GameNotFound(game_id))
    }

    async fn list_games(&self, limit: u32) -> GameResult<Vec<GameSummary>> {
        let store = self.store.read().await;
        let mut games: Vec<&GameSnapshot> = store.games.values().collect();
        games.sort_by_key(|g| std::cmp::Reverse((g.record.created_at, g.record.id)));

        Ok(games
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|g| GameSummary::new(g.record.clone(), g.players.clone()))
            .collect())
    }

    async fn append_throw(&self, game_id: GameId, draft: ThrowDraft) -> GameResult<Throw> {
        let mut store = self.store.write().await;
        let game = store
            .games
            .get_mut(&game_id)
            .ok_or(GameError::GameNotFound(game_id))?;

        let throw = Throw {
            id: Uuid::new_v4(),
            game_id,
            player_id: draft.player_id,
            visit_score: draft.visit_score,
            darts_thrown: draft.darts_thrown,
            created_at: game.throws.next_timestamp(Utc::now()),
        };
        game.throws.append(throw.clone());
        Ok(throw)
    }

    async fn delete_last_throw(&self, game_id: GameId) -> GameResult<Throw> {
        let mut store = self.store.write().await;
        store
            .games
            .get_mut(&game_id)
            .ok_or(GameError::GameNotFound(game_id))?
            .throws
            .undo()
    }

    async fn update_status(&self, game_id: GameId, update: StatusUpdate) -> GameResult<()> {
        let mut store = self.store.write().await;
        let record = &mut store
            .games
            .get_mut(&game_id)
            .ok_or(GameError::GameNotFound(game_id))?
            .record;
        record.status = update.status;
        record.winner_id = update.winner_id;
        Ok(())
    }

    async fn health_check(&self) -> GameResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo_with_players(names: &[&str]) -> (InMemoryGameRepository, Vec<PlayerId>) {
        let repo = InMemoryGameRepository::new();
        let mut ids = Vec::new();
        for name in names {
            ids.push(repo.create_player(name).await.unwrap().id);
        }
        (repo, ids)
    }

    fn config() -> MatchConfig {
        MatchConfig::new("X01", Some(301), 1, 1, true).unwrap()
    }

    #[tokio::test]
    async fn test_create_game_seats_players_in_order() {
        let (repo, ids) = repo_with_players(&["Ada", "Bob", "Cy"]).await;
        let order = vec![ids[2], ids[0], ids[1]];
        let game_id = repo.create_game(&config(), &order).await.unwrap();

        let snapshot = repo.load_game(game_id).await.unwrap();
        let seats: Vec<(PlayerId, u32)> = snapshot.players.iter().map(|p| (p.id, p.seat)).collect();
        assert_eq!(seats, vec![(ids[2], 1), (ids[0], 2), (ids[1], 3)]);
        assert_eq!(snapshot.record.status, GameStatus::Pending);
        assert!(snapshot.throws.is_empty());
    }

    #[tokio::test]
    async fn test_create_game_rejects_unknown_player() {
        let (repo, ids) = repo_with_players(&["Ada"]).await;
        let stranger = Uuid::new_v4();
        let result = repo.create_game(&config(), &[ids[0], stranger]).await;
        assert!(matches!(result, Err(GameError::PlayerNotFound(id)) if id == stranger));
        assert!(repo.list_games(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_and_delete_keep_log_order() {
        let (repo, ids) = repo_with_players(&["Ada"]).await;
        let game_id = repo.create_game(&config(), &ids).await.unwrap();

        let mut appended = Vec::new();
        for visit_score in [60, 45, 100] {
            let draft = ThrowDraft {
                player_id: ids[0],
                visit_score,
                darts_thrown: 3,
            };
            appended.push(repo.append_throw(game_id, draft).await.unwrap());
        }
        assert!(appended.windows(2).all(|w| w[0].created_at < w[1].created_at));

        let removed = repo.delete_last_throw(game_id).await.unwrap();
        assert_eq!(removed.id, appended[2].id);

        let snapshot = repo.load_game(game_id).await.unwrap();
        assert_eq!(snapshot.throws.as_slice(), &appended[..2]);
    }

    #[tokio::test]
    async fn test_delete_from_empty_log() {
        let (repo, ids) = repo_with_players(&["Ada"]).await;
        let game_id = repo.create_game(&config(), &ids).await.unwrap();
        assert!(matches!(
            repo.delete_last_throw(game_id).await,
            Err(GameError::NothingToUndo)
        ));
    }

    #[tokio::test]
    async fn test_unknown_game() {
        let repo = InMemoryGameRepository::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            repo.load_game(id).await,
            Err(GameError::GameNotFound(missing)) if missing == id
        ));
        let update = StatusUpdate {
            status: GameStatus::Finished,
            winner_id: None,
        };
        assert!(repo.update_status(id, update).await.is_err());
    }

    #[tokio::test]
    async fn test_list_games_newest_first_with_limit() {
        let (repo, ids) = repo_with_players(&["Ada"]).await;
        let mut created = Vec::new();
        for _ in 0..3 {
            created.push(repo.create_game(&config(), &ids).await.unwrap());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed: Vec<GameId> = repo
            .list_games(2)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(listed, vec![created[2], created[1]]);
    }

    #[tokio::test]
    async fn test_update_status() {
        let (repo, ids) = repo_with_players(&["Ada"]).await;
        let game_id = repo.create_game(&config(), &ids).await.unwrap();
        let update = StatusUpdate {
            status: GameStatus::Finished,
            winner_id: Some(ids[0]),
        };
        repo.update_status(game_id, update).await.unwrap();

        let record = repo.load_game(game_id).await.unwrap().record;
        assert_eq!(record.status, GameStatus::Finished);
        assert_eq!(record.winner_id, Some(ids[0]));
    }
}
