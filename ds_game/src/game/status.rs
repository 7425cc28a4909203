//! Lifecycle status derived from the reconstructed match.

use super::models::{GameStatus, PlayerId, PlayerScore};
use super::score::MatchScore;

/// Lifecycle status and winner to persist with the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: GameStatus,
    pub winner_id: Option<PlayerId>,
}

impl StatusUpdate {
    /// Whether this differs from what is currently stored
    pub fn differs_from(&self, status: GameStatus, winner_id: Option<PlayerId>) -> bool {
        self.status != status || self.winner_id != winner_id
    }
}

/// Derive `(status, winner)`.
///
/// A match tree decides the winner by won sets. Without one, a player whose
/// remaining score is exactly zero wins. Otherwise any recorded throw means
/// the match is in progress.
pub fn derive_status(
    match_score: Option<&MatchScore>,
    scores: &[PlayerScore],
    throw_count: usize,
) -> StatusUpdate {
    let winner_id = match match_score {
        Some(tree) => tree.winner(),
        None => scores
            .iter()
            .find(|s| s.remaining == Some(0))
            .map(|s| s.player_id),
    };

    let status = if winner_id.is_some() {
        GameStatus::Finished
    } else if throw_count > 0 {
        GameStatus::InProgress
    } else {
        GameStatus::Pending
    };

    StatusUpdate { status, winner_id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::models::{GamePlayer, MatchConfig};
    use chrono::Utc;
    use uuid::Uuid;

    fn players() -> Vec<GamePlayer> {
        (1..=2)
            .map(|seat| GamePlayer {
                id: Uuid::new_v4(),
                name: format!("p{seat}"),
                seat,
            })
            .collect()
    }

    #[test]
    fn test_pending_and_in_progress() {
        let players = players();
        let config = MatchConfig::new("X01", None, 1, 1, true).unwrap();
        let tree = MatchScore::new(&config, &players);

        let update = derive_status(Some(&tree), &[], 0);
        assert_eq!(update.status, GameStatus::Pending);
        assert_eq!(update.winner_id, None);

        let update = derive_status(Some(&tree), &[], 3);
        assert_eq!(update.status, GameStatus::InProgress);
    }

    #[test]
    fn test_finished_from_match_tree() {
        let players = players();
        let config = MatchConfig::new("X01", None, 1, 1, true).unwrap();
        let mut tree = MatchScore::new(&config, &players);
        tree.seal_leg(players[1].id, Utc::now(), &players);

        let update = derive_status(Some(&tree), &[], 7);
        assert_eq!(update.status, GameStatus::Finished);
        assert_eq!(update.winner_id, Some(players[1].id));
    }

    #[test]
    fn test_finished_from_scores_without_tree() {
        let mut score = PlayerScore::new(Uuid::new_v4());
        score.remaining = Some(0);
        let update = derive_status(None, std::slice::from_ref(&score), 4);
        assert_eq!(update.status, GameStatus::Finished);
        assert_eq!(update.winner_id, Some(score.player_id));

        let update = derive_status(None, &[PlayerScore::new(Uuid::new_v4())], 4);
        assert_eq!(update.status, GameStatus::InProgress);
    }

    #[test]
    fn test_differs_from() {
        let winner = Uuid::new_v4();
        let update = StatusUpdate {
            status: GameStatus::Finished,
            winner_id: Some(winner),
        };
        assert!(!update.differs_from(GameStatus::Finished, Some(winner)));
        assert!(update.differs_from(GameStatus::InProgress, None));
        assert!(update.differs_from(GameStatus::Finished, None));
    }
}
