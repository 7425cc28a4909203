//! Replays a throw log into per-player scores and the match tree.

use log::{debug, warn};
use std::collections::HashMap;

use super::models::{GamePlayer, MatchConfig, PlayerId, PlayerScore, Throw};
use super::score::{Advance, MatchScore};
use super::turn::next_player;

/// Effect of one visit on a player's remaining score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Below zero, or exactly one under double-out. Remaining is unchanged
    /// but the turn is still used up.
    Bust,
    /// Accepted; new remaining score
    Scored(u32),
    /// Accepted and brought the player to exactly zero
    Checkout,
}

/// Apply X01 bust rules to a visit.
///
/// Only visit totals are known, so a checkout under double-out is not
/// required to end on a double; leaving exactly one is the only extra bust.
pub fn apply_visit(remaining: u32, visit_score: u32, double_out: bool) -> VisitOutcome {
    match remaining.checked_sub(visit_score) {
        None => VisitOutcome::Bust,
        Some(1) if double_out => VisitOutcome::Bust,
        Some(0) => VisitOutcome::Checkout,
        Some(left) => VisitOutcome::Scored(left),
    }
}

/// Everything derived from one replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    /// One entry per player, in seat order
    pub scores: Vec<PlayerScore>,
    /// Leg/set/match tree; `None` for modes without scoring
    pub match_score: Option<MatchScore>,
    pub current_player_id: Option<PlayerId>,
    pub winner_id: Option<PlayerId>,
}

/// Rebuild match progress from scratch.
///
/// `players` must be in seat order and `throws` in log order. Throws from
/// players who aren't seated are skipped, and anything after the match was
/// won is ignored.
pub fn reconstruct(
    config: &MatchConfig,
    players: &[GamePlayer],
    throws: &[Throw],
) -> Reconstruction {
    let current_player_id = next_player(players, throws);
    let mut scores: Vec<PlayerScore> = players.iter().map(|p| PlayerScore::new(p.id)).collect();

    if players.is_empty() || !config.mode().is_x01() {
        return Reconstruction {
            scores,
            match_score: None,
            current_player_id,
            winner_id: None,
        };
    }

    let start = config.starting_score();
    let seat_index: HashMap<PlayerId, usize> = players
        .iter()
        .enumerate()
        .map(|(idx, p)| (p.id, idx))
        .collect();

    let mut tree = MatchScore::new(config, players);
    reset_leg(&mut scores, start);

    for (position, throw) in throws.iter().enumerate() {
        if tree.is_sealed() {
            debug!(
                "match already won, ignoring {} trailing throw(s)",
                throws.len() - position
            );
            break;
        }

        let Some(&idx) = seat_index.get(&throw.player_id) else {
            warn!(
                "skipping throw {} from player {} who is not seated",
                throw.id, throw.player_id
            );
            continue;
        };

        let remaining = tree
            .current_leg()
            .remaining(throw.player_id)
            .unwrap_or(start);

        match apply_visit(remaining, throw.visit_score, config.double_out()) {
            VisitOutcome::Bust => {
                debug!(
                    "bust: player {} scored {} with {} remaining",
                    throw.player_id, throw.visit_score, remaining
                );
            }
            VisitOutcome::Scored(left) => {
                tree.set_remaining(throw.player_id, left);
                scores[idx].remaining = Some(left);
                scores[idx].last_visit = Some(throw.visit_score);
            }
            VisitOutcome::Checkout => {
                tree.set_remaining(throw.player_id, 0);
                scores[idx].remaining = Some(0);
                scores[idx].last_visit = Some(throw.visit_score);

                match tree.seal_leg(throw.player_id, throw.created_at, players) {
                    Advance::MatchWon(winner) => {
                        debug!("match won by {winner}");
                    }
                    Advance::NextLeg | Advance::NextSet => reset_leg(&mut scores, start),
                }
            }
        }
    }

    for score in &mut scores {
        score.legs_won = tree.current_set().legs_won_by(score.player_id);
        score.sets_won = tree.sets_won_by(score.player_id);
    }

    let winner_id = tree.winner();
    Reconstruction {
        scores,
        match_score: Some(tree),
        current_player_id,
        winner_id,
    }
}

fn reset_leg(scores: &mut [PlayerScore], start: u32) {
    for score in scores {
        score.remaining = Some(start);
        score.last_visit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::score::Phase;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    struct Fixture {
        players: Vec<GamePlayer>,
        throws: Vec<Throw>,
    }

    impl Fixture {
        fn new(n: u32) -> Self {
            let players = (1..=n)
                .map(|seat| GamePlayer {
                    id: Uuid::new_v4(),
                    name: format!("player{seat}"),
                    seat,
                })
                .collect();
            Self {
                players,
                throws: Vec::new(),
            }
        }

        fn id(&self, seat: usize) -> PlayerId {
            self.players[seat].id
        }

        fn throw(&mut self, seat: usize, visit_score: u32) -> &mut Self {
            let created_at = Utc::now() + Duration::milliseconds(self.throws.len() as i64);
            self.throws.push(Throw {
                id: Uuid::new_v4(),
                game_id: Uuid::nil(),
                player_id: self.players[seat].id,
                visit_score,
                darts_thrown: 3,
                created_at,
            });
            self
        }

        fn run(&self, config: &MatchConfig) -> Reconstruction {
            reconstruct(config, &self.players, &self.throws)
        }
    }

    fn x01(start: u32, legs: i64, sets: i64, double_out: bool) -> MatchConfig {
        MatchConfig::new("X01", Some(start as i64), legs, sets, double_out).unwrap()
    }

    #[test]
    fn test_apply_visit_rules() {
        assert_eq!(apply_visit(501, 140, true), VisitOutcome::Scored(361));
        assert_eq!(apply_visit(40, 41, true), VisitOutcome::Bust);
        assert_eq!(apply_visit(40, 39, true), VisitOutcome::Bust);
        assert_eq!(apply_visit(40, 39, false), VisitOutcome::Scored(1));
        assert_eq!(apply_visit(40, 40, true), VisitOutcome::Checkout);
    }

    #[test]
    fn test_empty_log() {
        let fx = Fixture::new(2);
        let result = fx.run(&x01(501, 1, 1, true));

        assert_eq!(result.current_player_id, Some(fx.id(0)));
        assert_eq!(result.winner_id, None);
        assert!(result.scores.iter().all(|s| s.remaining == Some(501)));
        let tree = result.match_score.unwrap();
        assert_eq!(tree.current_leg().phase, Phase::Open);
    }

    #[test]
    fn test_checkout_wins_single_leg_match() {
        let mut fx = Fixture::new(2);
        fx.throw(0, 140).throw(1, 100);
        let result = fx.run(&x01(501, 1, 1, true));
        assert_eq!(result.scores[0].remaining, Some(361));
        assert_eq!(result.scores[1].remaining, Some(401));
        assert_eq!(result.current_player_id, Some(fx.id(0)));

        // Visit totals aren't bounded here; 361 in one visit checks out.
        fx.throw(0, 361);
        let result = fx.run(&x01(501, 1, 1, true));
        let tree = result.match_score.unwrap();
        assert_eq!(result.winner_id, Some(fx.id(0)));
        assert_eq!(tree.sets[0].legs[0].phase.winner(), Some(fx.id(0)));
        assert_eq!(tree.sets[0].phase.winner(), Some(fx.id(0)));
        assert!(tree.is_sealed());
        assert_eq!(result.scores[0].remaining, Some(0));
        assert_eq!(result.scores[0].sets_won, 1);
    }

    #[test]
    fn test_bust_below_zero_keeps_remaining_and_passes_turn() {
        let mut fx = Fixture::new(2);
        fx.throw(0, 140).throw(1, 100).throw(0, 362);
        let result = fx.run(&x01(501, 1, 1, true));

        assert_eq!(result.scores[0].remaining, Some(361));
        assert_eq!(result.scores[0].last_visit, Some(140));
        assert_eq!(result.current_player_id, Some(fx.id(1)));
        assert_eq!(result.winner_id, None);
    }

    #[test]
    fn test_leaving_one_is_bust_under_double_out() {
        let mut fx = Fixture::new(2);
        fx.throw(0, 100);
        let result = fx.run(&x01(101, 1, 1, true));
        assert_eq!(result.scores[0].remaining, Some(101));
        assert_eq!(result.current_player_id, Some(fx.id(1)));

        let result = fx.run(&x01(101, 1, 1, false));
        assert_eq!(result.scores[0].remaining, Some(1));
    }

    #[test]
    fn test_leg_win_opens_next_leg_with_fresh_scores() {
        let mut fx = Fixture::new(2);
        fx.throw(0, 60).throw(1, 20).throw(0, 41);
        let result = fx.run(&x01(101, 2, 1, true));

        let tree = result.match_score.unwrap();
        assert_eq!(tree.current_set_index, 0);
        assert_eq!(tree.current_leg_index, 1);
        assert_eq!(tree.sets[0].legs[0].phase.winner(), Some(fx.id(0)));
        assert_eq!(tree.current_leg().phase, Phase::Open);
        assert!(result.scores.iter().all(|s| s.remaining == Some(101)));
        assert!(result.scores.iter().all(|s| s.last_visit.is_none()));
        assert_eq!(result.scores[0].legs_won, 1);
        // Rotation ignores the leg boundary.
        assert_eq!(result.current_player_id, Some(fx.id(1)));
        assert_eq!(result.winner_id, None);
    }

    #[test]
    fn test_set_win_opens_next_set() {
        let mut fx = Fixture::new(2);
        fx.throw(0, 101).throw(1, 101);
        let result = fx.run(&x01(101, 1, 2, false));

        // 1-1 in sets with sets-to-win 2: a third set is open.
        let tree = result.match_score.unwrap();
        assert_eq!(tree.sets[0].phase.winner(), Some(fx.id(0)));
        assert_eq!(tree.sets[1].phase.winner(), Some(fx.id(1)));
        assert_eq!(tree.sets.len(), 3);
        assert_eq!(tree.current_set_index, 2);
        assert_eq!(tree.current_set().set_number, 3);
        assert_eq!(tree.current_leg().leg_number, 1);
        assert_eq!(tree.current_leg().phase, Phase::Open);
        assert_eq!(result.scores[0].sets_won, 1);
        assert_eq!(result.scores[1].sets_won, 1);
        assert_eq!(result.winner_id, None);

        fx.throw(0, 101);
        let result = fx.run(&x01(101, 1, 2, false));
        assert_eq!(result.winner_id, Some(fx.id(0)));
        assert_eq!(result.match_score.unwrap().sets.len(), 3);
    }

    #[test]
    fn test_throws_after_match_end_are_ignored() {
        let mut fx = Fixture::new(2);
        fx.throw(0, 101).throw(1, 50).throw(0, 20);
        let result = fx.run(&x01(101, 1, 1, true));

        assert_eq!(result.winner_id, Some(fx.id(0)));
        assert_eq!(result.scores[1].remaining, Some(101));
    }

    #[test]
    fn test_unseated_throws_are_skipped() {
        let mut fx = Fixture::new(2);
        fx.throw(0, 60);
        fx.throws.push(Throw {
            id: Uuid::new_v4(),
            game_id: Uuid::nil(),
            player_id: Uuid::new_v4(),
            visit_score: 100,
            darts_thrown: 3,
            created_at: Utc::now() + Duration::seconds(10),
        });
        let result = fx.run(&x01(501, 1, 1, true));

        assert_eq!(result.scores[0].remaining, Some(441));
        assert_eq!(result.scores[1].remaining, Some(501));
    }

    #[test]
    fn test_other_modes_skip_scoring_but_rotate() {
        let mut fx = Fixture::new(3);
        fx.throw(0, 60).throw(1, 60);
        let config = MatchConfig::new("Cricket", None, 1, 1, false).unwrap();
        let result = fx.run(&config);

        assert!(result.match_score.is_none());
        assert!(result.scores.iter().all(|s| s.remaining.is_none()));
        assert_eq!(result.current_player_id, Some(fx.id(2)));
    }

    #[test]
    fn test_no_players() {
        let fx = Fixture::new(0);
        let result = fx.run(&x01(501, 1, 1, true));
        assert!(result.scores.is_empty());
        assert!(result.match_score.is_none());
        assert_eq!(result.current_player_id, None);
    }
}
