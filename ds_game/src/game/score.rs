//! Leg → Set → Match score tree.
//!
//! Every leg, set and the match itself carries a [`Phase`]. The only way
//! anything moves from `Open` to `Sealed` is [`MatchScore::seal_leg`], which
//! also opens whatever comes next. The addressed leg is therefore always the
//! last leg of the last set, and it is open for as long as the match is.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::models::{GamePlayer, MatchConfig, PlayerId};

/// Open/sealed state of a leg, set or match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(
    tag = "state",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Phase {
    Open,
    Sealed {
        winner_id: PlayerId,
        finished_at: DateTime<Utc>,
    },
}

impl Phase {
    pub fn is_sealed(&self) -> bool {
        matches!(self, Phase::Sealed { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            Phase::Open => None,
            Phase::Sealed { winner_id, .. } => Some(*winner_id),
        }
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Phase::Open => None,
            Phase::Sealed { finished_at, .. } => Some(*finished_at),
        }
    }
}

/// One leg played down from the starting score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegScore {
    pub leg_number: u32,
    pub starting_score: u32,
    pub scores_by_player: BTreeMap<PlayerId, u32>,
    #[serde(flatten)]
    pub phase: Phase,
}

impl LegScore {
    fn new(leg_number: u32, starting_score: u32, players: &[GamePlayer]) -> Self {
        Self {
            leg_number,
            starting_score,
            scores_by_player: players.iter().map(|p| (p.id, starting_score)).collect(),
            phase: Phase::Open,
        }
    }

    /// Remaining score of a player in this leg
    pub fn remaining(&self, player_id: PlayerId) -> Option<u32> {
        self.scores_by_player.get(&player_id).copied()
    }
}

/// Group of legs won by reaching `legs_to_win`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
    pub set_number: u32,
    pub legs_to_win: u32,
    pub legs: Vec<LegScore>,
    #[serde(flatten)]
    pub phase: Phase,
}

impl SetScore {
    fn new(set_number: u32, legs_to_win: u32, starting_score: u32, players: &[GamePlayer]) -> Self {
        Self {
            set_number,
            legs_to_win,
            legs: vec![LegScore::new(1, starting_score, players)],
            phase: Phase::Open,
        }
    }

    /// Number of legs in this set won by the player
    pub fn legs_won_by(&self, player_id: PlayerId) -> u32 {
        self.legs
            .iter()
            .filter(|leg| leg.phase.winner() == Some(player_id))
            .count() as u32
    }
}

/// What [`MatchScore::seal_leg`] opened after sealing a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Next leg in the same set
    NextLeg,
    /// Set sealed; leg 1 of a new set
    NextSet,
    /// Set and match sealed; nothing opened
    MatchWon(PlayerId),
}

/// Whole match tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub sets_to_win: u32,
    pub current_set_index: usize,
    pub current_leg_index: usize,
    pub sets: Vec<SetScore>,
    #[serde(flatten)]
    pub phase: Phase,
}

impl MatchScore {
    /// Set 1 with leg 1, everyone on the starting score
    pub fn new(config: &MatchConfig, players: &[GamePlayer]) -> Self {
        Self {
            sets_to_win: config.sets_to_win(),
            current_set_index: 0,
            current_leg_index: 0,
            sets: vec![SetScore::new(
                1,
                config.legs_to_win(),
                config.starting_score(),
                players,
            )],
            phase: Phase::Open,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.phase.is_sealed()
    }

    pub fn current_set(&self) -> &SetScore {
        &self.sets[self.current_set_index]
    }

    pub fn current_leg(&self) -> &LegScore {
        &self.current_set().legs[self.current_leg_index]
    }

    /// Record a non-bust result for a player in the addressed leg
    pub(crate) fn set_remaining(&mut self, player_id: PlayerId, remaining: u32) {
        let set = &mut self.sets[self.current_set_index];
        set.legs[self.current_leg_index]
            .scores_by_player
            .insert(player_id, remaining);
    }

    /// Number of sets won by the player
    pub fn sets_won_by(&self, player_id: PlayerId) -> u32 {
        self.sets
            .iter()
            .filter(|set| set.phase.winner() == Some(player_id))
            .count() as u32
    }

    /// Player whose won-set count reached the threshold, if any
    pub fn winner(&self) -> Option<PlayerId> {
        let mut counts: BTreeMap<PlayerId, u32> = BTreeMap::new();
        for winner in self.sets.iter().filter_map(|set| set.phase.winner()) {
            *counts.entry(winner).or_default() += 1;
        }
        counts
            .into_iter()
            .find(|&(_, won)| won >= self.sets_to_win)
            .map(|(player_id, _)| player_id)
    }

    /// Seal the addressed leg and advance.
    ///
    /// Seals the set when the winner reached `legs_to_win` in it and the
    /// match when the winner reached `sets_to_win`. Unless the match is
    /// sealed, opens the next leg (or the next set) with every player back
    /// on the starting score.
    pub(crate) fn seal_leg(
        &mut self,
        winner_id: PlayerId,
        finished_at: DateTime<Utc>,
        players: &[GamePlayer],
    ) -> Advance {
        let sealed = Phase::Sealed {
            winner_id,
            finished_at,
        };

        let set = &mut self.sets[self.current_set_index];
        let starting_score = set.legs[self.current_leg_index].starting_score;
        set.legs[self.current_leg_index].phase = sealed;

        if set.legs_won_by(winner_id) < set.legs_to_win {
            let leg_number = set.legs.len() as u32 + 1;
            set.legs.push(LegScore::new(leg_number, starting_score, players));
            self.current_leg_index = set.legs.len() - 1;
            return Advance::NextLeg;
        }

        set.phase = sealed;
        let legs_to_win = set.legs_to_win;

        if self.sets_won_by(winner_id) >= self.sets_to_win {
            self.phase = sealed;
            return Advance::MatchWon(winner_id);
        }

        let set_number = self.sets.len() as u32 + 1;
        self.sets.push(SetScore::new(
            set_number,
            legs_to_win,
            starting_score,
            players,
        ));
        self.current_set_index = self.sets.len() - 1;
        self.current_leg_index = 0;
        Advance::NextSet
    }
}
