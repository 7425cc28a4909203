//! Turn order and throw admission.

use super::errors::{GameError, GameResult};
use super::models::{
    GamePlayer, GameStatus, MAX_DARTS_PER_VISIT, MAX_VISIT_SCORE, PlayerId, Throw, ThrowDraft,
    ThrowRequest,
};
use super::state::MatchState;

/// Player expected to throw next.
///
/// The seat after whoever threw last, wrapping around; busts and leg or set
/// boundaries don't change the rotation. An empty log starts at the first
/// seat, as does a log whose last thrower isn't seated. `players` must be
/// in seat order.
pub fn next_player(players: &[GamePlayer], throws: &[Throw]) -> Option<PlayerId> {
    let first = players.first()?.id;
    let Some(last) = throws.last() else {
        return Some(first);
    };

    let next = players
        .iter()
        .position(|p| p.id == last.player_id)
        .map(|idx| players[(idx + 1) % players.len()].id)
        .unwrap_or(first);
    Some(next)
}

/// Check darts thrown and visit score against their domains
pub fn check_ranges(request: &ThrowRequest) -> GameResult<ThrowDraft> {
    let darts_thrown = u8::try_from(request.darts_thrown)
        .ok()
        .filter(|d| (1..=MAX_DARTS_PER_VISIT).contains(d))
        .ok_or(GameError::InvalidDartsThrown(request.darts_thrown))?;
    let visit_score = u32::try_from(request.visit_score)
        .ok()
        .filter(|&v| v <= MAX_VISIT_SCORE)
        .ok_or(GameError::InvalidVisitScore(request.visit_score))?;

    Ok(ThrowDraft {
        player_id: request.player_id,
        visit_score,
        darts_thrown,
    })
}

/// Decide whether a throw may be appended to the match.
///
/// # Errors
///
/// * `GameError::InvalidDartsThrown` / `GameError::InvalidVisitScore` - Out of range
/// * `GameError::GameFinished` - The match already has a winner
/// * `GameError::PlayerNotInGame` - The player isn't seated
/// * `GameError::OutOfTurn` - Another player is due
pub fn validate(state: &MatchState, request: &ThrowRequest) -> GameResult<ThrowDraft> {
    let draft = check_ranges(request)?;

    if state.status == GameStatus::Finished {
        return Err(GameError::GameFinished);
    }

    if !state.players.iter().any(|p| p.id == draft.player_id) {
        return Err(GameError::PlayerNotInGame(draft.player_id));
    }

    match state.current_player_id {
        Some(expected) if expected != draft.player_id => {
            return Err(GameError::OutOfTurn {
                expected,
                actual: draft.player_id,
            });
        }
        _ => {}
    }

    Ok(draft)
}
