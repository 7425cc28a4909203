//! Ordered, append-only throw log.

use chrono::{DateTime, Duration, Utc};

use super::errors::{GameError, GameResult};
use super::models::Throw;

/// Throws of one match, totally ordered by `(created_at, id)`.
///
/// The only supported removal is [`ThrowLog::undo`], which drops the most
/// recent throw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrowLog {
    throws: Vec<Throw>,
}

impl ThrowLog {
    /// Build a log from throws in any order
    pub fn new(mut throws: Vec<Throw>) -> Self {
        throws.sort_by_key(Throw::order_key);
        Self { throws }
    }

    /// Insert a throw, keeping log order
    pub fn append(&mut self, throw: Throw) {
        let key = throw.order_key();
        let at = self.throws.partition_point(|t| t.order_key() <= key);
        self.throws.insert(at, throw);
    }

    /// Remove the most recent throw
    ///
    /// # Errors
    ///
    /// * `GameError::NothingToUndo` - The log is empty
    pub fn undo(&mut self) -> GameResult<Throw> {
        self.throws.pop().ok_or(GameError::NothingToUndo)
    }

    /// Timestamp for the next throw: `now`, or just after the latest
    /// recorded throw if the clock hasn't moved past it.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last() {
            Some(last) if last.created_at >= now => last.created_at + Duration::microseconds(1),
            _ => now,
        }
    }

    pub fn last(&self) -> Option<&Throw> {
        self.throws.last()
    }

    pub fn len(&self) -> usize {
        self.throws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.throws.is_empty()
    }

    pub fn as_slice(&self) -> &[Throw] {
        &self.throws
    }

    pub fn into_vec(self) -> Vec<Throw> {
        self.throws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn throw_at(created_at: DateTime<Utc>, visit_score: u32) -> Throw {
        Throw {
            id: Uuid::new_v4(),
            game_id: Uuid::nil(),
            player_id: Uuid::nil(),
            visit_score,
            darts_thrown: 3,
            created_at,
        }
    }

    #[test]
    fn test_new_sorts_by_time() {
        let now = Utc::now();
        let late = throw_at(now, 60);
        let early = throw_at(now - Duration::seconds(5), 20);
        let log = ThrowLog::new(vec![late.clone(), early.clone()]);

        assert_eq!(log.as_slice(), &[early, late]);
    }

    #[test]
    fn test_append_keeps_order() {
        let now = Utc::now();
        let mut log = ThrowLog::new(vec![
            throw_at(now, 1),
            throw_at(now + Duration::seconds(2), 3),
        ]);
        log.append(throw_at(now + Duration::seconds(1), 2));
        log.append(throw_at(now + Duration::seconds(3), 4));

        let scores: Vec<u32> = log.as_slice().iter().map(|t| t.visit_score).collect();
        assert_eq!(scores, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_undo_removes_most_recent() {
        let now = Utc::now();
        let mut log = ThrowLog::new(vec![
            throw_at(now + Duration::seconds(1), 2),
            throw_at(now, 1),
        ]);

        assert_eq!(log.undo().unwrap().visit_score, 2);
        assert_eq!(log.undo().unwrap().visit_score, 1);
        assert!(matches!(log.undo(), Err(GameError::NothingToUndo)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_next_timestamp_is_strictly_after_last() {
        let now = Utc::now();
        let mut log = ThrowLog::default();
        assert_eq!(log.next_timestamp(now), now);

        log.append(throw_at(now, 0));
        let next = log.next_timestamp(now);
        assert!(next > now);

        let later = now + Duration::seconds(1);
        assert_eq!(log.next_timestamp(later), later);
    }
}
