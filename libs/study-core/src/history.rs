//! Chronological attempt history for a study session.
//!
//! The history is append-only apart from two in-place patches: swapping a
//! provisional record for the one confirmed by storage, and correcting the
//! result of an existing attempt. Neither changes position or count.

use crate::error::HistoryError;
use crate::types::{Attempt, AttemptResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptHistory {
    attempts: Vec<Attempt>,
}

impl AttemptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from attempts already in chronological order (e.g. loaded from storage).
    pub fn from_attempts(attempts: Vec<Attempt>) -> Self {
        Self { attempts }
    }

    pub fn push(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    /// A fresh negative id below every provisional id currently held.
    pub fn next_provisional_id(&self) -> i64 {
        let lowest = self.attempts.iter().map(|a| a.id).min().unwrap_or(0);
        lowest.min(0) - 1
    }

    /// Replace the record with `prev_id` by `saved`, keeping its position.
    pub fn replace(&mut self, prev_id: i64, saved: Attempt) -> Result<(), HistoryError> {
        let slot = self
            .attempts
            .iter_mut()
            .find(|a| a.id == prev_id)
            .ok_or(HistoryError::AttemptNotFound(prev_id))?;
        *slot = saved;
        Ok(())
    }

    /// Correct the result of an attempt in place. Returns the previous result.
    pub fn set_result(
        &mut self,
        id: i64,
        result: AttemptResult,
    ) -> Result<AttemptResult, HistoryError> {
        let slot = self
            .attempts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(HistoryError::AttemptNotFound(id))?;
        Ok(std::mem::replace(&mut slot.result, result))
    }

    pub fn for_card(&self, card_uid: i64) -> impl Iterator<Item = &Attempt> + '_ {
        self.attempts.iter().filter(move |a| a.card_uid == card_uid)
    }

    pub fn last_for_card(&self, card_uid: i64) -> Option<&Attempt> {
        self.attempts.iter().rev().find(|a| a.card_uid == card_uid)
    }

    pub fn as_slice(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
