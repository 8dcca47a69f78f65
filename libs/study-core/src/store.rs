//! Persistence seam for attempts and practice preferences.

use crate::error::StoreError;
use crate::settings::PracticeSettings;
use crate::types::{Attempt, AttemptResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Result<T> = std::result::Result<T, StoreError>;

/// An attempt as submitted, before storage assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttempt {
    pub card_uid: i64,
    pub result: AttemptResult,
    pub attempted_at: DateTime<Utc>,
    #[serde(default)]
    pub response_ms: Option<u64>,
}

impl From<&Attempt> for NewAttempt {
    fn from(attempt: &Attempt) -> Self {
        Self {
            card_uid: attempt.card_uid,
            result: attempt.result,
            attempted_at: attempt.attempted_at,
            response_ms: attempt.response_ms,
        }
    }
}

/// Storage for attempts (per set) and preferences (per user and set).
pub trait AttemptStore {
    /// Persist an attempt and return it with its confirmed (positive) id.
    fn save_attempt(&mut self, set_id: i64, attempt: &NewAttempt) -> Result<Attempt>;
    fn update_result(&mut self, attempt_id: i64, result: AttemptResult) -> Result<()>;
    /// All attempts for a set, oldest first.
    fn load_attempts(&self, set_id: i64) -> Result<Vec<Attempt>>;
    fn load_preferences(&self, user_id: &str, set_id: i64) -> Result<Option<PracticeSettings>>;
    fn save_preferences(
        &mut self,
        user_id: &str,
        set_id: i64,
        settings: &PracticeSettings,
    ) -> Result<()>;
}

/// Process-local store, also the serialized shape of file-backed stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryStore {
    next_id: i64,
    attempts: HashMap<i64, Vec<Attempt>>,
    preferences: HashMap<String, PracticeSettings>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn preference_key(user_id: &str, set_id: i64) -> String {
        format!("{user_id}/{set_id}")
    }
}

impl AttemptStore for InMemoryStore {
    fn save_attempt(&mut self, set_id: i64, attempt: &NewAttempt) -> Result<Attempt> {
        self.next_id += 1;
        let saved = Attempt {
            id: self.next_id,
            card_uid: attempt.card_uid,
            result: attempt.result,
            attempted_at: attempt.attempted_at,
            response_ms: attempt.response_ms,
        };
        self.attempts.entry(set_id).or_default().push(saved.clone());
        Ok(saved)
    }

    fn update_result(&mut self, attempt_id: i64, result: AttemptResult) -> Result<()> {
        let attempt = self
            .attempts
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|a| a.id == attempt_id)
            .ok_or(StoreError::AttemptNotFound(attempt_id))?;
        attempt.result = result;
        Ok(())
    }

    fn load_attempts(&self, set_id: i64) -> Result<Vec<Attempt>> {
        let mut attempts = self.attempts.get(&set_id).cloned().unwrap_or_default();
        attempts.sort_by_key(|a| a.attempted_at);
        Ok(attempts)
    }

    fn load_preferences(&self, user_id: &str, set_id: i64) -> Result<Option<PracticeSettings>> {
        Ok(self
            .preferences
            .get(&Self::preference_key(user_id, set_id))
            .copied())
    }

    fn save_preferences(
        &mut self,
        user_id: &str,
        set_id: i64,
        settings: &PracticeSettings,
    ) -> Result<()> {
        self.preferences
            .insert(Self::preference_key(user_id, set_id), *settings);
        Ok(())
    }
}
