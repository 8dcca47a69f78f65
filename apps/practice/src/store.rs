//! JSON file store.
//!
//! The whole store lives in one JSON document that is rewritten after every
//! change. Attempt ids continue from the largest id on disk. A change that
//! cannot be written is undone in memory too.

use std::fs;
use std::path::{Path, PathBuf};

use study_core::store::{AttemptStore, InMemoryStore, NewAttempt, Result};
use study_core::{Attempt, AttemptResult, PracticeSettings, StoreError};

pub const STORE_FILE: &str = "practice.json";

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Open the store in `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(backend)?;
        let path = dir.join(STORE_FILE);

        let inner = if path.exists() {
            let content = fs::read_to_string(&path).map_err(backend)?;
            serde_json::from_str(&content).map_err(backend)?
        } else {
            InMemoryStore::new()
        };

        tracing::debug!(path = %path.display(), "opened practice store");
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and write the result, restoring the previous state if
    /// either step fails.
    fn commit<T>(&mut self, change: impl FnOnce(&mut InMemoryStore) -> Result<T>) -> Result<T> {
        let previous = self.inner.clone();
        let outcome = change(&mut self.inner).and_then(|value| self.persist().map(|()| value));
        if outcome.is_err() {
            self.inner = previous;
        }
        outcome
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.inner).map_err(backend)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(backend)?;
        fs::rename(&tmp, &self.path).map_err(backend)
    }
}

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl AttemptStore for JsonFileStore {
    fn save_attempt(&mut self, set_id: i64, attempt: &NewAttempt) -> Result<Attempt> {
        self.commit(|inner| inner.save_attempt(set_id, attempt))
    }

    fn update_result(&mut self, attempt_id: i64, result: AttemptResult) -> Result<()> {
        self.commit(|inner| inner.update_result(attempt_id, result))
    }

    fn load_attempts(&self, set_id: i64) -> Result<Vec<Attempt>> {
        self.inner.load_attempts(set_id)
    }

    fn load_preferences(&self, user_id: &str, set_id: i64) -> Result<Option<PracticeSettings>> {
        self.inner.load_preferences(user_id, set_id)
    }

    fn save_preferences(
        &mut self,
        user_id: &str,
        set_id: i64,
        settings: &PracticeSettings,
    ) -> Result<()> {
        self.commit(|inner| inner.save_preferences(user_id, set_id, settings))
    }
}
