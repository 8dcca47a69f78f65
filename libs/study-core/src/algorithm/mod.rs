//! Question scheduling.

pub mod chunked;
pub mod difficulty;

use crate::settings::{ConfigUpdate, SchedulerConfig};
use crate::types::{Attempt, Card};

/// Picks the next card to quiz from a fixed pool and a chronological history.
pub trait QuestionScheduler {
    /// Scheduler identifier.
    fn name(&self) -> &'static str;

    /// Index into `cards` of the next card to ask.
    ///
    /// `cards` must not be empty.
    fn next_question(&mut self, cards: &[Card], history: &[Attempt]) -> usize;

    /// Replace the fields present in `update` and drop any scheduling state
    /// derived from the previous configuration.
    fn set_config(&mut self, update: &ConfigUpdate);

    fn config(&self) -> &SchedulerConfig;
}
