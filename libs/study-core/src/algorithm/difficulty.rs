//! Difficulty classification from a card's recent attempts.
//!
//! Only the most recent [`RECENT_WINDOW`] attempts of a card count. Within
//! that window each attempt is weighted linearly by position, oldest = 0 and
//! newest = 1, so a fresh miss outweighs a run of older correct answers.

use crate::types::{Attempt, AttemptResult, Card, Difficulty};
use serde::{Deserialize, Serialize};

/// Attempts per card considered by the classifier.
pub const RECENT_WINDOW: usize = 10;

/// Response time at which an answer counts as maximally slow.
pub const SLOW_RESPONSE_MS: f64 = 10_000.0;

const ACCURACY_WEIGHT: f64 = 0.9;
const SPEED_WEIGHT: f64 = 0.1;

/// Upper bound (inclusive) of the "Proficient" band.
pub const PROFICIENT_MAX: f64 = 0.1;
/// Upper bound (inclusive) of the "Familiar" band.
pub const FAMILIAR_MAX: f64 = 0.3;

/// Classifier output for one card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardScore {
    /// 0.0 (known) to 1.0 (unknown).
    pub difficulty: f64,
    /// Every recorded attempt at the card, not just the recent window.
    pub total_attempts: usize,
    /// Incorrect attempts inside the recent window.
    pub recent_misses: usize,
}

impl CardScore {
    fn unseen() -> Self {
        Self {
            difficulty: 1.0,
            total_attempts: 0,
            recent_misses: 0,
        }
    }

    pub fn label(&self) -> Difficulty {
        if self.total_attempts == 0 {
            Difficulty::New
        } else if self.difficulty <= PROFICIENT_MAX {
            Difficulty::Proficient
        } else if self.difficulty <= FAMILIAR_MAX {
            Difficulty::Familiar
        } else {
            Difficulty::Challenging
        }
    }
}

/// Score a card against the full chronological history.
pub fn score(card: &Card, history: &[Attempt]) -> CardScore {
    score_uid(card.uid, history)
}

/// Display label for a card.
pub fn label(card: &Card, history: &[Attempt]) -> Difficulty {
    score(card, history).label()
}

/// Score by uid alone. Attempts for uids outside the pool are scored the same way.
pub fn score_uid(card_uid: i64, history: &[Attempt]) -> CardScore {
    let attempts: Vec<&Attempt> = history.iter().filter(|a| a.card_uid == card_uid).collect();
    let total_attempts = attempts.len();
    if total_attempts == 0 {
        return CardScore::unseen();
    }

    let recent = &attempts[total_attempts.saturating_sub(RECENT_WINDOW)..];
    let n = recent.len();

    let weighted: f64 = recent
        .iter()
        .enumerate()
        .map(|(i, attempt)| time_factor(i, n) * attempt_difficulty(attempt))
        .sum();

    CardScore {
        difficulty: weighted / n as f64,
        total_attempts,
        recent_misses: recent
            .iter()
            .filter(|a| a.result == AttemptResult::Incorrect)
            .count(),
    }
}

fn time_factor(position: usize, n: usize) -> f64 {
    if n > 1 {
        position as f64 / (n - 1) as f64
    } else {
        1.0
    }
}

fn attempt_difficulty(attempt: &Attempt) -> f64 {
    let speed = (attempt.response_ms_or_zero() as f64 / SLOW_RESPONSE_MS).min(1.0);
    ACCURACY_WEIGHT * attempt.result.accuracy_factor() + SPEED_WEIGHT * speed
}
