//! Core types for the study engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A term/definition pair. Cards are fixed for the length of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub uid: i64,
    pub term: String,
    pub definition: String,
}

impl Card {
    pub fn new(uid: i64, term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            uid,
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// Outcome of a single attempt at a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptResult {
    Correct,
    Incorrect,
    Unsure,
}

impl AttemptResult {
    /// Map an answer-checker verdict.
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }

    /// Contribution of this outcome to an attempt's difficulty.
    pub fn accuracy_factor(self) -> f64 {
        match self {
            Self::Incorrect => 1.0,
            Self::Unsure => 0.5,
            Self::Correct => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::Unsure => "unsure",
        }
    }
}

/// A recorded attempt. Negative ids are provisional (not yet confirmed by storage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub card_uid: i64,
    pub result: AttemptResult,
    pub attempted_at: DateTime<Utc>,
    #[serde(default)]
    pub response_ms: Option<u64>,
}

impl Attempt {
    pub fn new(
        id: i64,
        card_uid: i64,
        result: AttemptResult,
        attempted_at: DateTime<Utc>,
        response_ms: u64,
    ) -> Self {
        Self {
            id,
            card_uid,
            result,
            attempted_at,
            response_ms: Some(response_ms),
        }
    }

    /// Response time, with a missing value read as zero.
    pub fn response_ms_or_zero(&self) -> u64 {
        self.response_ms.unwrap_or(0)
    }

    pub fn is_provisional(&self) -> bool {
        self.id < 0
    }
}

/// Display label for how well a card is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    New,
    Challenging,
    Familiar,
    Proficient,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Challenging => "Challenging",
            Self::Familiar => "Familiar",
            Self::Proficient => "Proficient",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "challenging" => Some(Self::Challenging),
            "familiar" => Some(Self::Familiar),
            "proficient" => Some(Self::Proficient),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
