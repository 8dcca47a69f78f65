//! Adaptive practice library shared by study front ends.
//!
//! Provides:
//! - Difficulty classification from recent attempt history
//! - Chunked adaptive question scheduling (learning and review phases)
//! - Plain-text deck parser
//! - Answer matching for typed mode
//! - Practice session driver and attempt store seam

pub mod algorithm;
pub mod error;
pub mod filter;
pub mod history;
pub mod matching;
pub mod parser;
pub mod session;
pub mod settings;
pub mod store;
pub mod types;

pub use algorithm::chunked::{ChunkState, ChunkedScheduler, Phase};
pub use algorithm::difficulty::CardScore;
pub use algorithm::QuestionScheduler;
pub use error::{HistoryError, ParseError, Result, SessionError, StoreError};
pub use filter::{filter_cards, CardFilter};
pub use history::AttemptHistory;
pub use matching::{levenshtein_distance, AnswerOracle, ShortAnswerMatcher};
pub use parser::parse;
pub use session::{Direction, Question, QuestionKind, StudySession};
pub use settings::{
    AnswerType, ConfigUpdate, PracticeSettings, PracticeSettingsUpdate, QuizMode, Rigor,
    SchedulerConfig,
};
pub use store::{AttemptStore, InMemoryStore, NewAttempt};
pub use types::{Attempt, AttemptResult, Card, Difficulty};
