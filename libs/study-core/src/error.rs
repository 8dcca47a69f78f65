//! Error types for study-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while parsing a deck file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing term at line {line}")]
    MissingTerm { line: usize },

    #[error("missing definition at line {line}")]
    MissingDefinition { line: usize },

    #[error("invalid ID format at line {line}: {value}")]
    InvalidId { line: usize, value: String },

    #[error("duplicate ID {id} at line {line}")]
    DuplicateId { id: i64, line: usize },
}

/// Errors from patching the attempt history.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("attempt not found: {0}")]
    AttemptNotFound(i64),
}

/// Errors raised by an attempt store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attempt not found: {0}")]
    AttemptNotFound(i64),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from driving a study session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("deck has no cards")]
    EmptyDeck,

    #[error("no question is being asked")]
    NoActiveQuestion,

    #[error(transparent)]
    History(#[from] HistoryError),
}
