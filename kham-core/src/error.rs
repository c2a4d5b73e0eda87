//! Error types for game operations.

use thiserror::Error;

use crate::LevelId;

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;

/// Errors raised by the lexicon, progress store, unlock controller and game session.
///
/// Every operation that returns one of these leaves the progress state untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// Level id is not part of the lexicon.
    #[error("Level not found: {0}")]
    LevelNotFound(LevelId),

    /// Word index is outside the level's word list.
    #[error("Word index {index} out of range for level {level} ({len} words)")]
    WordOutOfRange {
        /// Level that was addressed.
        level: LevelId,
        /// Requested index.
        index: usize,
        /// Number of words in the level.
        len: usize,
    },

    /// Level is above the highest unlocked level.
    #[error("Level {level} is locked: pass level {unlocked} with at least {threshold} words first")]
    LevelLocked {
        /// Requested level.
        level: LevelId,
        /// Highest unlocked level.
        unlocked: LevelId,
        /// Words required to unlock the next level.
        threshold: usize,
    },

    /// Unlock was requested for a level that is not currently unlockable.
    #[error("Level {level} cannot be unlocked: {reason}")]
    NotUnlockable {
        /// Requested level.
        level: LevelId,
        /// Why the unlock was rejected.
        reason: String,
    },

    /// An answer operation was attempted with no word loaded.
    #[error("No word is currently loaded")]
    NoActiveWord,

    /// Lexicon data was malformed.
    #[error("Invalid lexicon: {0}")]
    InvalidLexicon(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
