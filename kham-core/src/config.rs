//! Tunable game rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Words answered in the highest unlocked level before the next one may be unlocked.
pub const DEFAULT_UNLOCK_THRESHOLD: usize = 5;
/// Consonant tiles on the keyboard (3 rows of 4).
pub const DEFAULT_CONSONANT_TILES: usize = 12;
/// Vowel and tone tiles on the keyboard (1 row of 4).
pub const DEFAULT_VOWEL_TILES: usize = 4;
/// How long a wrong answer stays on screen before the selection clears.
pub const DEFAULT_WRONG_ANSWER_DELAY_MS: u64 = 1500;
/// How long a correct answer is celebrated before the next word loads.
pub const DEFAULT_CORRECT_ADVANCE_DELAY_MS: u64 = 1200;

/// Game rule configuration.
///
/// Deserializes with defaults for every missing field, so a partial JSON
/// object such as `{"unlock_threshold": 3}` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Answered words needed to make the next level unlockable.
    pub unlock_threshold: usize,
    /// Minimum consonant tiles per keyboard.
    pub consonant_tiles: usize,
    /// Minimum vowel/tone tiles per keyboard.
    pub vowel_tiles: usize,
    /// Delay before a wrong selection is cleared, in milliseconds.
    pub wrong_answer_delay_ms: u64,
    /// Delay before advancing after a correct answer, in milliseconds.
    pub correct_advance_delay_ms: u64,
}

impl GameConfig {
    /// Delay before a wrong selection is cleared.
    #[must_use]
    pub const fn wrong_answer_delay(&self) -> Duration {
        Duration::from_millis(self.wrong_answer_delay_ms)
    }

    /// Delay before advancing after a correct answer.
    #[must_use]
    pub const fn correct_advance_delay(&self) -> Duration {
        Duration::from_millis(self.correct_advance_delay_ms)
    }

    /// Configuration with no presentation delays, for headless drivers and tests.
    #[must_use]
    pub fn without_delays() -> Self {
        Self {
            wrong_answer_delay_ms: 0,
            correct_advance_delay_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            unlock_threshold: DEFAULT_UNLOCK_THRESHOLD,
            consonant_tiles: DEFAULT_CONSONANT_TILES,
            vowel_tiles: DEFAULT_VOWEL_TILES,
            wrong_answer_delay_ms: DEFAULT_WRONG_ANSWER_DELAY_MS,
            correct_advance_delay_ms: DEFAULT_CORRECT_ADVANCE_DELAY_MS,
        }
    }
}
