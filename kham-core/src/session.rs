//! Game session: one player's gameplay context.
//!
//! [`GameSession`] owns everything the presentation layer drives: the
//! progress model, the active word, its answer selection and keyboard. All
//! operations are synchronous; persistence is the caller's job (see
//! [`crate::game::Game`]).

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::answer::{AnswerSession, TapAction};
use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::keyboard::{KeyboardGenerator, KeyboardTileSet};
use crate::lexicon::{LevelId, Lexicon, WordEntry};
use crate::progress::{ProgressState, ProgressSummary};
use crate::unlock::{LevelStatus, Surface, UnlockController};

/// Position of the word being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPosition {
    /// Level.
    pub level: LevelId,
    /// Index within the level.
    pub index: usize,
}

/// Result of submitting the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Selection matches the word.
    Correct {
        /// Whether this scored (first correct answer for the word).
        first_time: bool,
        /// Level that just became unlockable.
        unlock_ready: Option<LevelId>,
    },
    /// Selection does not match; the caller resets after a delay.
    Incorrect {
        /// What was submitted.
        attempt: String,
    },
}

impl SubmitOutcome {
    /// Whether the answer was right.
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        matches!(self, Self::Correct { .. })
    }

    /// Whether progress changed and should be persisted.
    #[must_use]
    pub const fn changed_progress(&self) -> bool {
        matches!(self, Self::Correct { first_time: true, .. })
    }
}

/// Result of moving past the current word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The next word is loaded.
    NextWord(WordPosition),
    /// The last word was passed; the score snapshot was taken.
    LevelComplete {
        /// Completed level.
        level: LevelId,
        /// Snapshot score.
        score: u32,
    },
    /// Skipped past the last word without completing the level.
    BackToLevelSelect {
        /// Level that was left.
        level: LevelId,
    },
}

struct ActiveWord {
    position: WordPosition,
    answer: AnswerSession,
    keyboard: KeyboardTileSet,
}

/// Gameplay context for one player.
pub struct GameSession {
    lexicon: Arc<Lexicon>,
    alphabet: Alphabet,
    config: GameConfig,
    unlock: UnlockController,
    keyboards: KeyboardGenerator,
    rng: StdRng,
    progress: ProgressState,
    surface: Surface,
    active: Option<ActiveWord>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("surface", &self.surface)
            .field("position", &self.position())
            .field("unlocked_level", &self.progress.unlocked_level())
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Create a session with fresh progress on the level-selection surface.
    #[must_use]
    pub fn new(lexicon: Arc<Lexicon>, alphabet: Alphabet, config: GameConfig) -> Self {
        Self {
            unlock: UnlockController::new(config.unlock_threshold),
            keyboards: KeyboardGenerator::from_config(&config),
            rng: StdRng::from_entropy(),
            lexicon,
            alphabet,
            config,
            progress: ProgressState::default(),
            surface: Surface::LevelSelect,
            active: None,
        }
    }

    /// Thai lexicon and alphabet with default rules.
    #[must_use]
    pub fn thai() -> Self {
        Self::new(
            Arc::new(Lexicon::thai()),
            Alphabet::thai(),
            GameConfig::default(),
        )
    }

    /// Use a seeded RNG for keyboard generation.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace progress with a loaded snapshot and return to level selection.
    pub fn load_progress(&mut self, mut progress: ProgressState) {
        self.unlock.rederive(&mut progress, &self.lexicon);
        self.progress = progress;
        self.active = None;
        self.surface = Surface::LevelSelect;
        tracing::debug!(unlocked = %self.progress.unlocked_level(), "Progress loaded");
    }

    /// The level table.
    #[must_use]
    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    /// Game rules.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current progress.
    #[must_use]
    pub const fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Current surface.
    #[must_use]
    pub const fn surface(&self) -> Surface {
        self.surface
    }

    /// Position of the active word.
    #[must_use]
    pub fn position(&self) -> Option<WordPosition> {
        self.active.as_ref().map(|a| a.position)
    }

    /// The active word entry.
    #[must_use]
    pub fn current_word(&self) -> Option<&WordEntry> {
        let pos = self.position()?;
        self.lexicon.get_word(pos.level, pos.index).ok()
    }

    /// Audio reference of the active word.
    #[must_use]
    pub fn current_audio_ref(&self) -> Option<String> {
        let pos = self.position()?;
        let level = self.lexicon.get_level(pos.level).ok()?;
        level.words.get(pos.index).map(|w| level.audio_ref(w))
    }

    /// Answer selection for the active word.
    #[must_use]
    pub fn answer(&self) -> Option<&AnswerSession> {
        self.active.as_ref().map(|a| &a.answer)
    }

    /// Keyboard for the active word.
    #[must_use]
    pub fn keyboard(&self) -> Option<&KeyboardTileSet> {
        self.active.as_ref().map(|a| &a.keyboard)
    }

    /// Status of every level.
    #[must_use]
    pub fn level_statuses(&self) -> Vec<(LevelId, LevelStatus)> {
        self.unlock.statuses(&self.progress, &self.lexicon)
    }

    /// Progress figures over unlocked levels.
    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        self.progress.summary(&self.lexicon)
    }

    /// Start a level at its first unanswered word.
    ///
    /// # Errors
    ///
    /// [`GameError::LevelNotFound`] or [`GameError::LevelLocked`].
    pub fn start_level(&mut self, level: LevelId) -> GameResult<WordPosition> {
        self.unlock
            .ensure_playable(&self.progress, &self.lexicon, level)?;
        let index = self.progress.first_unanswered(&self.lexicon, level);
        self.load_word(level, index)
    }

    /// Start a level at a chosen word.
    ///
    /// # Errors
    ///
    /// [`GameError::LevelNotFound`], [`GameError::LevelLocked`] or
    /// [`GameError::WordOutOfRange`].
    pub fn start_level_at_word(&mut self, level: LevelId, index: usize) -> GameResult<WordPosition> {
        self.unlock
            .ensure_playable(&self.progress, &self.lexicon, level)?;
        self.load_word(level, index)
    }

    fn load_word(&mut self, level: LevelId, index: usize) -> GameResult<WordPosition> {
        let word = self.lexicon.get_word(level, index)?;
        let keyboard = self
            .keyboards
            .generate_with(&word.text, &self.alphabet, &mut self.rng);
        let position = WordPosition { level, index };

        self.active = Some(ActiveWord {
            position,
            answer: AnswerSession::new(word.text.clone()),
            keyboard,
        });
        self.progress.set_current_level(level);
        self.surface = Surface::Gameplay;
        tracing::debug!(%level, index, "Loaded word");
        Ok(position)
    }

    fn active_mut(&mut self) -> GameResult<&mut ActiveWord> {
        self.active.as_mut().ok_or(GameError::NoActiveWord)
    }

    /// Tap a keyboard tile.
    ///
    /// # Errors
    ///
    /// [`GameError::NoActiveWord`].
    pub fn tap(&mut self, symbol: char) -> GameResult<TapAction> {
        Ok(self.active_mut()?.answer.tap(symbol))
    }

    /// Append a symbol to the selection.
    ///
    /// # Errors
    ///
    /// [`GameError::NoActiveWord`].
    pub fn select(&mut self, symbol: char) -> GameResult<()> {
        self.active_mut()?.answer.select(symbol);
        Ok(())
    }

    /// Remove the most recent symbol.
    ///
    /// # Errors
    ///
    /// [`GameError::NoActiveWord`].
    pub fn delete_last(&mut self) -> GameResult<Option<char>> {
        Ok(self.active_mut()?.answer.delete_last())
    }

    /// Clear the selection.
    ///
    /// # Errors
    ///
    /// [`GameError::NoActiveWord`].
    pub fn reset_answer(&mut self) -> GameResult<()> {
        self.active_mut()?.answer.reset();
        Ok(())
    }

    /// Check the selection against the active word.
    ///
    /// A correct answer is recorded at most once per word. A wrong answer
    /// leaves everything, including the selection, untouched.
    ///
    /// # Errors
    ///
    /// [`GameError::NoActiveWord`].
    pub fn submit(&mut self) -> GameResult<SubmitOutcome> {
        let active = self.active.as_ref().ok_or(GameError::NoActiveWord)?;
        let WordPosition { level, index } = active.position;

        if !active.answer.is_correct() {
            let attempt = active.answer.current_text();
            tracing::debug!(%level, index, %attempt, "Incorrect answer");
            return Ok(SubmitOutcome::Incorrect { attempt });
        }

        let result = self
            .unlock
            .record_correct(&mut self.progress, &self.lexicon, level, index)?;
        Ok(SubmitOutcome::Correct {
            first_time: result.first_time,
            unlock_ready: result.unlock_ready,
        })
    }

    /// Move to the next word, completing the level after the last one.
    ///
    /// # Errors
    ///
    /// [`GameError::NoActiveWord`].
    pub fn advance(&mut self) -> GameResult<Advance> {
        let WordPosition { level, index } = self.active_mut()?.position;
        if index + 1 < self.lexicon.word_count(level) {
            return self.load_word(level, index + 1).map(Advance::NextWord);
        }

        let score = self.progress.complete_level(level);
        self.return_to_level_select();
        Ok(Advance::LevelComplete { level, score })
    }

    /// Move to the next word without scoring.
    ///
    /// # Errors
    ///
    /// [`GameError::NoActiveWord`].
    pub fn skip_word(&mut self) -> GameResult<Advance> {
        let WordPosition { level, index } = self.active_mut()?.position;
        if index + 1 < self.lexicon.word_count(level) {
            return self.load_word(level, index + 1).map(Advance::NextWord);
        }

        self.return_to_level_select();
        Ok(Advance::BackToLevelSelect { level })
    }

    /// Leave gameplay.
    pub fn return_to_level_select(&mut self) {
        self.active = None;
        self.surface = Surface::LevelSelect;
    }

    /// Unlock a level the player confirmed.
    ///
    /// # Errors
    ///
    /// [`GameError::LevelNotFound`] or [`GameError::NotUnlockable`].
    pub fn confirm_unlock(&mut self, level: LevelId) -> GameResult<()> {
        self.unlock
            .confirm_unlock(&mut self.progress, &self.lexicon, level)
    }

    /// Unlock notice to show now, if any.
    #[must_use]
    pub fn pending_notice(&self) -> Option<LevelId> {
        self.unlock.notice_for(&self.progress, self.surface)
    }

    /// Record that a notice was shown.
    pub fn acknowledge_notice(&mut self, level: LevelId) {
        self.unlock.acknowledge_notice(&mut self.progress, level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: u32) -> LevelId {
        LevelId::new(n).expect("non-zero")
    }

    fn session() -> GameSession {
        GameSession::thai().with_seed(7)
    }

    fn answer_current(session: &mut GameSession) -> SubmitOutcome {
        let word = session.current_word().expect("active word").text.clone();
        for c in word.chars() {
            session.select(c).expect("select");
        }
        session.submit().expect("submit")
    }

    #[test]
    fn test_starts_on_level_select() {
        let mut session = session();
        assert_eq!(session.surface(), Surface::LevelSelect);
        assert!(session.current_word().is_none());
        assert_eq!(session.submit().unwrap_err(), GameError::NoActiveWord);
        assert_eq!(session.tap('ก').unwrap_err(), GameError::NoActiveWord);
    }

    #[test]
    fn test_keyboard_contains_word_symbols() {
        let mut session = session();
        session.start_level(level(1)).expect("start");
        let word = session.current_word().expect("word").text.clone();
        let keyboard = session.keyboard().expect("keyboard");
        assert!(word.chars().all(|c| keyboard.contains(c)));
        assert_eq!(session.surface(), Surface::Gameplay);
    }

    #[test]
    fn test_correct_answer_scores_once() {
        let mut session = session();
        session.start_level(level(1)).expect("start");
        assert_eq!(
            answer_current(&mut session),
            SubmitOutcome::Correct {
                first_time: true,
                unlock_ready: None
            }
        );
        session.reset_answer().expect("reset");
        let repeat = answer_current(&mut session);
        assert!(repeat.is_correct());
        assert!(!repeat.changed_progress());
        assert_eq!(session.progress().answered_count(level(1)), 1);
    }

    #[test]
    fn test_incorrect_answer_changes_nothing() {
        let mut session = session();
        session.start_level(level(1)).expect("start");
        session.select('x').expect("select");
        let before = session.progress().clone();
        let outcome = session.submit().expect("submit");
        assert_eq!(
            outcome,
            SubmitOutcome::Incorrect {
                attempt: "x".to_string()
            }
        );
        assert_eq!(session.progress(), &before);
        assert_eq!(session.answer().expect("answer").current_text(), "x");
    }

    #[test]
    fn test_fifth_word_makes_level_two_unlockable() {
        let mut session = session();
        session.start_level(level(1)).expect("start");
        for i in 0..4 {
            let outcome = answer_current(&mut session);
            assert_eq!(
                outcome,
                SubmitOutcome::Correct {
                    first_time: true,
                    unlock_ready: None
                },
                "word {i}"
            );
            session.advance().expect("advance");
        }
        let outcome = answer_current(&mut session);
        assert_eq!(
            outcome,
            SubmitOutcome::Correct {
                first_time: true,
                unlock_ready: Some(level(2))
            }
        );

        // notice waits for the level-selection surface
        assert_eq!(session.pending_notice(), None);
        session.return_to_level_select();
        assert_eq!(session.pending_notice(), Some(level(2)));
        session.acknowledge_notice(level(2));
        assert_eq!(session.pending_notice(), None);

        session.confirm_unlock(level(2)).expect("unlock");
        assert_eq!(session.progress().unlocked_level(), level(2));
        assert!(session.confirm_unlock(level(3)).is_err());
    }

    #[test]
    fn test_level_completion_snapshots_score() {
        let mut session = session();
        session.start_level(level(1)).expect("start");
        answer_current(&mut session);
        for _ in 0..9 {
            assert!(matches!(
                session.advance().expect("advance"),
                Advance::NextWord(_)
            ));
        }
        assert_eq!(
            session.advance().expect("advance"),
            Advance::LevelComplete {
                level: level(1),
                score: 1
            }
        );
        assert_eq!(session.surface(), Surface::LevelSelect);
        assert!(session.progress().is_completed(level(1)));
        assert_eq!(session.progress().total_score(), 1);
    }

    #[test]
    fn test_skip_past_end_does_not_complete() {
        let mut session = session();
        session.start_level_at_word(level(1), 9).expect("start");
        assert_eq!(
            session.skip_word().expect("skip"),
            Advance::BackToLevelSelect { level: level(1) }
        );
        assert!(!session.progress().is_completed(level(1)));
        assert_eq!(session.progress().level_score(level(1)), None);
    }

    #[test]
    fn test_start_level_resumes_at_first_unanswered() {
        let mut session = session();
        session.start_level(level(1)).expect("start");
        answer_current(&mut session);
        session.advance().expect("advance");
        answer_current(&mut session);
        session.return_to_level_select();

        let pos = session.start_level(level(1)).expect("start");
        assert_eq!(pos.index, 2);
    }

    #[test]
    fn test_locked_level_rejected() {
        let mut session = session();
        let err = session.start_level(level(2)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Level 2 is locked: pass level 1 with at least 5 words first"
        );
        assert_eq!(session.surface(), Surface::LevelSelect);
        assert!(matches!(
            session.start_level_at_word(level(1), 10),
            Err(GameError::WordOutOfRange { .. })
        ));
    }

    #[test]
    fn test_load_progress_rederives_notice() {
        let lexicon = Lexicon::thai();
        let mut progress = ProgressState::new();
        for i in 0..5 {
            progress.record_correct(&lexicon, level(1), i).expect("record");
        }
        let mut session = session();
        session.load_progress(progress);
        assert_eq!(session.pending_notice(), Some(level(2)));
        assert_eq!(
            session.level_statuses()[1],
            (level(2), LevelStatus::Unlockable)
        );
    }

    #[test]
    fn test_audio_ref() {
        let mut session = session();
        session.start_level(level(1)).expect("start");
        let audio = session.current_audio_ref().expect("audio");
        let word = session.current_word().expect("word");
        assert!(audio.ends_with(&format!("{}.mp3", word.text)));
    }
}
