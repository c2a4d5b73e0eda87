//! Level unlock state machine.
//!
//! Relative to the unlock frontier `U`:
//!
//! ```text
//!   L <= U                                    Playable
//!   L == U+1 and U answered >= threshold      Unlockable ──confirm──► Playable (U = L)
//!   otherwise                                 Locked
//! ```
//!
//! Crossing the threshold in level `U` raises a one-shot notice for `U+1`
//! that is shown only on the level-selection surface and never again once
//! acknowledged.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_UNLOCK_THRESHOLD;
use crate::error::{GameError, GameResult};
use crate::lexicon::{LevelId, Lexicon};
use crate::progress::ProgressState;

/// Where the player is, for notice gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Level-selection screen.
    LevelSelect,
    /// Playing a word.
    Gameplay,
}

/// Availability of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    /// Beyond reach.
    Locked,
    /// May be unlocked by confirmation.
    Unlockable,
    /// Can be played.
    Playable,
}

/// Result of recording a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectAnswer {
    /// Whether this index was answered for the first time.
    pub first_time: bool,
    /// Level that just became unlockable, if this answer crossed the threshold.
    pub unlock_ready: Option<LevelId>,
}

/// Applies unlock rules to a [`ProgressState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockController {
    threshold: usize,
}

impl Default for UnlockController {
    fn default() -> Self {
        Self::new(DEFAULT_UNLOCK_THRESHOLD)
    }
}

impl UnlockController {
    /// Create a controller with an unlock threshold.
    #[must_use]
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Answered words needed in the frontier level.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Status of one level.
    #[must_use]
    pub fn status(&self, state: &ProgressState, level: LevelId) -> LevelStatus {
        let unlocked = state.unlocked_level;
        if level <= unlocked {
            LevelStatus::Playable
        } else if level == unlocked.next() && state.unlock_eligible.contains(&unlocked) {
            LevelStatus::Unlockable
        } else {
            LevelStatus::Locked
        }
    }

    /// Status of every level in the lexicon.
    #[must_use]
    pub fn statuses(&self, state: &ProgressState, lexicon: &Lexicon) -> Vec<(LevelId, LevelStatus)> {
        lexicon
            .levels()
            .map(|def| (def.id, self.status(state, def.id)))
            .collect()
    }

    /// Check that a level may be entered.
    ///
    /// # Errors
    ///
    /// [`GameError::LevelNotFound`] for unknown levels, [`GameError::LevelLocked`]
    /// for levels above the frontier.
    pub fn ensure_playable(
        &self,
        state: &ProgressState,
        lexicon: &Lexicon,
        level: LevelId,
    ) -> GameResult<()> {
        lexicon.get_level(level)?;
        if state.is_unlocked(level) {
            Ok(())
        } else {
            Err(GameError::LevelLocked {
                level,
                unlocked: state.unlocked_level,
                threshold: self.threshold,
            })
        }
    }

    /// Record a correct answer and apply the threshold-crossing rule.
    ///
    /// # Errors
    ///
    /// Rejects unknown levels, out-of-range indices and locked levels without
    /// changing state.
    pub fn record_correct(
        &self,
        state: &mut ProgressState,
        lexicon: &Lexicon,
        level: LevelId,
        index: usize,
    ) -> GameResult<CorrectAnswer> {
        self.ensure_playable(state, lexicon, level)?;
        let before = state.answered_count(level);
        let first_time = state.record_correct(lexicon, level, index)?;
        let after = state.answered_count(level);

        let unlock_ready = self.on_count_changed(state, lexicon, level, before, after);
        Ok(CorrectAnswer {
            first_time,
            unlock_ready,
        })
    }

    fn on_count_changed(
        &self,
        state: &mut ProgressState,
        lexicon: &Lexicon,
        level: LevelId,
        before: usize,
        after: usize,
    ) -> Option<LevelId> {
        let crossed = before < self.threshold && after >= self.threshold;
        if !crossed || level != state.unlocked_level || level >= lexicon.max_level() {
            return None;
        }

        let next = level.next();
        state.unlock_eligible.insert(level);
        if !state.acknowledged_notices.contains(&next) {
            state.pending_unlock_notice = Some(next);
        }
        tracing::info!(%level, %next, answered = after, "Next level is now unlockable");
        Some(next)
    }

    /// Unlock a level the player has confirmed.
    ///
    /// # Errors
    ///
    /// [`GameError::LevelNotFound`] for unknown levels and
    /// [`GameError::NotUnlockable`] unless the level is exactly one past the
    /// frontier and eligible.
    pub fn confirm_unlock(
        &self,
        state: &mut ProgressState,
        lexicon: &Lexicon,
        level: LevelId,
    ) -> GameResult<()> {
        lexicon.get_level(level)?;
        let unlocked = state.unlocked_level;

        if level != unlocked.next() {
            return Err(GameError::NotUnlockable {
                level,
                reason: format!("only level {} can be unlocked next", unlocked.next()),
            });
        }
        if !state.unlock_eligible.contains(&unlocked) {
            return Err(GameError::NotUnlockable {
                level,
                reason: format!(
                    "answer at least {} words in level {unlocked} first",
                    self.threshold
                ),
            });
        }

        state.unlocked_level = level;
        state.unlock_eligible.remove(&unlocked);
        if state.pending_unlock_notice == Some(level) {
            state.pending_unlock_notice = None;
            state.acknowledged_notices.insert(level);
        }
        tracing::info!(%level, "Level unlocked");
        Ok(())
    }

    /// Recompute transient unlock bookkeeping after loading persisted state.
    pub fn rederive(&self, state: &mut ProgressState, lexicon: &Lexicon) {
        state.unlock_eligible.clear();
        state.pending_unlock_notice = None;

        let unlocked = state.unlocked_level;
        if unlocked < lexicon.max_level() && state.answered_count(unlocked) >= self.threshold {
            let next = unlocked.next();
            state.unlock_eligible.insert(unlocked);
            if !state.acknowledged_notices.contains(&next) {
                state.pending_unlock_notice = Some(next);
            }
            tracing::debug!(%unlocked, %next, "Restored unlock eligibility");
        }
    }

    /// Notice to display on this surface, if any. Does not consume it.
    #[must_use]
    pub fn notice_for(&self, state: &ProgressState, surface: Surface) -> Option<LevelId> {
        match (surface, state.pending_unlock_notice) {
            (Surface::LevelSelect, Some(level)) if !state.acknowledged_notices.contains(&level) => {
                Some(level)
            }
            _ => None,
        }
    }

    /// Mark a notice as shown so it never reappears.
    pub fn acknowledge_notice(&self, state: &mut ProgressState, level: LevelId) {
        state.acknowledged_notices.insert(level);
        if state.pending_unlock_notice == Some(level) {
            state.pending_unlock_notice = None;
        }
    }
}
