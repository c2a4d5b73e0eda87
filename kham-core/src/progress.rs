//! Per-player progress: answered words, level scores and the unlock frontier.
//!
//! [`ProgressState`] is the in-memory model. Level keys are [`LevelId`]s and
//! answered words are word indices; the string-keyed wire shape lives in
//! [`crate::schema`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::GameResult;
use crate::lexicon::{LevelId, Lexicon};

/// Progress of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub(crate) answered_words: BTreeMap<LevelId, BTreeSet<usize>>,
    pub(crate) level_scores: BTreeMap<LevelId, u32>,
    pub(crate) unlocked_level: LevelId,
    pub(crate) unlock_eligible: BTreeSet<LevelId>,
    pub(crate) pending_unlock_notice: Option<LevelId>,
    pub(crate) acknowledged_notices: BTreeSet<LevelId>,
    pub(crate) current_level: LevelId,
    pub(crate) completed_levels: BTreeSet<LevelId>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            answered_words: BTreeMap::new(),
            level_scores: BTreeMap::new(),
            unlocked_level: LevelId::FIRST,
            unlock_eligible: BTreeSet::new(),
            pending_unlock_notice: None,
            acknowledged_notices: BTreeSet::new(),
            current_level: LevelId::FIRST,
            completed_levels: BTreeSet::new(),
        }
    }
}

impl ProgressState {
    /// Fresh progress: level 1 unlocked, nothing answered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest unlocked level.
    #[must_use]
    pub const fn unlocked_level(&self) -> LevelId {
        self.unlocked_level
    }

    /// Last level the player entered.
    #[must_use]
    pub const fn current_level(&self) -> LevelId {
        self.current_level
    }

    pub(crate) fn set_current_level(&mut self, level: LevelId) {
        self.current_level = level;
    }

    /// Whether a level is at or below the unlock frontier.
    #[must_use]
    pub fn is_unlocked(&self, level: LevelId) -> bool {
        level <= self.unlocked_level
    }

    /// Answered word indices of a level, ascending.
    pub fn answered(&self, level: LevelId) -> impl Iterator<Item = usize> + '_ {
        self.answered_words
            .get(&level)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of distinct words answered in a level.
    #[must_use]
    pub fn answered_count(&self, level: LevelId) -> usize {
        self.answered_words.get(&level).map_or(0, BTreeSet::len)
    }

    /// Whether a word has been answered correctly before.
    #[must_use]
    pub fn is_answered(&self, level: LevelId, index: usize) -> bool {
        self.answered_words
            .get(&level)
            .is_some_and(|set| set.contains(&index))
    }

    /// Record a correct answer. Returns `true` the first time an index is recorded.
    ///
    /// Does not check the unlock frontier; see
    /// [`crate::unlock::UnlockController::record_correct`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::GameError::LevelNotFound`] or
    /// [`crate::GameError::WordOutOfRange`] without changing state.
    pub fn record_correct(
        &mut self,
        lexicon: &Lexicon,
        level: LevelId,
        index: usize,
    ) -> GameResult<bool> {
        lexicon.get_word(level, index)?;
        let inserted = self.answered_words.entry(level).or_default().insert(index);
        if inserted {
            tracing::debug!(%level, index, "Recorded first correct answer");
        }
        Ok(inserted)
    }

    /// First unanswered word of a level, or 0 when every word is answered.
    #[must_use]
    pub fn first_unanswered(&self, lexicon: &Lexicon, level: LevelId) -> usize {
        (0..lexicon.word_count(level))
            .find(|&i| !self.is_answered(level, i))
            .unwrap_or(0)
    }

    /// Snapshot the level's answered count into its score and mark it completed.
    pub fn complete_level(&mut self, level: LevelId) -> u32 {
        let score = u32::try_from(self.answered_count(level)).unwrap_or(u32::MAX);
        self.level_scores.insert(level, score);
        self.completed_levels.insert(level);
        tracing::info!(%level, score, "Level completed");
        score
    }

    /// Score recorded at the level's last completion.
    #[must_use]
    pub fn level_score(&self, level: LevelId) -> Option<u32> {
        self.level_scores.get(&level).copied()
    }

    /// All level scores.
    #[must_use]
    pub const fn level_scores(&self) -> &BTreeMap<LevelId, u32> {
        &self.level_scores
    }

    /// Whether a level has been played through to the end.
    #[must_use]
    pub fn is_completed(&self, level: LevelId) -> bool {
        self.completed_levels.contains(&level)
    }

    /// Sum of level scores, saturating.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.level_scores
            .values()
            .fold(0, |total, score| total.saturating_add(*score))
    }

    /// Levels whose successor may be unlocked now.
    #[must_use]
    pub const fn unlock_eligible(&self) -> &BTreeSet<LevelId> {
        &self.unlock_eligible
    }

    /// Unlock notice waiting to be shown.
    #[must_use]
    pub const fn pending_unlock_notice(&self) -> Option<LevelId> {
        self.pending_unlock_notice
    }

    /// Levels whose unlock notice has already been shown.
    #[must_use]
    pub const fn acknowledged_notices(&self) -> &BTreeSet<LevelId> {
        &self.acknowledged_notices
    }

    /// Fold a newer snapshot into this one without losing progress.
    ///
    /// The unlock frontier takes the maximum, answered sets and the completed
    /// and acknowledged sets are unioned, level scores are replaced per level
    /// and the current level follows `newer`.
    pub fn merge_from(&mut self, newer: &Self) {
        self.unlocked_level = self.unlocked_level.max(newer.unlocked_level);
        for (level, indices) in &newer.answered_words {
            self.answered_words
                .entry(*level)
                .or_default()
                .extend(indices.iter().copied());
        }
        self.level_scores
            .extend(newer.level_scores.iter().map(|(l, s)| (*l, *s)));
        self.completed_levels
            .extend(newer.completed_levels.iter().copied());
        self.acknowledged_notices
            .extend(newer.acknowledged_notices.iter().copied());
        self.current_level = newer.current_level;
    }

    /// Aggregate figures over the unlocked levels.
    #[must_use]
    pub fn summary(&self, lexicon: &Lexicon) -> ProgressSummary {
        let unlocked = self.unlocked_level.min(lexicon.max_level());
        let (answered, possible) = lexicon
            .levels()
            .filter(|def| def.id <= unlocked)
            .fold((0usize, 0usize), |(a, p), def| {
                (a + self.answered_count(def.id), p + def.word_count())
            });

        let percentage = if possible == 0 {
            0
        } else {
            u32::try_from((answered * 100 + possible / 2) / possible).unwrap_or(100)
        };

        ProgressSummary {
            answered,
            possible,
            percentage,
            unlocked_level: unlocked,
            max_level: lexicon.max_level(),
            grade: Grade::from_progress(answered, percentage),
            total_score: self.total_score(),
        }
    }
}

/// Overall standing shown on the level-selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// At least 80% of unlocked words answered.
    Excellent,
    /// At least 50%.
    Good,
    /// Something answered.
    NeedsPractice,
    /// Nothing answered yet.
    NotStarted,
}

impl Grade {
    /// Grade for an answered count and rounded percentage.
    #[must_use]
    pub const fn from_progress(answered: usize, percentage: u32) -> Self {
        if percentage >= 80 {
            Self::Excellent
        } else if percentage >= 50 {
            Self::Good
        } else if answered > 0 {
            Self::NeedsPractice
        } else {
            Self::NotStarted
        }
    }
}

/// Progress figures across unlocked levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Distinct words answered.
    pub answered: usize,
    /// Words available in unlocked levels.
    pub possible: usize,
    /// Rounded `answered / possible` percentage.
    pub percentage: u32,
    /// Highest unlocked level.
    pub unlocked_level: LevelId,
    /// Highest level in the lexicon.
    pub max_level: LevelId,
    /// Standing.
    pub grade: Grade,
    /// Sum of level scores.
    pub total_score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;

    fn level(n: u32) -> LevelId {
        LevelId::new(n).expect("non-zero")
    }

    #[test]
    fn test_defaults() {
        let state = ProgressState::new();
        assert_eq!(state.unlocked_level(), LevelId::FIRST);
        assert_eq!(state.current_level(), LevelId::FIRST);
        assert_eq!(state.total_score(), 0);
        assert_eq!(state.answered_count(LevelId::FIRST), 0);
    }

    #[test]
    fn test_record_correct_first_time_only() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        assert!(state.record_correct(&lexicon, level(1), 3).expect("record"));
        assert!(!state.record_correct(&lexicon, level(1), 3).expect("record"));
        assert_eq!(state.answered_count(level(1)), 1);
        assert_eq!(state.answered(level(1)).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_record_correct_rejects_bad_indices() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        let err = state.record_correct(&lexicon, level(1), 10).unwrap_err();
        assert!(matches!(err, GameError::WordOutOfRange { index: 10, .. }));
        let err = state.record_correct(&lexicon, level(11), 0).unwrap_err();
        assert_eq!(err, GameError::LevelNotFound(level(11)));
        assert_eq!(state, ProgressState::new());
    }

    #[test]
    fn test_first_unanswered() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        assert_eq!(state.first_unanswered(&lexicon, level(1)), 0);
        for i in [0, 1, 3] {
            state.record_correct(&lexicon, level(1), i).expect("record");
        }
        assert_eq!(state.first_unanswered(&lexicon, level(1)), 2);
        for i in 0..10 {
            state.record_correct(&lexicon, level(1), i).expect("record");
        }
        assert_eq!(state.first_unanswered(&lexicon, level(1)), 0);
    }

    #[test]
    fn test_complete_level_snapshots_score() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        for i in 0..4 {
            state.record_correct(&lexicon, level(1), i).expect("record");
        }
        assert_eq!(state.complete_level(level(1)), 4);
        assert_eq!(state.level_score(level(1)), Some(4));
        assert!(state.is_completed(level(1)));

        state.record_correct(&lexicon, level(1), 9).expect("record");
        // score is a snapshot, not live
        assert_eq!(state.level_score(level(1)), Some(4));
        assert_eq!(state.total_score(), 4);
    }

    #[test]
    fn test_summary_and_grades() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        let summary = state.summary(&lexicon);
        assert_eq!(summary.grade, Grade::NotStarted);
        assert_eq!(summary.possible, 10);

        state.record_correct(&lexicon, level(1), 0).expect("record");
        assert_eq!(state.summary(&lexicon).grade, Grade::NeedsPractice);

        for i in 0..5 {
            state.record_correct(&lexicon, level(1), i).expect("record");
        }
        let summary = state.summary(&lexicon);
        assert_eq!(summary.percentage, 50);
        assert_eq!(summary.grade, Grade::Good);

        for i in 0..8 {
            state.record_correct(&lexicon, level(1), i).expect("record");
        }
        assert_eq!(state.summary(&lexicon).grade, Grade::Excellent);
    }

    #[test]
    fn test_summary_counts_only_unlocked_levels() {
        let lexicon = Lexicon::thai();
        let mut state = ProgressState::new();
        state.unlocked_level = level(2);
        for i in 0..10 {
            state.record_correct(&lexicon, level(1), i).expect("record");
        }
        let summary = state.summary(&lexicon);
        assert_eq!(summary.answered, 10);
        assert_eq!(summary.possible, 20);
        assert_eq!(summary.percentage, 50);
        assert_eq!(summary.max_level, level(10));
    }

    #[test]
    fn test_merge_never_loses_progress() {
        let lexicon = Lexicon::thai();
        let mut stored = ProgressState::new();
        stored.unlocked_level = level(3);
        stored.record_correct(&lexicon, level(1), 0).expect("record");
        stored.level_scores.insert(level(1), 1);

        let mut stale = ProgressState::new();
        stale.record_correct(&lexicon, level(1), 5).expect("record");
        stale.level_scores.insert(level(1), 7);
        stale.current_level = level(1);

        stored.merge_from(&stale);
        assert_eq!(stored.unlocked_level(), level(3));
        assert_eq!(stored.answered(level(1)).collect::<Vec<_>>(), vec![0, 5]);
        assert_eq!(stored.level_score(level(1)), Some(7));
    }

    #[test]
    fn test_total_score_saturates() {
        let mut state = ProgressState::new();
        state.level_scores.insert(level(1), u32::MAX);
        state.level_scores.insert(level(2), 1);
        assert_eq!(state.total_score(), u32::MAX);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_progress(8, 80), Grade::Excellent);
        assert_eq!(Grade::from_progress(7, 79), Grade::Good);
        assert_eq!(Grade::from_progress(1, 49), Grade::NeedsPractice);
        assert_eq!(Grade::from_progress(0, 0), Grade::NotStarted);
    }
}
