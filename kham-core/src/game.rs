//! Async driver tying a [`GameSession`] to [`ProgressSync`].
//!
//! Every action that changes progress is followed by an awaited save of the
//! full state. Wrong answers are shown for the configured delay and then
//! cleared.

use crate::error::GameResult;
use crate::gateway::GatewayError;
use crate::lexicon::LevelId;
use crate::session::{Advance, GameSession, SubmitOutcome, WordPosition};
use crate::sync::{ProgressSync, SaveOutcome};

/// A player's game with persistence.
#[derive(Debug)]
pub struct Game {
    session: GameSession,
    sync: ProgressSync,
    last_save: Option<SaveOutcome>,
}

impl Game {
    /// Wrap a session without loading anything.
    #[must_use]
    pub const fn new(session: GameSession, sync: ProgressSync) -> Self {
        Self {
            session,
            sync,
            last_save: None,
        }
    }

    /// Load stored progress into the session and wrap it.
    ///
    /// # Errors
    ///
    /// Non-recoverable gateway errors such as [`GatewayError::Auth`].
    pub async fn load(mut session: GameSession, sync: ProgressSync) -> Result<Self, GatewayError> {
        let progress = sync.load().await?;
        session.load_progress(progress);
        Ok(Self::new(session, sync))
    }

    /// The session.
    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    /// Mutable session access for selection edits.
    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    /// The writer.
    #[must_use]
    pub const fn sync(&self) -> &ProgressSync {
        &self.sync
    }

    /// Outcome of the most recent save.
    #[must_use]
    pub const fn last_save(&self) -> Option<&SaveOutcome> {
        self.last_save.as_ref()
    }

    async fn persist(&mut self) -> &SaveOutcome {
        let outcome = self.sync.save(self.session.progress().clone()).await;
        self.last_save.insert(outcome)
    }

    /// Start a level at its first unanswered word.
    ///
    /// # Errors
    ///
    /// See [`GameSession::start_level`].
    pub fn start_level(&mut self, level: LevelId) -> GameResult<WordPosition> {
        self.session.start_level(level)
    }

    /// Start a level at a chosen word.
    ///
    /// # Errors
    ///
    /// See [`GameSession::start_level_at_word`].
    pub fn start_level_at_word(&mut self, level: LevelId, index: usize) -> GameResult<WordPosition> {
        self.session.start_level_at_word(level, index)
    }

    /// Submit the selection.
    ///
    /// A first-time correct answer is saved. A wrong answer stays visible for
    /// the wrong-answer delay and the selection is then cleared.
    ///
    /// # Errors
    ///
    /// See [`GameSession::submit`].
    pub async fn submit(&mut self) -> GameResult<SubmitOutcome> {
        let outcome = self.session.submit()?;
        match &outcome {
            SubmitOutcome::Correct { .. } if outcome.changed_progress() => {
                self.persist().await;
            }
            SubmitOutcome::Correct { .. } => {}
            SubmitOutcome::Incorrect { .. } => {
                tokio::time::sleep(self.session.config().wrong_answer_delay()).await;
                self.session.reset_answer()?;
            }
        }
        Ok(outcome)
    }

    /// Move on after a correct answer once the celebration delay has passed.
    ///
    /// # Errors
    ///
    /// See [`Game::advance`].
    pub async fn advance_after_delay(&mut self) -> GameResult<Advance> {
        tokio::time::sleep(self.session.config().correct_advance_delay()).await;
        self.advance().await
    }

    /// Move to the next word; completing a level is saved.
    ///
    /// # Errors
    ///
    /// See [`GameSession::advance`].
    pub async fn advance(&mut self) -> GameResult<Advance> {
        let advance = self.session.advance()?;
        if matches!(advance, Advance::LevelComplete { .. }) {
            self.persist().await;
        }
        Ok(advance)
    }

    /// Skip the current word without scoring.
    ///
    /// # Errors
    ///
    /// See [`GameSession::skip_word`].
    pub fn skip_word(&mut self) -> GameResult<Advance> {
        self.session.skip_word()
    }

    /// Unlock a level and save.
    ///
    /// # Errors
    ///
    /// See [`GameSession::confirm_unlock`].
    pub async fn confirm_unlock(&mut self, level: LevelId) -> GameResult<()> {
        self.session.confirm_unlock(level)?;
        self.persist().await;
        Ok(())
    }

    /// Mark a notice as shown and save.
    pub async fn acknowledge_notice(&mut self, level: LevelId) {
        self.session.acknowledge_notice(level);
        self.persist().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::config::GameConfig;
    use crate::gateway::{MemoryGateway, SyncGateway};
    use crate::lexicon::Lexicon;
    use crate::unlock::Surface;
    use std::sync::Arc;
    use std::time::Duration;

    fn level(n: u32) -> LevelId {
        LevelId::new(n).expect("non-zero")
    }

    fn setup(config: GameConfig) -> (Game, MemoryGateway) {
        let lexicon = Arc::new(Lexicon::thai());
        let gateway = MemoryGateway::new(Arc::clone(&lexicon));
        let session = GameSession::new(lexicon, Alphabet::thai(), config).with_seed(1);
        let sync = ProgressSync::new(Arc::new(gateway.clone()), "player");
        (Game::new(session, sync), gateway)
    }

    fn spell_current(game: &mut Game) {
        let word = game
            .session()
            .current_word()
            .expect("active word")
            .text
            .clone();
        for c in word.chars() {
            game.session_mut().select(c).expect("select");
        }
    }

    #[tokio::test]
    async fn test_first_correct_answer_is_saved() {
        let (mut game, gateway) = setup(GameConfig::without_delays());
        game.start_level(level(1)).expect("start");
        spell_current(&mut game);
        assert!(game.submit().await.expect("submit").is_correct());
        assert_eq!(gateway.save_count(), 1);
        assert_eq!(game.last_save(), Some(&SaveOutcome::Saved));

        // repeat answers do not write
        game.session_mut().reset_answer().expect("reset");
        spell_current(&mut game);
        game.submit().await.expect("submit");
        assert_eq!(gateway.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_answer_clears_after_delay() {
        let (mut game, gateway) = setup(GameConfig::default());
        game.start_level(level(1)).expect("start");
        game.session_mut().select('x').expect("select");

        let started = tokio::time::Instant::now();
        let outcome = game.submit().await.expect("submit");
        assert!(!outcome.is_correct());
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(game.session().answer().expect("answer").is_empty());
        assert_eq!(gateway.save_count(), 0);
    }

    #[tokio::test]
    async fn test_unlock_flow_persists_and_reloads() {
        let (mut game, gateway) = setup(GameConfig::without_delays());
        game.start_level(level(1)).expect("start");
        for _ in 0..5 {
            spell_current(&mut game);
            game.submit().await.expect("submit");
            game.advance_after_delay().await.expect("advance");
        }
        game.session_mut().return_to_level_select();
        assert_eq!(game.session().pending_notice(), Some(level(2)));
        game.acknowledge_notice(level(2)).await;
        game.confirm_unlock(level(2)).await.expect("unlock");

        let reloaded = Game::load(
            GameSession::thai(),
            ProgressSync::new(Arc::new(gateway.clone()), "player"),
        )
        .await
        .expect("load");
        let progress = reloaded.session().progress();
        assert_eq!(progress.unlocked_level(), level(2));
        assert_eq!(progress.answered_count(level(1)), 5);
        assert!(progress.acknowledged_notices().contains(&level(2)));
        assert_eq!(reloaded.session().pending_notice(), None);
        assert_eq!(reloaded.session().surface(), Surface::LevelSelect);
    }

    #[tokio::test]
    async fn test_level_completion_saves_score() {
        let (mut game, gateway) = setup(GameConfig::without_delays());
        game.start_level_at_word(level(1), 9).expect("start");
        spell_current(&mut game);
        game.submit().await.expect("submit");
        let advance = game.advance().await.expect("advance");
        assert_eq!(
            advance,
            Advance::LevelComplete {
                level: level(1),
                score: 1
            }
        );
        let stored = gateway.load_progress("player").await.expect("load");
        assert_eq!(stored.level_score(level(1)), Some(1));
    }

    #[tokio::test]
    async fn test_offline_game_keeps_playing() {
        let (mut game, gateway) = setup(GameConfig::without_delays());
        gateway.set_offline(true);
        game.start_level(level(1)).expect("start");
        spell_current(&mut game);
        game.submit().await.expect("submit");
        assert!(matches!(game.last_save(), Some(SaveOutcome::Failed(_))));
        assert_eq!(game.session().progress().answered_count(level(1)), 1);
    }
}
