use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use hangman_core::{
    HistoryRepository, NewGameRecord, PlayerDirectory, Session, SessionRepository, WordStore,
    parse_guess_letter,
};

type PlayerLocks = DashMap<PlayerId, Arc<Mutex<()>>>;
use hangman_types::{ErrorKind, GameRecord, GameView, PlayerId};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("No words available to start a game")]
    NoWordsAvailable,
    #[error("Player {0} has no game in progress")]
    NoActiveSession(PlayerId),
    #[error("Invalid letter {0:?}: a guess must be a single letter")]
    InvalidLetter(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::PlayerNotFound(_) => ErrorKind::PlayerNotFound,
            SessionError::NoWordsAvailable => ErrorKind::NoWordsAvailable,
            SessionError::NoActiveSession(_) => ErrorKind::NoActiveSession,
            SessionError::InvalidLetter(_) => ErrorKind::InvalidInput,
            SessionError::Storage(_) => ErrorKind::InternalError,
        }
    }
}

/// Storage collaborators the session manager drives
#[derive(Clone)]
pub struct SessionStores {
    pub players: Arc<dyn PlayerDirectory>,
    pub words: Arc<dyn WordStore>,
    pub sessions: Arc<dyn SessionRepository>,
    pub history: Arc<dyn HistoryRepository>,
}

impl SessionStores {
    /// Use one value for every collaborator
    pub fn from_single<S>(store: Arc<S>) -> Self
    where
        S: PlayerDirectory + WordStore + SessionRepository + HistoryRepository + 'static,
    {
        Self {
            players: store.clone(),
            words: store.clone(),
            sessions: store.clone(),
            history: store,
        }
    }
}

/// Holds a player's lock; the map entry is dropped once nobody else
/// holds or waits on it
struct PlayerGuard<'a> {
    locks: &'a PlayerLocks,
    player_id: PlayerId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PlayerGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.player_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct SessionManager {
    stores: SessionStores,
    player_locks: PlayerLocks,
}

impl SessionManager {
    pub fn new(stores: SessionStores) -> Self {
        Self {
            stores,
            player_locks: DashMap::new(),
        }
    }

    /// Serialize read-modify-write sequences for one player.
    /// Players never share a lock, so they proceed in parallel.
    async fn lock_player(&self, player_id: PlayerId) -> PlayerGuard<'_> {
        let lock = self.player_locks.entry(player_id).or_default().clone();
        PlayerGuard {
            locks: &self.player_locks,
            player_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    async fn ensure_player(&self, player_id: PlayerId) -> Result<(), SessionError> {
        if !self.stores.players.exists(player_id).await? {
            return Err(SessionError::PlayerNotFound(player_id));
        }
        Ok(())
    }

    /// Start a game for the player, or resume the one already in progress.
    pub async fn start_session(&self, player_id: PlayerId) -> Result<GameView, SessionError> {
        self.ensure_player(player_id).await?;
        let _guard = self.lock_player(player_id).await;

        if let Some(existing) = self.stores.sessions.find_active_by_player(player_id).await? {
            debug!("Resuming session for player {}", player_id);
            return Ok(existing.view());
        }

        let session = loop {
            let word = self
                .stores
                .words
                .fetch_unused_word()
                .await?
                .ok_or(SessionError::NoWordsAvailable)?;

            let session = Session::start(player_id, &word);
            if self.stores.sessions.begin_session(&session).await? {
                break session;
            }
            warn!("Word {} was claimed concurrently, drawing again", word.id);
        };

        info!(
            "Started session for player {} with a {} character word",
            player_id,
            session.state.word.chars().count()
        );
        Ok(session.view())
    }

    /// Apply a guessed letter to the player's session.
    ///
    /// Repeating a letter returns the current projection without writing
    /// anything. A winning or losing guess records the game in history and
    /// ends the session in one atomic write; if that write fails the session
    /// stays as it was before the guess.
    pub async fn guess(&self, player_id: PlayerId, letter: &str) -> Result<GameView, SessionError> {
        self.ensure_player(player_id).await?;
        let letter =
            parse_guess_letter(letter).ok_or_else(|| SessionError::InvalidLetter(letter.to_string()))?;

        let _guard = self.lock_player(player_id).await;

        let session = self
            .stores
            .sessions
            .find_active_by_player(player_id)
            .await?
            .ok_or(SessionError::NoActiveSession(player_id))?;

        if session.status().is_terminal() {
            warn!("Player {} has a finished session still stored", player_id);
            return Err(SessionError::NoActiveSession(player_id));
        }

        let outcome = session.state.apply_guess(letter);
        if !outcome.changed {
            debug!("Player {} repeated letter {}", player_id, outcome.letter);
            return Ok(session.view());
        }

        debug!(
            "Player {} guessed {} ({}), {} attempts left",
            player_id,
            outcome.letter,
            if outcome.correct { "hit" } else { "miss" },
            outcome.state.remaining_attempts
        );

        let updated = session.with_state(outcome.state);
        let view = updated.view();

        match updated.status().outcome() {
            None => {
                self.stores.sessions.save(&updated).await?;
            }
            Some(game_outcome) => {
                let record = NewGameRecord {
                    player_id,
                    word_id: updated.word_id,
                    outcome: game_outcome,
                    score: view.score,
                    completed_at: Utc::now(),
                };
                self.stores.sessions.finish_session(&updated, record).await?;

                info!(
                    "Player {} finished a game: {} with {} points",
                    player_id, game_outcome, view.score
                );
            }
        }

        Ok(view)
    }

    /// Every finished game, newest first
    pub async fn list_games(&self) -> Result<Vec<GameRecord>, SessionError> {
        Ok(self.stores.history.find_all().await?)
    }

    pub async fn list_games_for_player(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<GameRecord>, SessionError> {
        Ok(self.stores.history.find_by_player(player_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hangman_core::{GuessState, InMemoryStore, MAX_ATTEMPTS};
    use hangman_types::GameOutcome;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    /// Session storage whose next `finish_session` can be made to fail
    struct FailingFinish {
        inner: Arc<InMemoryStore>,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl SessionRepository for FailingFinish {
        async fn find_active_by_player(
            &self,
            player_id: PlayerId,
        ) -> anyhow::Result<Option<Session>> {
            self.inner.find_active_by_player(player_id).await
        }

        async fn save(&self, session: &Session) -> anyhow::Result<()> {
            SessionRepository::save(self.inner.as_ref(), session).await
        }

        async fn begin_session(&self, session: &Session) -> anyhow::Result<bool> {
            self.inner.begin_session(session).await
        }

        async fn finish_session(
            &self,
            session: &Session,
            record: NewGameRecord,
        ) -> anyhow::Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                anyhow::bail!("database is locked");
            }
            self.inner.finish_session(session, record).await
        }
    }

    fn setup(words: &[&str]) -> (Arc<InMemoryStore>, SessionManager, PlayerId) {
        let store = Arc::new(InMemoryStore::new());
        store.add_words(words).unwrap();
        let player = store.add_player("Ada").unwrap();
        let manager = SessionManager::new(SessionStores::from_single(store.clone()));
        (store, manager, player.id)
    }

    #[tokio::test]
    async fn test_start_session_projection() {
        let (store, manager, player_id) = setup(&["cat"]);

        let view = manager.start_session(player_id).await.unwrap();
        assert_eq!(view.masked_word, "___");
        assert!(view.guessed_letters.is_empty());
        assert_eq!(view.remaining_attempts, MAX_ATTEMPTS);
        assert!(!view.is_complete);
        assert_eq!(view.score, 0);
        assert_eq!(store.unused_word_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_resumes_without_consuming() {
        let (store, manager, player_id) = setup(&["cat", "dog"]);

        let first = manager.start_session(player_id).await.unwrap();
        manager.guess(player_id, "a").await.unwrap();
        let in_progress = manager.guess(player_id, "z").await.unwrap();

        let resumed = manager.start_session(player_id).await.unwrap();
        assert_eq!(resumed, in_progress);
        assert_ne!(resumed, first);
        assert_eq!(store.unused_word_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_player() {
        let (_store, manager, _) = setup(&["cat"]);
        let stranger = Uuid::new_v4();

        assert!(matches!(
            manager.start_session(stranger).await,
            Err(SessionError::PlayerNotFound(id)) if id == stranger
        ));
        assert!(matches!(
            manager.guess(stranger, "a").await,
            Err(SessionError::PlayerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_no_words_available() {
        let (_store, manager, player_id) = setup(&[]);
        let err = manager.start_session(player_id).await.unwrap_err();
        assert!(matches!(err, SessionError::NoWordsAvailable));
        assert_eq!(err.kind(), ErrorKind::NoWordsAvailable);
    }

    #[tokio::test]
    async fn test_guess_without_session() {
        let (_store, manager, player_id) = setup(&["cat"]);
        let err = manager.guess(player_id, "a").await.unwrap_err();
        assert!(matches!(err, SessionError::NoActiveSession(_)));
        assert_eq!(err.kind(), ErrorKind::NoActiveSession);
    }

    #[tokio::test]
    async fn test_invalid_letters_rejected() {
        let (_store, manager, player_id) = setup(&["cat"]);
        manager.start_session(player_id).await.unwrap();

        for input in ["", "ab", "7", "?", " "] {
            let err = manager.guess(player_id, input).await.unwrap_err();
            assert!(matches!(err, SessionError::InvalidLetter(_)), "{:?}", input);
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        // Nothing was spent on invalid input
        let view = manager.start_session(player_id).await.unwrap();
        assert_eq!(view.remaining_attempts, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_repeat_guess_does_not_write() {
        let (store, manager, player_id) = setup(&["cat"]);
        manager.start_session(player_id).await.unwrap();

        let first = manager.guess(player_id, "c").await.unwrap();
        let writes = store.session_writes();

        let second = manager.guess(player_id, "C").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.session_writes(), writes);
    }

    #[tokio::test]
    async fn test_win_records_history_and_ends_session() {
        let (store, manager, player_id) = setup(&["cat"]);
        manager.start_session(player_id).await.unwrap();

        let mut view = manager.guess(player_id, "g").await.unwrap();
        assert_eq!(view.remaining_attempts, 6);
        for letter in ["c", "a", "t"] {
            view = manager.guess(player_id, letter).await.unwrap();
        }

        assert_eq!(view.masked_word, "CAT");
        assert!(view.is_complete);
        assert_eq!(view.score, 20);
        assert_eq!(view.remaining_attempts, 6);

        assert!(store.find_active_by_player(player_id).await.unwrap().is_none());
        assert!(matches!(
            manager.guess(player_id, "x").await,
            Err(SessionError::NoActiveSession(_))
        ));

        let history = manager.list_games_for_player(player_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, GameOutcome::Won);
        assert_eq!(history[0].score, 20);
        assert_eq!(history[0].word, "cat");
        assert_eq!(history[0].player_name, "Ada");
    }

    #[tokio::test]
    async fn test_loss_records_history() {
        let (_store, manager, player_id) = setup(&["dog"]);
        manager.start_session(player_id).await.unwrap();

        let mut view = manager.guess(player_id, "d").await.unwrap();
        for letter in ["q", "w", "e", "r", "t", "y", "u"] {
            view = manager.guess(player_id, letter).await.unwrap();
        }

        assert_eq!(view.remaining_attempts, 0);
        assert!(!view.is_complete);
        assert_eq!(view.score, 1);
        assert_eq!(view.masked_word, "D__");

        let games = manager.list_games().await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].outcome, GameOutcome::Lost);
        assert_eq!(games[0].score, 1);
    }

    #[tokio::test]
    async fn test_failed_finish_keeps_game_playable_and_recorded_once() {
        let store = Arc::new(InMemoryStore::new());
        store.add_words(&["dog"]).unwrap();
        let player_id = store.add_player("Ada").unwrap().id;
        let sessions = Arc::new(FailingFinish {
            inner: store.clone(),
            fail_next: AtomicBool::new(false),
        });
        let manager = SessionManager::new(SessionStores {
            players: store.clone(),
            words: store.clone(),
            sessions: sessions.clone(),
            history: store.clone(),
        });

        manager.start_session(player_id).await.unwrap();
        for letter in ["q", "w", "e", "r", "t", "y"] {
            manager.guess(player_id, letter).await.unwrap();
        }

        sessions.fail_next.store(true, Ordering::SeqCst);
        let err = manager.guess(player_id, "u").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);

        // The losing guess was not applied, and nothing reached history
        let resumed = manager.start_session(player_id).await.unwrap();
        assert_eq!(resumed.remaining_attempts, 1);
        assert_eq!(resumed.guessed_letters.len(), 6);
        assert!(manager.list_games().await.unwrap().is_empty());

        let last = manager.guess(player_id, "u").await.unwrap();
        assert_eq!(last.remaining_attempts, 0);
        assert!(matches!(
            manager.guess(player_id, "z").await,
            Err(SessionError::NoActiveSession(_))
        ));

        let history = manager.list_games().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, GameOutcome::Lost);
    }

    #[tokio::test]
    async fn test_stored_terminal_session_rejects_guesses() {
        let (store, manager, player_id) = setup(&["dog"]);
        manager.start_session(player_id).await.unwrap();

        let session = store.find_active_by_player(player_id).await.unwrap().unwrap();
        let lost = GuessState {
            remaining_attempts: 0,
            ..session.state.clone()
        };
        SessionRepository::save(store.as_ref(), &session.with_state(lost))
            .await
            .unwrap();

        assert!(matches!(
            manager.guess(player_id, "z").await,
            Err(SessionError::NoActiveSession(_))
        ));
        assert!(manager.list_games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_player_locks_released_after_use() {
        let (_store, manager, player_id) = setup(&["cat"]);

        manager.start_session(player_id).await.unwrap();
        manager.guess(player_id, "c").await.unwrap();
        manager.guess(player_id, "1").await.unwrap_err();

        assert!(manager.player_locks.is_empty());
    }

    #[tokio::test]
    async fn test_new_game_after_finish_draws_new_word() {
        let (store, manager, player_id) = setup(&["owl", "cat"]);
        manager.start_session(player_id).await.unwrap();
        for letter in ["o", "w", "l"] {
            manager.guess(player_id, letter).await.unwrap();
        }

        let next = manager.start_session(player_id).await.unwrap();
        assert_eq!(next.masked_word, "___");
        assert_eq!(next.remaining_attempts, MAX_ATTEMPTS);
        assert_eq!(store.unused_word_count().unwrap(), 0);
    }
}
