//! Storage contracts the session layer is written against.
//!
//! Implementations live in `hangman-persistence` (sea-orm) and
//! [`crate::memory`] (tests). Errors are infrastructure failures and are
//! passed through to callers untouched.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hangman_types::{GameOutcome, GameRecord, Player, PlayerId, WordId};

use crate::{Session, Word};

/// A finished game about to be written to history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameRecord {
    pub player_id: PlayerId,
    pub word_id: WordId,
    pub outcome: GameOutcome,
    pub score: i32,
    pub completed_at: DateTime<Utc>,
}

#[async_trait]
pub trait WordStore: Send + Sync {
    /// Any word not yet consumed, or `None` when the pool is exhausted
    async fn fetch_unused_word(&self) -> Result<Option<Word>>;

    /// Claim a word for a new session. Returns `false` if it was already
    /// consumed, in which case the caller should draw another word.
    async fn mark_consumed(&self, word_id: WordId) -> Result<bool>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_active_by_player(&self, player_id: PlayerId) -> Result<Option<Session>>;

    /// Insert or replace the player's session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Claim the session's word and store the new session as one atomic step.
    /// Returns `false` without storing anything when the word was already
    /// consumed.
    async fn begin_session(&self, session: &Session) -> Result<bool>;

    /// Write the history record and remove the session as one atomic step.
    /// On error neither change is applied.
    async fn finish_session(&self, session: &Session, record: NewGameRecord) -> Result<()>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn save(&self, record: NewGameRecord) -> Result<()>;

    /// All finished games, newest first
    async fn find_all(&self) -> Result<Vec<GameRecord>>;

    /// Finished games for one player, newest first
    async fn find_by_player(&self, player_id: PlayerId) -> Result<Vec<GameRecord>>;
}

#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn find_player(&self, player_id: PlayerId) -> Result<Option<Player>>;

    async fn exists(&self, player_id: PlayerId) -> Result<bool> {
        Ok(self.find_player(player_id).await?.is_some())
    }

    async fn name_of(&self, player_id: PlayerId) -> Result<Option<String>> {
        Ok(self.find_player(player_id).await?.map(|player| player.name))
    }
}
