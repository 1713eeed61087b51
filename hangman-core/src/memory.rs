use anyhow::{Result, anyhow};
use async_trait::async_trait;
use hangman_types::{GameRecord, Player, PlayerId, WordId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    HistoryRepository, NewGameRecord, PlayerDirectory, Session, SessionRepository, Word,
    WordStore,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| anyhow!("{} lock poisoned", what))
}

/// Process-local implementation of every storage contract.
///
/// Words are handed out in insertion order so tests can predict them.
#[derive(Default)]
pub struct InMemoryStore {
    players: Mutex<HashMap<PlayerId, Player>>,
    words: Mutex<Vec<Word>>,
    sessions: Mutex<HashMap<PlayerId, Session>>,
    records: Mutex<Vec<GameRecord>>,
    session_writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&self, name: &str) -> Result<Player> {
        let player = Player {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        lock(&self.players, "players")?.insert(player.id, player.clone());
        Ok(player)
    }

    pub fn add_words(&self, texts: &[&str]) -> Result<()> {
        let mut words = lock(&self.words, "words")?;
        for text in texts {
            let id = words.len() as WordId + 1;
            words.push(Word {
                id,
                text: text.to_string(),
                consumed: false,
            });
        }
        Ok(())
    }

    pub fn unused_word_count(&self) -> Result<usize> {
        Ok(lock(&self.words, "words")?
            .iter()
            .filter(|word| !word.consumed)
            .count())
    }

    /// Number of session writes so far
    pub fn session_writes(&self) -> usize {
        self.session_writes.load(Ordering::SeqCst)
    }

    fn claim(words: &mut [Word], word_id: WordId) -> Result<bool> {
        match words.iter_mut().find(|word| word.id == word_id) {
            Some(word) if !word.consumed => {
                word.consumed = true;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(anyhow!("Word {} not found", word_id)),
        }
    }

    /// Resolve the player name and word text a history row reports
    fn describe(&self, record: &NewGameRecord) -> Result<(String, String)> {
        let player_name = lock(&self.players, "players")?
            .get(&record.player_id)
            .map(|player| player.name.clone())
            .ok_or_else(|| anyhow!("Player {} not found", record.player_id))?;
        let word = lock(&self.words, "words")?
            .iter()
            .find(|word| word.id == record.word_id)
            .map(|word| word.text.clone())
            .ok_or_else(|| anyhow!("Word {} not found", record.word_id))?;
        Ok((player_name, word))
    }

    fn push_record(
        records: &mut Vec<GameRecord>,
        record: NewGameRecord,
        player_name: String,
        word: String,
    ) {
        let id = records.len() as i64 + 1;
        records.push(GameRecord {
            id,
            player_id: record.player_id,
            player_name,
            word,
            outcome: record.outcome,
            score: record.score,
            completed_at: record.completed_at.to_rfc3339(),
        });
    }
}

#[async_trait]
impl WordStore for InMemoryStore {
    async fn fetch_unused_word(&self) -> Result<Option<Word>> {
        Ok(lock(&self.words, "words")?
            .iter()
            .find(|word| !word.consumed)
            .cloned())
    }

    async fn mark_consumed(&self, word_id: WordId) -> Result<bool> {
        Self::claim(&mut lock(&self.words, "words")?, word_id)
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn find_active_by_player(&self, player_id: PlayerId) -> Result<Option<Session>> {
        Ok(lock(&self.sessions, "sessions")?.get(&player_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        lock(&self.sessions, "sessions")?.insert(session.player_id, session.clone());
        self.session_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn begin_session(&self, session: &Session) -> Result<bool> {
        let mut words = lock(&self.words, "words")?;
        let mut sessions = lock(&self.sessions, "sessions")?;
        if !Self::claim(&mut words, session.word_id)? {
            return Ok(false);
        }
        sessions.insert(session.player_id, session.clone());
        self.session_writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn finish_session(&self, session: &Session, record: NewGameRecord) -> Result<()> {
        let (player_name, word) = self.describe(&record)?;
        let mut sessions = lock(&self.sessions, "sessions")?;
        let mut records = lock(&self.records, "records")?;
        sessions.remove(&session.player_id);
        Self::push_record(&mut records, record, player_name, word);
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryStore {
    async fn save(&self, record: NewGameRecord) -> Result<()> {
        let (player_name, word) = self.describe(&record)?;
        let mut records = lock(&self.records, "records")?;
        Self::push_record(&mut records, record, player_name, word);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<GameRecord>> {
        Ok(lock(&self.records, "records")?.iter().rev().cloned().collect())
    }

    async fn find_by_player(&self, player_id: PlayerId) -> Result<Vec<GameRecord>> {
        Ok(lock(&self.records, "records")?
            .iter()
            .rev()
            .filter(|record| record.player_id == player_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryStore {
    async fn find_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        Ok(lock(&self.players, "players")?.get(&player_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangman_types::GameOutcome;

    #[tokio::test]
    async fn test_word_claim_is_single_use() {
        let store = InMemoryStore::new();
        store.add_words(&["cat", "dog"]).unwrap();

        let word = store.fetch_unused_word().await.unwrap().unwrap();
        assert_eq!(word.text, "cat");
        assert!(store.mark_consumed(word.id).await.unwrap());
        assert!(!store.mark_consumed(word.id).await.unwrap());

        let next = store.fetch_unused_word().await.unwrap().unwrap();
        assert_eq!(next.text, "dog");
        assert_eq!(store.unused_word_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_begin_session_claims_word_once() {
        let store = InMemoryStore::new();
        store.add_words(&["cat"]).unwrap();
        let ada = store.add_player("Ada").unwrap();
        let bob = store.add_player("Bob").unwrap();
        let word = store.fetch_unused_word().await.unwrap().unwrap();

        assert!(store.begin_session(&Session::start(ada.id, &word)).await.unwrap());
        assert!(!store.begin_session(&Session::start(bob.id, &word)).await.unwrap());

        assert!(store.find_active_by_player(ada.id).await.unwrap().is_some());
        assert!(store.find_active_by_player(bob.id).await.unwrap().is_none());
        assert_eq!(store.unused_word_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_finish_session_moves_game_to_history() {
        let store = InMemoryStore::new();
        store.add_words(&["cat"]).unwrap();
        let ada = store.add_player("Ada").unwrap();
        let word = store.fetch_unused_word().await.unwrap().unwrap();
        let session = Session::start(ada.id, &word);
        store.begin_session(&session).await.unwrap();

        let record = NewGameRecord {
            player_id: ada.id,
            word_id: word.id,
            outcome: GameOutcome::Won,
            score: 20,
            completed_at: chrono::Utc::now(),
        };
        store.finish_session(&session, record.clone()).await.unwrap();

        assert!(store.find_active_by_player(ada.id).await.unwrap().is_none());
        assert_eq!(store.find_by_player(ada.id).await.unwrap().len(), 1);

        // An unknown word leaves both the session and history untouched
        SessionRepository::save(&store, &session).await.unwrap();
        let bad = NewGameRecord { word_id: 99, ..record };
        assert!(store.finish_session(&session, bad).await.is_err());
        assert!(store.find_active_by_player(ada.id).await.unwrap().is_some());
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_unknown_word_fails() {
        let store = InMemoryStore::new();
        assert!(store.mark_consumed(42).await.is_err());
    }

    #[tokio::test]
    async fn test_player_directory_defaults() {
        let store = InMemoryStore::new();
        let player = store.add_player("Ada").unwrap();

        assert!(store.exists(player.id).await.unwrap());
        assert_eq!(store.name_of(player.id).await.unwrap().as_deref(), Some("Ada"));
        assert!(!store.exists(Uuid::new_v4()).await.unwrap());
        assert_eq!(store.name_of(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let store = InMemoryStore::new();
        let ada = store.add_player("Ada").unwrap();
        let bob = store.add_player("Bob").unwrap();
        store.add_words(&["cat", "dog", "owl"]).unwrap();

        for (player, word_id, outcome) in [
            (&ada, 1, GameOutcome::Won),
            (&bob, 2, GameOutcome::Lost),
            (&ada, 3, GameOutcome::Lost),
        ] {
            HistoryRepository::save(
                &store,
                NewGameRecord {
                    player_id: player.id,
                    word_id,
                    outcome,
                    score: 0,
                    completed_at: chrono::Utc::now(),
                },
            )
            .await
            .unwrap();
        }

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].word, "owl");
        assert_eq!(all[2].word, "cat");

        let ada_games = store.find_by_player(ada.id).await.unwrap();
        assert_eq!(ada_games.len(), 2);
        assert_eq!(ada_games[0].word, "owl");
        assert_eq!(ada_games[1].player_name, "Ada");
    }
}
