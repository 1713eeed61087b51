use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, TransactionTrait};
use std::collections::BTreeSet;

use super::game_record_repository::insert_record;
use super::word_repository::claim_word;
use crate::entities::{prelude::*, sessions, words};
use hangman_core::{GuessState, NewGameRecord, Session, SessionRepository};
use hangman_types::PlayerId;

/// Stores the single in-flight session of each player, keyed by player id
pub struct ActiveSessionRepository {
    db: DatabaseConnection,
}

pub(crate) fn encode_letters(letters: &BTreeSet<char>) -> String {
    letters
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn decode_letters(encoded: &str) -> BTreeSet<char> {
    encoded
        .split(',')
        .filter_map(|part| part.trim().chars().next())
        .collect()
}

impl ActiveSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_session(model: sessions::Model, word: words::Model) -> Session {
        Session {
            player_id: model.player_id,
            word_id: model.word_id,
            state: GuessState {
                word: word.text,
                guessed_letters: decode_letters(&model.guessed_letters),
                remaining_attempts: model.remaining_attempts.clamp(0, u8::MAX as i32) as u8,
            },
            started_at: model.started_at.with_timezone(&Utc),
        }
    }
}

#[async_trait]
impl SessionRepository for ActiveSessionRepository {
    async fn find_active_by_player(&self, player_id: PlayerId) -> Result<Option<Session>> {
        let found = Sessions::find_by_id(player_id)
            .find_also_related(Words)
            .one(&self.db)
            .await?;

        match found {
            Some((session, Some(word))) => Ok(Some(Self::model_to_session(session, word))),
            Some((session, None)) => Err(anyhow!(
                "Session for player {} references missing word {}",
                player_id,
                session.word_id
            )),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        upsert_session(&self.db, session).await
    }

    async fn begin_session(&self, session: &Session) -> Result<bool> {
        let txn = self.db.begin().await?;

        if !claim_word(&txn, session.word_id).await? {
            txn.rollback().await?;
            return Ok(false);
        }
        upsert_session(&txn, session).await?;

        txn.commit().await?;
        Ok(true)
    }

    async fn finish_session(&self, session: &Session, record: NewGameRecord) -> Result<()> {
        let txn = self.db.begin().await?;

        Sessions::delete_by_id(session.player_id).exec(&txn).await?;
        insert_record(&txn, record).await?;

        txn.commit().await?;
        Ok(())
    }
}

async fn upsert_session<C>(conn: &C, session: &Session) -> Result<()>
where
    C: ConnectionTrait,
{
    let session_model = sessions::ActiveModel {
        player_id: sea_orm::ActiveValue::Set(session.player_id),
        word_id: sea_orm::ActiveValue::Set(session.word_id),
        guessed_letters: sea_orm::ActiveValue::Set(encode_letters(&session.state.guessed_letters)),
        remaining_attempts: sea_orm::ActiveValue::Set(session.state.remaining_attempts as i32),
        started_at: sea_orm::ActiveValue::Set(session.started_at.into()),
    };

    // The word and start time are fixed for the life of a session
    Sessions::insert(session_model)
        .on_conflict(
            OnConflict::column(sessions::Column::PlayerId)
                .update_columns([
                    sessions::Column::GuessedLetters,
                    sessions::Column::RemainingAttempts,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(())
}
