use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select,
};
use std::collections::HashMap;

use crate::entities::{game_records, players, prelude::*, words};
use hangman_core::{HistoryRepository, NewGameRecord};
use hangman_types::{GameOutcome, GameRecord, PlayerId};

pub(crate) async fn insert_record<C>(conn: &C, record: NewGameRecord) -> Result<()>
where
    C: ConnectionTrait,
{
    let record_model = game_records::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        player_id: sea_orm::ActiveValue::Set(record.player_id),
        word_id: sea_orm::ActiveValue::Set(record.word_id),
        outcome: sea_orm::ActiveValue::Set(record.outcome.as_str().to_string()),
        score: sea_orm::ActiveValue::Set(record.score),
        completed_at: sea_orm::ActiveValue::Set(record.completed_at.into()),
    };

    GameRecords::insert(record_model).exec(conn).await?;
    Ok(())
}

/// Completed games, written once and never updated
pub struct GameRecordRepository {
    db: DatabaseConnection,
}

impl GameRecordRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_record(
        model: game_records::Model,
        word: Option<words::Model>,
        player_names: &HashMap<PlayerId, String>,
    ) -> Result<GameRecord> {
        let outcome = model.outcome.parse::<GameOutcome>().map_err(|e| anyhow!(e))?;
        let word = word.ok_or_else(|| anyhow!("Game record {} has no word", model.id))?;

        Ok(GameRecord {
            id: model.id,
            player_id: model.player_id,
            player_name: player_names
                .get(&model.player_id)
                .cloned()
                .unwrap_or_default(),
            word: word.text,
            outcome,
            score: model.score,
            completed_at: model.completed_at.to_rfc3339(),
        })
    }

    async fn load(&self, query: Select<GameRecords>) -> Result<Vec<GameRecord>> {
        let rows = query
            .order_by_desc(game_records::Column::CompletedAt)
            .order_by_desc(game_records::Column::Id)
            .find_also_related(Words)
            .all(&self.db)
            .await?;

        let mut player_ids: Vec<PlayerId> = rows.iter().map(|(record, _)| record.player_id).collect();
        player_ids.sort();
        player_ids.dedup();

        let player_names: HashMap<PlayerId, String> = Players::find()
            .filter(players::Column::Id.is_in(player_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|player| (player.id, player.name))
            .collect();

        rows.into_iter()
            .map(|(record, word)| Self::model_to_record(record, word, &player_names))
            .collect()
    }
}

#[async_trait]
impl HistoryRepository for GameRecordRepository {
    async fn save(&self, record: NewGameRecord) -> Result<()> {
        insert_record(&self.db, record).await
    }

    async fn find_all(&self) -> Result<Vec<GameRecord>> {
        self.load(GameRecords::find()).await
    }

    async fn find_by_player(&self, player_id: PlayerId) -> Result<Vec<GameRecord>> {
        self.load(GameRecords::find().filter(game_records::Column::PlayerId.eq(player_id)))
            .await
    }
}
