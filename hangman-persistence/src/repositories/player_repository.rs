use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::entities::{players, prelude::*};
use hangman_core::PlayerDirectory;
use hangman_types::{Player, PlayerId};

pub struct PlayerRepository {
    db: DatabaseConnection,
}

impl PlayerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_player(model: players::Model) -> Player {
        Player {
            id: model.id,
            name: model.name,
            created_at: model.created_at.to_rfc3339(),
        }
    }

    pub async fn find_by_id(&self, id: PlayerId) -> Result<Option<Player>> {
        let player_model = Players::find_by_id(id).one(&self.db).await?;
        Ok(player_model.map(Self::model_to_player))
    }

    pub async fn create_player(&self, name: &str) -> Result<Player> {
        let id = Uuid::new_v4();
        let player_model = players::ActiveModel {
            id: sea_orm::ActiveValue::Set(id),
            name: sea_orm::ActiveValue::Set(name.trim().to_string()),
            created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
        };

        Players::insert(player_model)
            .exec_without_returning(&self.db)
            .await?;

        let created_player = Players::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created player"))?;

        tracing::info!("Registered player {} ({})", created_player.name, id);
        Ok(Self::model_to_player(created_player))
    }

    pub async fn list_players(&self) -> Result<Vec<Player>> {
        let players = Players::find()
            .order_by_asc(players::Column::Name)
            .all(&self.db)
            .await?;

        Ok(players.into_iter().map(Self::model_to_player).collect())
    }
}

#[async_trait]
impl PlayerDirectory for PlayerRepository {
    async fn find_player(&self, player_id: PlayerId) -> Result<Option<Player>> {
        self.find_by_id(player_id).await
    }
}
