use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use crate::entities::{prelude::*, words};
use hangman_core::{Word, WordStore, is_playable_word};
use hangman_types::WordId;

/// Compare-and-set claim so concurrent starts can never share a word.
/// Runs on a plain connection or inside a transaction.
pub(crate) async fn claim_word<C>(conn: &C, word_id: WordId) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Words::update_many()
        .col_expr(words::Column::Consumed, Expr::value(true))
        .filter(words::Column::Id.eq(word_id))
        .filter(words::Column::Consumed.eq(false))
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

pub struct WordRepository {
    db: DatabaseConnection,
}

impl WordRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_word(model: words::Model) -> Word {
        Word {
            id: model.id,
            text: model.text,
            consumed: model.consumed,
        }
    }

    /// Add words to the pool, skipping any already present (consumed or not).
    /// Returns how many were inserted.
    pub async fn insert_words<'a, I>(&self, texts: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut inserted = 0;
        for text in texts {
            let text = text.trim().to_uppercase();
            if !is_playable_word(&text) {
                tracing::warn!("Skipping unplayable word {:?}", text);
                continue;
            }

            let existing = Words::find()
                .filter(words::Column::Text.eq(text.as_str()))
                .one(&self.db)
                .await?;
            if existing.is_some() {
                continue;
            }

            let word_model = words::ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                text: sea_orm::ActiveValue::Set(text),
                consumed: sea_orm::ActiveValue::Set(false),
                created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
            };
            Words::insert(word_model).exec(&self.db).await?;
            inserted += 1;
        }

        Ok(inserted)
    }

    pub async fn count_unused(&self) -> Result<u64> {
        let count = Words::find()
            .filter(words::Column::Consumed.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl WordStore for WordRepository {
    async fn fetch_unused_word(&self) -> Result<Option<Word>> {
        let word_model = Words::find()
            .filter(words::Column::Consumed.eq(false))
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .one(&self.db)
            .await?;

        Ok(word_model.map(Self::model_to_word))
    }

    async fn mark_consumed(&self, word_id: WordId) -> Result<bool> {
        claim_word(&self.db, word_id).await
    }
}
