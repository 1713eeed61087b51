use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Players::Name).string().not_null())
                    .col(
                        ColumnDef::new(Players::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Words::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Words::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Words::Text).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Words::Consumed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Words::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unused word lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_words_consumed")
                    .table(Words::Table)
                    .col(Words::Consumed)
                    .to_owned(),
            )
            .await?;

        // One in-flight session per player: the player id is the key
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::PlayerId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::WordId).integer().not_null())
                    .col(
                        ColumnDef::new(Sessions::GuessedLetters)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Sessions::RemainingAttempts)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_player")
                            .from(Sessions::Table, Sessions::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_word")
                            .from(Sessions::Table, Sessions::WordId)
                            .to(Words::Table, Words::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GameRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameRecords::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(GameRecords::WordId).integer().not_null())
                    .col(ColumnDef::new(GameRecords::Outcome).string().not_null())
                    .col(ColumnDef::new(GameRecords::Score).integer().not_null())
                    .col(
                        ColumnDef::new(GameRecords::CompletedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_records_player")
                            .from(GameRecords::Table, GameRecords::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_records_word")
                            .from(GameRecords::Table, GameRecords::WordId)
                            .to(Words::Table, Words::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-player history, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_game_records_player_completed")
                    .table(GameRecords::Table)
                    .col(GameRecords::PlayerId)
                    .col(GameRecords::CompletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Words::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Words {
    Table,
    Id,
    Text,
    Consumed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    PlayerId,
    WordId,
    GuessedLetters,
    RemainingAttempts,
    StartedAt,
}

#[derive(DeriveIden)]
enum GameRecords {
    Table,
    Id,
    PlayerId,
    WordId,
    Outcome,
    Score,
    CompletedAt,
}
