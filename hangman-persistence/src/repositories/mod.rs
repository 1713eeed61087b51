pub mod game_record_repository;
pub mod player_repository;
pub mod session_repository;
pub mod word_repository;

pub use game_record_repository::GameRecordRepository;
pub use player_repository::PlayerRepository;
pub use session_repository::ActiveSessionRepository;
pub use word_repository::WordRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::DatabaseConnection;

    pub async fn setup_test_db() -> DatabaseConnection {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }
}
