pub mod game_records;
pub mod players;
pub mod sessions;
pub mod words;

pub mod prelude {
    pub use super::game_records::Entity as GameRecords;
    pub use super::players::Entity as Players;
    pub use super::sessions::Entity as Sessions;
    pub use super::words::Entity as Words;
}
