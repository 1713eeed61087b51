pub mod game_state;
pub mod memory;
pub mod scoring;
pub mod stores;
pub mod word_validation;

// Re-export main components
pub use game_state::*;
pub use memory::*;
pub use scoring::*;
pub use stores::*;
pub use word_validation::*;
