use crate::PlayerId;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Projection of an in-flight (or just finished) session returned to clients.
/// Never carries the unrevealed word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameView {
    pub masked_word: String,
    pub guessed_letters: Vec<char>, // sorted, set semantics
    pub remaining_attempts: u8,
    pub is_complete: bool,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum SessionStatus {
    InProgress,
    Won,
    Lost,
}

impl SessionStatus {
    /// Single source of truth for win/loss classification.
    /// A fully revealed word wins even if no attempts remain.
    pub fn classify(is_complete: bool, remaining_attempts: u8) -> Self {
        if is_complete {
            SessionStatus::Won
        } else if remaining_attempts == 0 {
            SessionStatus::Lost
        } else {
            SessionStatus::InProgress
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self {
            SessionStatus::InProgress => None,
            SessionStatus::Won => Some(GameOutcome::Won),
            SessionStatus::Lost => Some(GameOutcome::Lost),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum GameOutcome {
    Won,
    Lost,
}

impl GameOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOutcome::Won => "WON",
            GameOutcome::Lost => "LOST",
        }
    }
}

impl std::str::FromStr for GameOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WON" => Ok(GameOutcome::Won),
            "LOST" => Ok(GameOutcome::Lost),
            other => Err(format!("Unknown game outcome: {}", other)),
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completed game as reported by the history endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameRecord {
    pub id: i64,
    pub player_id: PlayerId,
    pub player_name: String,
    pub word: String,
    pub outcome: GameOutcome,
    pub score: i32,
    pub completed_at: String, // ISO 8601 string
}
