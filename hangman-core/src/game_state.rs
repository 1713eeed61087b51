use crate::ScoringEngine;
use chrono::{DateTime, Utc};
use hangman_types::{GameView, PlayerId, SessionStatus, WordId};
use std::collections::BTreeSet;

/// Wrong guesses allowed before a session is lost
pub const MAX_ATTEMPTS: u8 = 7;
pub const MASK_CHAR: char = '_';

/// A playable phrase from the word pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: WordId,
    pub text: String,
    pub consumed: bool,
}

/// Mask `word`, keeping spaces and any letter present in `guessed_letters`.
/// Comparison is against the uppercased word, so `guessed_letters` must hold
/// uppercase letters.
pub fn reveal(word: &str, guessed_letters: &BTreeSet<char>) -> String {
    word.to_uppercase()
        .chars()
        .map(|c| {
            if c == ' ' || guessed_letters.contains(&c) {
                c
            } else {
                MASK_CHAR
            }
        })
        .collect()
}

pub fn is_complete(word: &str, masked_word: &str) -> bool {
    masked_word == word.to_uppercase()
}

/// Immutable snapshot of a session's guessing progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessState {
    pub word: String,
    pub guessed_letters: BTreeSet<char>,
    pub remaining_attempts: u8,
}

/// Result of applying one letter to a [`GuessState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub letter: char,
    /// The letter occurs somewhere in the word
    pub correct: bool,
    /// False when the letter had already been tried
    pub changed: bool,
    pub state: GuessState,
}

impl GuessState {
    pub fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            guessed_letters: BTreeSet::new(),
            remaining_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn contains_letter(&self, letter: char) -> bool {
        self.word.to_uppercase().chars().any(|c| c == letter)
    }

    /// Apply a guessed letter and return the next snapshot.
    ///
    /// Repeating a letter is a no-op: the same state comes back with
    /// `changed == false` and no attempt is spent. A new letter that is not in
    /// the word costs one attempt, never going below zero.
    pub fn apply_guess(&self, letter: char) -> GuessOutcome {
        let letter = letter.to_uppercase().next().unwrap_or(letter);
        let correct = self.contains_letter(letter);

        if self.guessed_letters.contains(&letter) {
            return GuessOutcome {
                letter,
                correct,
                changed: false,
                state: self.clone(),
            };
        }

        let mut guessed_letters = self.guessed_letters.clone();
        guessed_letters.insert(letter);

        let remaining_attempts = if correct {
            self.remaining_attempts
        } else {
            self.remaining_attempts.saturating_sub(1)
        };

        GuessOutcome {
            letter,
            correct,
            changed: true,
            state: GuessState {
                word: self.word.clone(),
                guessed_letters,
                remaining_attempts,
            },
        }
    }

    pub fn masked_word(&self) -> String {
        reveal(&self.word, &self.guessed_letters)
    }

    pub fn is_complete(&self) -> bool {
        is_complete(&self.word, &self.masked_word())
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::classify(self.is_complete(), self.remaining_attempts)
    }

    pub fn score(&self) -> i32 {
        ScoringEngine::score(
            &self.word,
            &self.guessed_letters,
            self.is_complete(),
            self.remaining_attempts,
        )
    }

    pub fn view(&self) -> GameView {
        let masked_word = self.masked_word();
        let is_complete = is_complete(&self.word, &masked_word);

        GameView {
            masked_word,
            guessed_letters: self.guessed_letters.iter().copied().collect(),
            remaining_attempts: self.remaining_attempts,
            is_complete,
            score: ScoringEngine::score(
                &self.word,
                &self.guessed_letters,
                is_complete,
                self.remaining_attempts,
            ),
        }
    }
}

/// The single in-flight game owned by a player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub player_id: PlayerId,
    pub word_id: WordId,
    pub state: GuessState,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn start(player_id: PlayerId, word: &Word) -> Self {
        Self {
            player_id,
            word_id: word.id,
            state: GuessState::new(&word.text),
            started_at: Utc::now(),
        }
    }

    /// Same session carried forward with a new guessing snapshot
    pub fn with_state(&self, state: GuessState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn view(&self) -> GameView {
        self.state.view()
    }
}
