#![allow(dead_code)]

use hangman_core::{GuessState, InMemoryStore};
use hangman_types::Player;

pub const TEST_WORDS: &[&str] = &["cat", "dog", "hot dog", "banana", "owl"];

/// Creates a store seeded with one player and the test word list
pub fn create_seeded_store(player_name: &str) -> (InMemoryStore, Player) {
    let store = InMemoryStore::new();
    store.add_words(TEST_WORDS).unwrap();
    let player = store.add_player(player_name).unwrap();
    (store, player)
}

/// Apply each letter of `guesses` in order, returning every intermediate state
pub fn play_sequence(word: &str, guesses: &str) -> Vec<GuessState> {
    let mut states = vec![GuessState::new(word)];
    for letter in guesses.chars() {
        let next = states.last().unwrap().apply_guess(letter).state;
        states.push(next);
    }
    states
}

/// Play until the state is terminal or guesses run out
pub fn play_to_end(word: &str, guesses: &str) -> GuessState {
    let mut state = GuessState::new(word);
    for letter in guesses.chars() {
        if state.status().is_terminal() {
            break;
        }
        state = state.apply_guess(letter).state;
    }
    state
}
