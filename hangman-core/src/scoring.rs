use std::collections::BTreeSet;

pub const COMPLETE_WORD_BONUS: i32 = 20;
pub const POINTS_PER_LETTER: i32 = 1;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Score a session snapshot.
    ///
    /// A revealed word earns the flat bonus no matter how many attempts were
    /// spent. A lost session earns one point per guessed letter that occurs in
    /// the word. Anything still in progress scores 0.
    pub fn score(
        word: &str,
        guessed_letters: &BTreeSet<char>,
        is_complete: bool,
        remaining_attempts: u8,
    ) -> i32 {
        if is_complete {
            COMPLETE_WORD_BONUS
        } else if remaining_attempts == 0 {
            Self::correct_letter_count(word, guessed_letters) as i32 * POINTS_PER_LETTER
        } else {
            0
        }
    }

    /// Number of distinct guessed letters that appear in the word
    pub fn correct_letter_count(word: &str, guessed_letters: &BTreeSet<char>) -> usize {
        let word = word.to_uppercase();
        guessed_letters
            .iter()
            .filter(|letter| word.contains(**letter))
            .count()
    }
}
