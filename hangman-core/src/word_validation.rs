use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Parse a guess payload into a single uppercase letter.
///
/// Returns `None` unless the trimmed input is exactly one alphabetic
/// character whose uppercase form is also a single character.
pub fn parse_guess_letter(input: &str) -> Option<char> {
    let mut chars = input.trim().chars();
    let letter = chars.next()?;
    if chars.next().is_some() || !letter.is_alphabetic() {
        return None;
    }

    let mut upper = letter.to_uppercase();
    let normalized = upper.next()?;
    if upper.next().is_some() {
        return None;
    }

    Some(normalized)
}

/// Check if text is usable as a hangman word: letters separated by single spaces
pub fn is_playable_word(text: &str) -> bool {
    !text.is_empty()
        && !text.starts_with(' ')
        && !text.ends_with(' ')
        && !text.contains("  ")
        && text.chars().all(|c| c == ' ' || c.is_alphabetic())
}

/// Word pool loaded from a newline separated list
pub struct WordList {
    words: BTreeSet<String>,
}

impl WordList {
    /// Build a word list from text, one word or phrase per line.
    /// Blank lines and `#` comments are skipped, unplayable entries dropped.
    pub fn from_word_list(word_list: &str) -> Self {
        let words = word_list
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|word| word.to_uppercase())
            .filter(|word| is_playable_word(word))
            .collect();

        Self { words }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list {}", path.display()))?;
        let list = Self::from_word_list(&contents);
        tracing::info!("Loaded {} words from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
