//! English word dictionary backing the translated-title heuristic.
//!
//! Words are stored lowercase in an `fst::Set`, built once per run from the
//! embedded base list, an optional user word list and configured extras.

use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{Context, Result};
use fst::Set;

/// Base word list compiled into the binary (whitespace separated).
const BASE_WORDS: &str = include_str!("words_en.txt");

/// Recognizes dictionary words. Implementations receive lowercase input.
pub trait WordCheck
{
    fn is_word(
        &self,
        word: &str,
    ) -> bool;
}

/// Immutable lowercase word set.
#[derive(Debug)]
pub struct Dictionary
{
    words: Set<Vec<u8>>,
}

impl Dictionary
{
    /// Build from arbitrary words; case and duplicates are folded.
    pub fn from_words<I, S>(words: I) -> Result<Self, fst::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let words = Set::from_iter(sorted)?;
        Ok(Self { words })
    }

    /// The embedded base list only.
    pub fn builtin() -> Result<Self, fst::Error>
    {
        Self::from_words(BASE_WORDS.split_whitespace())
    }

    /// Base list, plus the word list at `path` (one word per line), plus `extra`.
    pub fn load(
        path: Option<&Path>,
        extra: &[String],
    ) -> Result<Self>
    {
        let mut text = String::from(BASE_WORDS);

        if let Some(path) = path
        {
            let user = fs::read_to_string(path)
                .with_context(|| format!("read word list: {}", path.display()))?;
            text.push('\n');
            text.push_str(&user);
        }

        let words = text
            .split_whitespace()
            .chain(extra.iter().map(String::as_str));

        Self::from_words(words).context("build word dictionary")
    }

    pub fn len(&self) -> usize
    {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.words.is_empty()
    }
}

impl WordCheck for Dictionary
{
    fn is_word(
        &self,
        word: &str,
    ) -> bool
    {
        self.words.contains(word)
    }
}
