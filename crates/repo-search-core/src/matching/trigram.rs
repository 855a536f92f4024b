//! Trigram extraction, word similarity and a trigram posting index.
//!
//! Trigrams follow the `pg_trgm` convention: text is lowercased and split
//! into alphanumeric words, each word is padded with two spaces in front and
//! one behind, and every 3-character window is a trigram.

use std::collections::{BTreeSet, HashMap};

use crate::types::Did;

/// Sorted set of trigrams.
pub type Trigrams = BTreeSet<String>;

/// Alphanumeric words of `text`.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Trigrams of a single word.
pub fn word_trigrams(word: &str) -> Trigrams {
    let padded: Vec<char> = format!("  {} ", word.to_lowercase()).chars().collect();
    padded
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Trigrams of every word in `text`.
pub fn text_trigrams(text: &str) -> Trigrams {
    words(text).flat_map(word_trigrams).collect()
}

/// Jaccard similarity of two trigram sets, in `[0, 1]`.
pub fn similarity(a: &Trigrams, b: &Trigrams) -> f32 {
    let shared = a.intersection(b).count();
    let total = a.len() + b.len() - shared;
    if total == 0 {
        0.0
    } else {
        shared as f32 / total as f32
    }
}

/// Best similarity between `term` and any single word of `texts`.
pub fn word_similarity<'a>(term: &Trigrams, texts: impl IntoIterator<Item = &'a str>) -> f32 {
    texts
        .into_iter()
        .flat_map(words)
        .map(|w| similarity(term, &word_trigrams(w)))
        .fold(0.0, f32::max)
}

/// Posting lists from trigram to the repos whose indexed text contains it.
#[derive(Debug, Default, Clone)]
pub struct TrigramIndex {
    postings: HashMap<String, BTreeSet<Did>>,
    indexed: HashMap<Did, Trigrams>,
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the indexed text of `did`.
    pub fn index<'a>(&mut self, did: &Did, texts: impl IntoIterator<Item = &'a str>) {
        self.remove(did);

        let trigrams: Trigrams = texts.into_iter().flat_map(text_trigrams).collect();
        for trigram in &trigrams {
            self.postings
                .entry(trigram.clone())
                .or_default()
                .insert(did.clone());
        }
        self.indexed.insert(did.clone(), trigrams);
    }

    pub fn remove(&mut self, did: &Did) {
        let Some(old) = self.indexed.remove(did) else {
            return;
        };
        for trigram in old {
            if let Some(posting) = self.postings.get_mut(&trigram) {
                posting.remove(did);
                if posting.is_empty() {
                    self.postings.remove(&trigram);
                }
            }
        }
    }

    /// Repos sharing at least one trigram with `term`.
    ///
    /// Any repo with non-zero similarity to the term is in this set.
    pub fn candidates(&self, term: &Trigrams) -> BTreeSet<Did> {
        term.iter()
            .filter_map(|t| self.postings.get(t))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.indexed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty()
    }
}
