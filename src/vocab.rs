use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{corpus::Corpus, Label, Result};

/// Sorted set of the words the model knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    /// Keeps every word seen at least `cutoff` times, in ascending order.
    pub fn from_token_counts(counts: HashMap<String, u64>, cutoff: u64) -> Self {
        let mut words: Vec<String> = counts
            .into_iter()
            .filter(|&(_, count)| count >= cutoff)
            .map(|(word, _)| word)
            .collect();
        words.sort();

        Vocabulary { words }
    }

    /// Builds the vocabulary from any sequence of tokens.
    pub fn from_tokens<I, S>(tokens: I, cutoff: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = HashMap::new();
        for token in tokens {
            *counts.entry(token.into()).or_insert(0) += 1;
        }
        Self::from_token_counts(counts, cutoff)
    }

    /// Scans every document of both labels. Token frequency is counted over the
    /// whole corpus, not per document.
    pub fn build(corpus: &Corpus, cutoff: u64) -> Result<Self> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for label in [Label::Y2016, Label::Y2020] {
            for path in corpus.documents(label)? {
                for token in crate::corpus::read_tokens_lossy(&path)? {
                    *counts.entry(token).or_insert(0) += 1;
                }
            }
        }

        let observed = counts.len();
        let vocab = Self::from_token_counts(counts, cutoff);
        info!(observed, kept = vocab.len(), cutoff, "built vocabulary");
        if vocab.is_empty() {
            warn!(cutoff, "vocabulary is empty, every word will be out of vocabulary");
        }

        Ok(vocab)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words
            .binary_search_by(|probe| probe.as_str().cmp(word))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }
}
