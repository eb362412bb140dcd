use std::collections::BTreeMap;

use crate::Vocabulary;

/// Word counts of a single document against a fixed vocabulary.
///
/// Words outside the vocabulary are not kept individually; they all land in
/// `out_of_vocab`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagOfWords {
    pub counts: BTreeMap<String, u64>,
    pub out_of_vocab: u64,
}

impl BagOfWords {
    pub fn from_tokens<I, S>(vocab: &Vocabulary, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bow = BagOfWords::default();
        for token in tokens {
            let token = token.as_ref().trim_end();
            if vocab.contains(token) {
                *bow.counts.entry(token.to_string()).or_insert(0) += 1;
            } else {
                bow.out_of_vocab += 1;
            }
        }
        bow
    }

    /// Number of tokens in the document this bag was built from.
    pub fn total(&self) -> u64 {
        self.counts.values().sum::<u64>() + self.out_of_vocab
    }
}
