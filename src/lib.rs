//! Multinomial Naive Bayes that tells documents of the 2016 corpus apart from
//! documents of the 2020 corpus.
//!
//! Documents are plain text files holding one token per line. Training builds a
//! frequency-cut vocabulary over both corpora, then estimates add-one smoothed
//! log priors and per-label log likelihoods; words outside the vocabulary share
//! a single out-of-vocabulary bucket.

pub mod bayes;
pub mod bow;
pub mod corpus;
pub mod error;
pub mod persist;
pub mod vocab;

pub use bayes::{
    Classification, Evaluation, Label, LabelScore, LabeledExample, LogLikelihood,
    NaiveBayesClassifier,
};
pub use bow::BagOfWords;
pub use corpus::Corpus;
pub use error::{Error, Result};
pub use vocab::Vocabulary;
