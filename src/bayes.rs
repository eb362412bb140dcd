use std::{
    collections::BTreeMap,
    fmt, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    corpus::{self, Corpus},
    BagOfWords, Result, Vocabulary,
};

/// Which corpus a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "2016")]
    Y2016,
    #[serde(rename = "2020")]
    Y2020,
}

impl Label {
    /// Order in which priors are estimated and training examples are laid out.
    pub const ALL: [Label; 2] = [Label::Y2020, Label::Y2016];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Y2016 => "2016",
            Label::Y2020 => "2020",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "2016" => Ok(Label::Y2016),
            "2020" => Ok(Label::Y2020),
            other => Err(format!("unknown label `{other}`, expected 2016 or 2020")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub label: Label,
    pub bow: BagOfWords,
}

/// log P(word | label) for every vocabulary word, plus the shared
/// out-of-vocabulary bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLikelihood {
    pub words: BTreeMap<String, f64>,
    pub out_of_vocab: f64,
}

impl LogLikelihood {
    pub fn get(&self, word: &str) -> f64 {
        self.words.get(word).copied().unwrap_or(self.out_of_vocab)
    }

    /// log P(bow | label), summing each word's log probability once per
    /// occurrence.
    fn score(&self, bow: &BagOfWords) -> f64 {
        let words = bow
            .counts
            .iter()
            .filter(|&(_, &count)| count > 0)
            .fold(0.0, |acc, (word, &count)| {
                acc + count as f64 * self.get(word)
            });

        if bow.out_of_vocab > 0 {
            words + bow.out_of_vocab as f64 * self.out_of_vocab
        } else {
            words
        }
    }
}

/// Result of classifying one document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "predicted y")]
    pub predicted: Label,
    #[serde(rename = "log p(y=2016|x)")]
    pub log_p_2016: f64,
    #[serde(rename = "log p(y=2020|x)")]
    pub log_p_2020: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelScore {
    pub correct: usize,
    pub total: usize,
}

/// How many documents of each label a model got right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub per_label: BTreeMap<Label, LabelScore>,
}

impl Evaluation {
    pub fn correct(&self) -> usize {
        self.per_label.values().map(|score| score.correct).sum()
    }

    pub fn total(&self) -> usize {
        self.per_label.values().map(|score| score.total).sum()
    }

    /// Zero when there was nothing to classify.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }
}

/// A trained model. Never changes after training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesClassifier {
    vocabulary: Vocabulary,
    #[serde(rename = "log prior")]
    log_prior: BTreeMap<Label, f64>,
    #[serde(rename = "log p(w|y=2016)")]
    log_likelihood_2016: LogLikelihood,
    #[serde(rename = "log p(w|y=2020)")]
    log_likelihood_2020: LogLikelihood,
}

/// Add-one smoothed log prior of each label. The denominator is always
/// `N + 2`, whether or not both labels occur.
pub fn log_prior(training_set: &[LabeledExample], labels: &[Label]) -> BTreeMap<Label, f64> {
    let total = training_set.len() as f64;
    labels
        .iter()
        .map(|&label| {
            let count = training_set
                .iter()
                .filter(|example| example.label == label)
                .count() as f64;
            (label, ((count + 1.0) / (total + 2.0)).ln())
        })
        .collect()
}

/// Add-one smoothed log P(word | label) over the vocabulary and the
/// out-of-vocabulary bucket. Every call starts from fresh counts.
pub fn log_likelihood(
    vocab: &Vocabulary,
    training_set: &[LabeledExample],
    label: Label,
) -> LogLikelihood {
    let mut counts: BTreeMap<&str, u64> = vocab.iter().map(|word| (word, 1)).collect();
    let mut out_of_vocab: u64 = 1;

    for example in training_set.iter().filter(|example| example.label == label) {
        for (word, &count) in &example.bow.counts {
            match counts.get_mut(word.as_str()) {
                Some(total) => *total += count,
                None => out_of_vocab += count,
            }
        }
        out_of_vocab += example.bow.out_of_vocab;
    }

    let total = (counts.values().sum::<u64>() + out_of_vocab) as f64;
    LogLikelihood {
        words: counts
            .into_iter()
            .map(|(word, count)| (word.to_string(), (count as f64 / total).ln()))
            .collect(),
        out_of_vocab: (out_of_vocab as f64 / total).ln(),
    }
}

/// One labeled example per document, all 2020 documents first.
pub fn load_training_data(vocab: &Vocabulary, corpus: &Corpus) -> Result<Vec<LabeledExample>> {
    let mut training_set = Vec::new();
    for label in Label::ALL {
        for path in corpus.documents(label)? {
            let bow = BagOfWords::from_tokens(vocab, corpus::read_tokens(&path)?);
            debug!(path = %path.display(), %label, tokens = bow.total(), "loaded document");
            training_set.push(LabeledExample { label, bow });
        }
    }
    Ok(training_set)
}

impl NaiveBayesClassifier {
    /// Trains on the corpus rooted at `path`.
    pub fn new<P: AsRef<Path>>(path: P, cutoff: u64) -> Result<Self> {
        Self::train(&Corpus::open(path)?, cutoff)
    }

    pub fn train(corpus: &Corpus, cutoff: u64) -> Result<Self> {
        let vocabulary = Vocabulary::build(corpus, cutoff)?;
        let training_set = load_training_data(&vocabulary, corpus)?;
        Ok(Self::from_training_set(vocabulary, &training_set))
    }

    /// Trains on in-memory documents, each given as its label and tokens.
    pub fn fit<S: AsRef<str>>(documents: &[(Label, Vec<S>)], cutoff: u64) -> Self {
        let vocabulary = Vocabulary::from_tokens(
            documents
                .iter()
                .flat_map(|(_, tokens)| tokens.iter().map(|token| token.as_ref().trim())),
            cutoff,
        );

        let training_set: Vec<LabeledExample> = Label::ALL
            .iter()
            .flat_map(|&label| {
                documents
                    .iter()
                    .filter(move |(doc_label, _)| *doc_label == label)
                    .map(move |(_, tokens)| (label, tokens))
            })
            .map(|(label, tokens)| LabeledExample {
                label,
                bow: BagOfWords::from_tokens(&vocabulary, tokens),
            })
            .collect();

        Self::from_training_set(vocabulary, &training_set)
    }

    /// Estimates priors and likelihoods from examples built against
    /// `vocabulary`.
    pub fn from_training_set(vocabulary: Vocabulary, training_set: &[LabeledExample]) -> Self {
        let log_prior = log_prior(training_set, &Label::ALL);
        let log_likelihood_2020 = log_likelihood(&vocabulary, training_set, Label::Y2020);
        let log_likelihood_2016 = log_likelihood(&vocabulary, training_set, Label::Y2016);

        info!(
            examples = training_set.len(),
            vocabulary = vocabulary.len(),
            "trained model"
        );

        NaiveBayesClassifier {
            vocabulary,
            log_prior,
            log_likelihood_2016,
            log_likelihood_2020,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Checks what training guarantees but a loaded model file might not:
    /// a prior for each label, a sorted duplicate-free vocabulary, and
    /// likelihood tables keyed by exactly the vocabulary.
    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        if let Some(label) = Label::ALL
            .into_iter()
            .find(|label| !self.log_prior.contains_key(label))
        {
            return Err(format!("missing log prior for {label}"));
        }

        let words = self.vocabulary.as_slice();
        if let Some(pair) = words.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(format!(
                "vocabulary is not sorted and unique at `{}`, `{}`",
                pair[0], pair[1]
            ));
        }

        for label in Label::ALL {
            let table = &self.log_likelihood(label).words;
            if table.len() != words.len() || !table.keys().eq(words.iter()) {
                return Err(format!(
                    "log likelihood table for {label} does not match the vocabulary"
                ));
            }
        }

        Ok(())
    }

    pub fn log_prior(&self, label: Label) -> f64 {
        self.log_prior[&label]
    }

    pub fn log_likelihood(&self, label: Label) -> &LogLikelihood {
        match label {
            Label::Y2016 => &self.log_likelihood_2016,
            Label::Y2020 => &self.log_likelihood_2020,
        }
    }

    pub fn classify<P: AsRef<Path>>(&self, path: P) -> Result<Classification> {
        Ok(self.classify_tokens(corpus::read_tokens(path.as_ref())?))
    }

    /// Exact ties go to 2020.
    pub fn classify_tokens<I, S>(&self, tokens: I) -> Classification
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bow = BagOfWords::from_tokens(&self.vocabulary, tokens);
        let log_p_2016 =
            self.log_likelihood_2016.score(&bow) + self.log_prior(Label::Y2016);
        let log_p_2020 =
            self.log_likelihood_2020.score(&bow) + self.log_prior(Label::Y2020);

        let predicted = if log_p_2016 > log_p_2020 {
            Label::Y2016
        } else {
            Label::Y2020
        };

        Classification {
            predicted,
            log_p_2016,
            log_p_2020,
        }
    }

    /// Classifies every document of the given labels in `corpus`.
    pub fn evaluate(&self, corpus: &Corpus, labels: &[Label]) -> Result<Evaluation> {
        let mut evaluation = Evaluation::default();
        for &label in labels {
            let documents = corpus.documents(label)?;
            let correct = documents.iter().try_fold(0, |acc, path| {
                let result = self.classify(path)?;
                Ok::<_, crate::Error>(if result.predicted == label { acc + 1 } else { acc })
            })?;

            info!(%label, correct, documents = documents.len(), "evaluated label");
            evaluation.per_label.insert(
                label,
                LabelScore {
                    correct,
                    total: documents.len(),
                },
            );
        }
        Ok(evaluation)
    }

    /// Classifies every document and writes one CSV row per document.
    pub fn predict<W: io::Write>(
        &self,
        documents: &[PathBuf],
        out: W,
    ) -> Result<Vec<Classification>> {
        let results = documents
            .iter()
            .map(|path| self.classify(path))
            .collect::<Result<Vec<_>>>()?;

        // Now we can write the result:
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["document", "predicted y", "log p(y=2016|x)", "log p(y=2020|x)"])?;
        for (path, result) in documents.iter().zip(&results) {
            writer.write_record([
                path.display().to_string(),
                result.predicted.to_string(),
                result.log_p_2016.to_string(),
                result.log_p_2020.to_string(),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ln(x: f64) -> f64 {
        x.ln()
    }

    fn sample() -> NaiveBayesClassifier {
        NaiveBayesClassifier::fit(
            &[
                (Label::Y2016, vec!["a", "a", "b"]),
                (Label::Y2020, vec!["b", "b", "c"]),
            ],
            1,
        )
    }

    #[test]
    fn end_to_end_arithmetic() {
        let model = sample();

        assert_eq!(model.vocabulary().as_slice(), ["a", "b", "c"]);
        assert_eq!(model.log_prior(Label::Y2016), ln(2.0 / 4.0));
        assert_eq!(model.log_prior(Label::Y2020), ln(2.0 / 4.0));

        let l2016 = model.log_likelihood(Label::Y2016);
        assert_eq!(l2016.get("a"), ln(3.0 / 7.0));
        assert_eq!(l2016.get("b"), ln(2.0 / 7.0));
        assert_eq!(l2016.get("c"), ln(1.0 / 7.0));
        assert_eq!(l2016.out_of_vocab, ln(1.0 / 7.0));

        let l2020 = model.log_likelihood(Label::Y2020);
        assert_eq!(l2020.get("a"), ln(1.0 / 7.0));
        assert_eq!(l2020.get("b"), ln(3.0 / 7.0));
        assert_eq!(l2020.get("c"), ln(2.0 / 7.0));
        assert_eq!(l2020.out_of_vocab, ln(1.0 / 7.0));
    }

    #[test]
    fn held_out_a_is_2016() {
        let result = sample().classify_tokens(["a"]);

        assert_eq!(result.predicted, Label::Y2016);
        assert_eq!(result.log_p_2016, ln(3.0 / 7.0) + ln(0.5));
        assert_eq!(result.log_p_2020, ln(1.0 / 7.0) + ln(0.5));
    }

    #[test]
    fn repeated_words_count_once_per_occurrence() {
        let model = sample();
        let result = model.classify_tokens(["c", "c", "zzz"]);

        let l2020 = model.log_likelihood(Label::Y2020);
        assert_eq!(
            result.log_p_2020,
            2.0 * l2020.get("c") + l2020.out_of_vocab + ln(0.5)
        );
        assert_eq!(result.predicted, Label::Y2020);
    }

    #[test]
    fn exact_tie_goes_to_2020() {
        let model = NaiveBayesClassifier::fit(
            &[(Label::Y2016, vec!["a"]), (Label::Y2020, vec!["b"])],
            0,
        );

        let unknown = model.classify_tokens(["x", "y"]);
        assert_eq!(unknown.log_p_2016, unknown.log_p_2020);
        assert_eq!(unknown.predicted, Label::Y2020);

        let balanced = model.classify_tokens(["a", "b"]);
        assert_eq!(balanced.log_p_2016, balanced.log_p_2020);
        assert_eq!(balanced.predicted, Label::Y2020);
    }

    #[test]
    fn empty_vocabulary_still_classifies() {
        let model = NaiveBayesClassifier::fit(
            &[(Label::Y2016, vec!["a", "b"]), (Label::Y2020, vec!["c"])],
            5,
        );
        assert!(model.vocabulary().is_empty());

        // one training example each, the sentinel holds everything
        let l2016 = model.log_likelihood(Label::Y2016);
        assert!(l2016.words.is_empty());
        assert_eq!(l2016.out_of_vocab, 0.0);

        let result = model.classify_tokens(["a", "q"]);
        assert!(result.log_p_2016.is_finite());
        assert!(result.log_p_2020.is_finite());
        assert_eq!(result.predicted, Label::Y2020);
    }

    #[test]
    fn label_without_examples_gets_smoothed_prior() {
        let model = NaiveBayesClassifier::fit(
            &[(Label::Y2016, vec!["a"]), (Label::Y2016, vec!["b"])],
            0,
        );

        assert_eq!(model.log_prior(Label::Y2020), ln(1.0 / 4.0));
        assert_eq!(model.log_prior(Label::Y2016), ln(3.0 / 4.0));
        // no 2020 text at all: uniform over a, b and the sentinel
        let l2020 = model.log_likelihood(Label::Y2020);
        assert_eq!(l2020.get("a"), ln(1.0 / 3.0));
        assert_eq!(l2020.out_of_vocab, ln(1.0 / 3.0));
    }

    #[test]
    fn training_examples_are_left_untouched() {
        let vocab = Vocabulary::from_tokens(["a", "b"], 0);
        let training_set = vec![LabeledExample {
            label: Label::Y2016,
            bow: BagOfWords::from_tokens(&vocab, ["a", "a", "b", "x"]),
        }];
        let before = training_set.clone();

        let first = log_likelihood(&vocab, &training_set, Label::Y2016);
        let second = log_likelihood(&vocab, &training_set, Label::Y2016);

        assert_eq!(training_set, before);
        assert_eq!(first, second);
        assert_eq!(first.get("a"), ln(3.0 / 7.0));
        assert_eq!(first.out_of_vocab, ln(2.0 / 7.0));
    }

    #[test]
    fn label_round_trips_through_str() {
        for label in Label::ALL {
            assert_eq!(label.as_str().parse::<Label>(), Ok(label));
        }
        assert!("2024".parse::<Label>().is_err());
    }

    fn documents() -> impl Strategy<Value = Vec<(Label, Vec<String>)>> {
        proptest::collection::vec(
            (
                prop_oneof![Just(Label::Y2016), Just(Label::Y2020)],
                proptest::collection::vec("[a-f]", 0..20),
            ),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn priors_sum_to_one(docs in documents(), cutoff in 0u64..4) {
            let model = NaiveBayesClassifier::fit(&docs, cutoff);
            let sum = model.log_prior(Label::Y2016).exp() + model.log_prior(Label::Y2020).exp();
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }

        #[test]
        fn likelihoods_sum_to_one(docs in documents(), cutoff in 0u64..4) {
            let model = NaiveBayesClassifier::fit(&docs, cutoff);
            prop_assert_eq!(model.check(), Ok(()));
            for label in Label::ALL {
                let table = model.log_likelihood(label);
                prop_assert_eq!(table.words.len(), model.vocabulary().len());
                let sum = table.words.values().map(|ll| ll.exp()).sum::<f64>()
                    + table.out_of_vocab.exp();
                prop_assert!((sum - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn out_of_vocabulary_documents_get_a_label(
            docs in documents(),
            query in proptest::collection::vec("[x-z]{2}", 1..10),
        ) {
            let model = NaiveBayesClassifier::fit(&docs, 0);
            let result = model.classify_tokens(&query);
            prop_assert!(result.log_p_2016.is_finite());
            prop_assert!(result.log_p_2020.is_finite());
        }
    }
}
