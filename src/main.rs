use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use year_bayes::{corpus, persist, Corpus, Label, NaiveBayesClassifier};

#[derive(Parser)]
#[command(name = "year-bayes")]
#[command(about = "Naive Bayes classifier for the 2016 and 2020 corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model on a corpus with `2016` and `2020` subdirectories
    Train {
        /// Corpus root directory
        #[arg(short, long)]
        corpus: PathBuf,

        /// Minimum number of occurrences for a word to enter the vocabulary
        #[arg(long, default_value = "1")]
        cutoff: u64,

        /// Where to write the trained model
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Classify documents with a trained model
    Classify {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// CSV report path, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Documents to classify; directories expand to the files inside them
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },

    /// Measure accuracy of a trained model on a labeled corpus
    Evaluate {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// Corpus root directory
        #[arg(short, long)]
        corpus: PathBuf,

        /// Only evaluate documents of this label (2016 or 2020)
        #[arg(long)]
        label: Option<Label>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install the log subscriber")?;

    match cli.command {
        Commands::Train {
            corpus,
            cutoff,
            model,
        } => train(&corpus, cutoff, &model),
        Commands::Classify {
            model,
            output,
            documents,
        } => classify(&model, output.as_deref(), &documents),
        Commands::Evaluate {
            model,
            corpus,
            label,
        } => evaluate(&model, &corpus, label),
    }
}

fn train(corpus: &Path, cutoff: u64, model_path: &Path) -> Result<()> {
    let classifier = NaiveBayesClassifier::new(corpus, cutoff)
        .with_context(|| format!("training on {} failed", corpus.display()))?;
    persist::save_model(&classifier, model_path)?;

    println!("Done");

    Ok(())
}

fn classify(model_path: &Path, output: Option<&Path>, documents: &[PathBuf]) -> Result<()> {
    let classifier = persist::load_model(model_path)?;

    let paths = corpus::expand_documents(documents)?;

    let results = match output {
        Some(out) => {
            let file = File::create(out)
                .with_context(|| format!("cannot create {}", out.display()))?;
            classifier.predict(&paths, file)?
        }
        None => classifier.predict(&paths, io::stdout().lock())?,
    };
    info!(documents = results.len(), "classified");

    Ok(())
}

fn evaluate(model_path: &Path, corpus: &Path, label: Option<Label>) -> Result<()> {
    let classifier = persist::load_model(model_path)?;
    let corpus = Corpus::open(corpus)?;

    let labels = match label {
        Some(label) => vec![label],
        None => Label::ALL.to_vec(),
    };
    let evaluation = classifier.evaluate(&corpus, &labels)?;

    println!(
        "accuracy: {:.4} ({}/{})",
        evaluation.accuracy(),
        evaluation.correct(),
        evaluation.total()
    );

    Ok(())
}
