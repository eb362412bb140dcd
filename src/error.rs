use std::{io, path::PathBuf};

use thiserror::Error;

use crate::Label;

#[derive(Error, Debug)]
pub enum Error {
    /// The corpus root has no subdirectory for one of the labels.
    #[error("corpus {} has no `{label}` subdirectory", root.display())]
    MissingLabel { root: PathBuf, label: Label },

    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed model file {}: {source}", path.display())]
    Model {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
