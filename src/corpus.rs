//! Locating labeled documents on disk and reading their tokens.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{Error, Label, Result};

/// A corpus root with one subdirectory per label, named `2016` and `2020`.
#[derive(Debug, Clone)]
pub struct Corpus {
    dir_2016: PathBuf,
    dir_2020: PathBuf,
}

impl Corpus {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let label_dir = |label: Label| -> Result<PathBuf> {
            let dir = root.join(label.as_str());
            if dir.is_dir() {
                Ok(dir)
            } else {
                Err(Error::MissingLabel {
                    root: root.to_path_buf(),
                    label,
                })
            }
        };

        Ok(Corpus {
            dir_2016: label_dir(Label::Y2016)?,
            dir_2020: label_dir(Label::Y2020)?,
        })
    }

    pub fn dir(&self, label: Label) -> &Path {
        match label {
            Label::Y2016 => &self.dir_2016,
            Label::Y2020 => &self.dir_2020,
        }
    }

    /// Files under the label's directory, sorted by path.
    pub fn documents(&self, label: Label) -> Result<Vec<PathBuf>> {
        list_documents(self.dir(label))
    }
}

/// Regular files directly inside `dir`, sorted by path.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    debug!(dir = %dir.display(), documents = paths.len(), "listed documents");

    Ok(paths)
}

/// Replaces each directory among `paths` with the documents inside it.
/// Everything else is kept as given, in order.
pub fn expand_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            documents.extend(list_documents(path)?);
        } else {
            documents.push(path.clone());
        }
    }
    Ok(documents)
}

/// Splits on `\n`, `\r\n` and a lone `\r`. A trailing line break does not
/// start another line.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (line, tail) = match rest.find(|c: char| c == '\n' || c == '\r') {
            Some(end) => {
                let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                (&rest[..end], &rest[end + skip..])
            }
            None => (rest, ""),
        };
        rest = tail;
        Some(line)
    })
}

/// One token per line. Fails on data that isn't valid UTF-8.
pub fn read_tokens(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(lines(&text).map(str::to_string).collect())
}

/// Like [`read_tokens`], but invalid UTF-8 sequences are dropped and each line
/// is trimmed on both ends.
pub fn read_tokens_lossy(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    Ok(lines(&text).map(|line| line.trim().to_string()).collect())
}
