use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use serde::de::Error as _;
use tempfile::NamedTempFile;
use tracing::info;

use crate::{Error, NaiveBayesClassifier, Result};

/// Writes the model as JSON. The file is replaced atomically.
pub fn save_model(model: &NaiveBayesClassifier, path: &Path) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(|e| Error::write(parent_dir, e))?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| Error::write(parent_dir, e))?;
    write_model(model, BufWriter::new(temp_file.as_file()), path)?;

    temp_file
        .persist(path)
        .map_err(|e| Error::write(path, e.error))?;
    info!(path = %path.display(), "saved model");

    Ok(())
}

/// Serializing a model can only fail on the writer, so every failure is a
/// write error on `path`.
fn write_model<W: Write>(model: &NaiveBayesClassifier, mut writer: W, path: &Path) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, model)
        .map_err(|e| Error::write(path, io::Error::from(e)))?;
    writer.flush().map_err(|e| Error::write(path, e))
}

pub fn load_model(path: &Path) -> Result<NaiveBayesClassifier> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let model: NaiveBayesClassifier = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| Error::Model {
            path: path.to_path_buf(),
            source,
        })?;

    model.check().map_err(|problem| Error::Model {
        path: path.to_path_buf(),
        source: serde_json::Error::custom(problem),
    })?;

    Ok(model)
}
