//! Dataset persistence
//!
//! A dataset is a JSON array of [`MetricsRecord`] values. Writes always render
//! the complete sequence to a temporary file next to the destination and
//! rename it into place, so readers never observe a partial array.

use crate::url::RepositoryReference;
use crate::DatasetError;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Popularity metrics for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// The repository these metrics belong to (`owner` and `name` fields)
    #[serde(flatten)]
    pub repository: RepositoryReference,

    /// Link the repository was found under on the source page
    pub url: String,

    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
}

/// Writes the full record sequence to `path`, replacing any previous content
///
/// Parent directories are created as needed.
pub fn save_dataset(path: &Path, records: &[MetricsRecord]) -> Result<(), DatasetError> {
    let write_err = |source: std::io::Error| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let file = NamedTempFile::new_in(&parent).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(file.as_file());
        serde_json::to_writer_pretty(&mut writer, records)
            .map_err(|e| write_err(std::io::Error::from(e)))?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    file.persist(path).map_err(|e| write_err(e.error))?;

    tracing::debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Loads a dataset written by [`save_dataset`]
///
/// # Returns
///
/// * `Ok(Vec<MetricsRecord>)` - Records in file order
/// * `Err(DatasetError::NotFound)` - The file does not exist
/// * `Err(DatasetError::Malformed)` - The content is not an array of records
pub fn load_dataset(path: &Path) -> Result<Vec<MetricsRecord>, DatasetError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(DatasetError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    serde_json::from_str(&content).map_err(|e| DatasetError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Loads a dataset, treating a missing file as empty
pub fn load_dataset_if_exists(path: &Path) -> Result<Vec<MetricsRecord>, DatasetError> {
    match load_dataset(path) {
        Err(DatasetError::NotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}
