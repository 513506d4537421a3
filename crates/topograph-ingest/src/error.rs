//! Error types for topograph-ingest.
//!
//! [`IngestError`] separates the two input failures that cause a source to
//! be skipped (missing, malformed) from output failures that end a run.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while reading reports or writing documents.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input file does not exist.
    #[error("input not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// The input file exists but could not be parsed.
    #[error("malformed input {}: {reason}", path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// Any other filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Serializing an output document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The finished temp file could not be moved into place.
    #[error("failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    /// Returns `true` for input failures that skip a single source rather
    /// than ending the run.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            IngestError::MissingInput { .. } | IngestError::MalformedInput { .. }
        )
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        IngestError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(path: &Path, reason: impl ToString) -> Self {
        IngestError::MalformedInput {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Opens an input file, mapping "not found" to [`IngestError::MissingInput`].
pub(crate) fn open_input(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => IngestError::MissingInput {
            path: path.to_path_buf(),
        },
        _ => IngestError::io(path, e),
    })
}
