//! JSON document writers and readers.
//!
//! Writes go to a temp file in the destination directory which is renamed
//! over the target only once fully written and synced, so a failed run never
//! leaves a truncated document under the final name.

use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use topograph_core::{GraphDocument, MergedHost};

use crate::error::{open_input, IngestError};

/// Indentation used for every written document.
const INDENT: &[u8] = b"    ";

/// Serializes `value` as pretty-printed JSON and atomically places it at `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IngestError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| IngestError::io(dir, e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let mut ser =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(INDENT));
        value.serialize(&mut ser)?;
        writer.write_all(b"\n").map_err(|e| IngestError::io(path, e))?;
        writer.flush().map_err(|e| IngestError::io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| IngestError::io(path, e))?;

    tmp.persist(path).map_err(|e| IngestError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    tracing::info!(path = %path.display(), "wrote document");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, IngestError> {
    let file = open_input(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            IngestError::io(path, e.into())
        } else {
            IngestError::malformed(path, e)
        }
    })
}

/// Loads a previously written graph document.
pub fn read_graph(path: &Path) -> Result<GraphDocument, IngestError> {
    read_json(path)
}

/// Loads a list of per-IP merged host records.
pub fn read_merged_hosts(path: &Path) -> Result<Vec<MergedHost>, IngestError> {
    read_json(path)
}
