//! Multi-source build driver.
//!
//! Each configured source is one Nmap report plus the vantage node it was
//! scanned from. Sources are processed in order into one shared
//! [`GraphAccumulator`]. A source is read completely before anything from it
//! reaches the accumulator, so a report that fails to parse contributes
//! nothing. Unreadable sources are logged and skipped; the build never aborts
//! because of one bad input.

use std::path::{Path, PathBuf};

use serde::Serialize;

use topograph_core::{GraphAccumulator, Node, SourceStats};

use crate::error::IngestError;
use crate::nmap::read_nmap_file;

/// One input report and the node it was scanned from.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub vantage: Node,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>, vantage: Node) -> Self {
        SourceSpec {
            path: path.into(),
            vantage,
        }
    }
}

/// What happened to one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ingested(SourceStats),
    Skipped { reason: String },
}

/// Outcome of one source within a build.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Per-source outcomes of a build, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub sources: Vec<SourceReport>,
}

impl BuildReport {
    pub fn ingested(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Ingested(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.sources.len() - self.ingested()
    }
}

/// Reads one source and ingests it into `acc`.
///
/// On error `acc` is left untouched.
pub fn ingest_file(acc: &mut GraphAccumulator, source: &SourceSpec) -> Result<SourceStats, IngestError> {
    let hosts = read_nmap_file(&source.path)?;
    Ok(acc.ingest_source(source.vantage.clone(), &hosts))
}

/// Processes every source in order, skipping the ones that cannot be read.
pub fn build_graph(acc: &mut GraphAccumulator, sources: &[SourceSpec]) -> BuildReport {
    let mut report = BuildReport::default();
    for source in sources {
        let status = match ingest_file(acc, source) {
            Ok(stats) => {
                tracing::info!(
                    path = %source.path.display(),
                    vantage = %source.vantage.id,
                    hosts = stats.hosts_added,
                    duplicates = stats.hosts_duplicate,
                    edges = stats.edges_added,
                    "ingested source"
                );
                SourceStatus::Ingested(stats)
            }
            Err(err) => {
                log_skip(&source.path, &err);
                SourceStatus::Skipped {
                    reason: err.to_string(),
                }
            }
        };
        report.sources.push(SourceReport {
            path: source.path.clone(),
            status,
        });
    }
    report
}

fn log_skip(path: &Path, err: &IngestError) {
    if err.is_input_error() {
        tracing::warn!(path = %path.display(), error = %err, "skipping source");
    } else {
        tracing::error!(path = %path.display(), error = %err, "skipping unreadable source");
    }
}
