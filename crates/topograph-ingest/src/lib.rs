//! Input and output adapters for topograph.
//!
//! Turns scanner reports into the core data model and writes finished
//! documents back out:
//!
//! - [`nmap`]: Nmap XML reports into [`topograph_core::HostRecord`]s
//! - [`fscan`]: fscan text reports into [`topograph_core::MergedHost`]s
//! - [`output`]: atomic JSON writers and document readers
//! - [`session`]: the multi-source build driver and its skip policy
//! - [`error`]: IngestError covering missing, malformed, and unwritable files

pub mod error;
pub mod fscan;
pub mod nmap;
pub mod output;
pub mod session;

pub use error::IngestError;
pub use fscan::{parse_fscan, read_fscan_file};
pub use nmap::{parse_nmap, read_nmap_file, NmapParseError};
pub use output::{read_graph, read_merged_hosts, write_json};
pub use session::{build_graph, ingest_file, BuildReport, SourceReport, SourceSpec, SourceStatus};
