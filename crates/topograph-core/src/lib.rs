pub mod model;
pub mod identity;
pub mod host;
pub mod trace;
pub mod accumulator;
pub mod merge;
pub mod topology;

// Re-export commonly used types
pub use model::{Edge, GraphDocument, Node, OpenPort};
pub use identity::{edge_key, node_key, EdgeKey, NodeKey};
pub use host::{Hop, HostRecord, PortObservation};
pub use trace::{is_placeholder, placeholder_id, reconstruct};
pub use accumulator::{GraphAccumulator, HostOutcome, SourceStats};
pub use merge::{merge_fragment, Fingerprint, MergeSummary, MergedHost, Vulnerability, Website};
pub use topology::Topology;
