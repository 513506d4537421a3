//! GraphAccumulator: the running node/edge collections of one build session.
//!
//! All deduplication goes through [`node_key`] and [`edge_key`]. Insertion
//! order is preserved for output. The accumulator is an explicit value owned
//! by the caller; independent sources can be processed into separate
//! accumulators and combined later with [`crate::merge`].
//!
//! # Host processing
//!
//! [`GraphAccumulator::ingest_source`] seeds the vantage node first, then
//! processes each host record in turn. A host whose node is accepted has its
//! trace reconstructed and every resulting edge offered to
//! [`GraphAccumulator::add_edge`]. A host whose node key is already present
//! is dropped entirely, trace included, even if the later record is richer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::host::HostRecord;
use crate::identity::{edge_key, node_key, EdgeKey, NodeKey};
use crate::model::{Edge, GraphDocument, Node};
use crate::trace::reconstruct;

/// Result of offering one host record to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOutcome {
    /// The host node was new. `edges_added` counts the trace edges that were
    /// not already present.
    Added { edges_added: usize },
    /// A node with the same identity key was already present; nothing from
    /// this record was stored.
    Duplicate,
}

/// Counters for one input source processed by [`GraphAccumulator::ingest_source`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    /// Whether the vantage node was new to this accumulator.
    pub vantage_added: bool,
    pub hosts_seen: usize,
    pub hosts_added: usize,
    pub hosts_duplicate: usize,
    pub edges_added: usize,
}

/// Deduplicating, insertion-ordered node and edge store.
#[derive(Debug, Clone, Default)]
pub struct GraphAccumulator {
    nodes: IndexMap<NodeKey, Node>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Primitive operations
    // -----------------------------------------------------------------------

    /// Inserts `node` if its identity key is new. Returns `true` if stored.
    pub fn add_node(&mut self, node: Node) -> bool {
        let key = node_key(&node);
        if self.nodes.contains_key(&key) {
            return false;
        }
        self.nodes.insert(key, node);
        true
    }

    /// Inserts `edge` if its identity key is new. Returns `true` if stored.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let key = edge_key(&edge);
        if self.edges.contains_key(&key) {
            return false;
        }
        self.edges.insert(key, edge);
        true
    }

    /// Returns `true` if a node with the same identity key is present.
    pub fn contains_node(&self, node: &Node) -> bool {
        self.nodes.contains_key(&node_key(node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates stored nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates stored edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Consumes the accumulator and returns the ordered collections.
    pub fn finalize(self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.into_values().collect(),
            edges: self.edges.into_values().collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Host processing
    // -----------------------------------------------------------------------

    /// Processes one host record traced from `source_id`.
    ///
    /// A record with no trace section contributes its node only.
    pub fn ingest_host(&mut self, source_id: &str, host: &HostRecord) -> HostOutcome {
        let node = host.to_node();
        if !self.add_node(node) {
            tracing::debug!(host = %host.address, "duplicate host observation dropped");
            return HostOutcome::Duplicate;
        }

        let mut edges_added = 0;
        if let Some(hops) = &host.trace {
            for edge in reconstruct(source_id, &host.address, hops) {
                if self.add_edge(edge) {
                    edges_added += 1;
                }
            }
        }
        HostOutcome::Added { edges_added }
    }

    /// Processes every host of one input source, seeding `vantage` first.
    ///
    /// The vantage node is added before any host, so a host record that
    /// shares its identity key is dropped in favor of the seed.
    pub fn ingest_source<'a>(
        &mut self,
        vantage: Node,
        hosts: impl IntoIterator<Item = &'a HostRecord>,
    ) -> SourceStats {
        let source_id = vantage.id.clone();
        let mut stats = SourceStats {
            vantage_added: self.add_node(vantage),
            ..Default::default()
        };

        for host in hosts {
            stats.hosts_seen += 1;
            match self.ingest_host(&source_id, host) {
                HostOutcome::Added { edges_added } => {
                    stats.hosts_added += 1;
                    stats.edges_added += edges_added;
                }
                HostOutcome::Duplicate => stats.hosts_duplicate += 1,
            }
        }

        tracing::debug!(
            source = %source_id,
            hosts = stats.hosts_seen,
            added = stats.hosts_added,
            duplicate = stats.hosts_duplicate,
            edges = stats.edges_added,
            "ingested source"
        );
        stats
    }
}
