//! Identity keys for node and edge deduplication.
//!
//! [`node_key`] and [`edge_key`] are the only place that decides whether two
//! observations describe "the same" entity. Keys are plain owned tuples so
//! they can be used directly as map keys and compared in tests.
//!
//! Node identity deliberately covers only `(id, macAddress, os, vendor)`:
//! two observations of a host that differ only in state, hostname, or ports
//! share a key, and the later one is dropped by the accumulator.

use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node};

/// Deduplication key for a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub id: String,
    pub mac_address: String,
    pub os: Option<String>,
    pub vendor: String,
}

/// Deduplication key for an [`Edge`]: all five fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
    pub edge_type: String,
    pub protocol: String,
    pub layer: String,
}

/// Computes the identity key of a node.
pub fn node_key(node: &Node) -> NodeKey {
    NodeKey {
        id: node.id.clone(),
        mac_address: node.mac_address.clone(),
        os: node.os.clone(),
        vendor: node.vendor.clone(),
    }
}

/// Computes the identity key of an edge.
pub fn edge_key(edge: &Edge) -> EdgeKey {
    EdgeKey {
        from: edge.from.clone(),
        to: edge.to.clone(),
        edge_type: edge.edge_type.clone(),
        protocol: edge.protocol.clone(),
        layer: edge.layer.clone(),
    }
}
