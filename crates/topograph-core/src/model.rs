//! Graph data model: network nodes, typed edges, and the serialized document.
//!
//! Field names on the wire are part of the output contract consumed by
//! visualization tools, so every struct pins its serde names explicitly.
//! Optional fields serialize as `null` rather than being omitted.

use serde::{Deserialize, Serialize};

/// Default node category for scanned hosts.
pub const DEFAULT_KIND: &str = "device";

/// Vendor label used when no MAC vendor lookup is available.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Sentinel MAC address for hosts whose hardware address was not observed.
pub const ZERO_MAC: &str = "00:00:00:00:00:00";

/// Reachability label used when the scan did not report a host state.
pub const UNKNOWN_STATE: &str = "unknown";

/// Edge type emitted by trace reconstruction.
pub const EDGE_TYPE_TRACEROUTE: &str = "traceroute";

/// Protocol label for traceroute edges.
pub const PROTOCOL_ICMP: &str = "ICMP";

/// Network layer label for routed (IP-level) edges.
pub const LAYER_3: &str = "Layer 3";

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// One open port observed on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPort {
    pub port: u16,
    pub protocol: String,
    pub service: String,
    pub version: Option<String>,
}

/// A network-reachable entity in the topology graph.
///
/// `id` is normally the observed IP address. Trace reconstruction may also
/// reference placeholder ids (see [`crate::trace::placeholder_id`]) in edges
/// without ever creating a `Node` for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(rename = "reverseDNS")]
    pub reverse_dns: String,
    #[serde(default = "default_mac")]
    pub mac_address: String,
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default)]
    pub open_ports: Vec<OpenPort>,
    #[serde(default)]
    pub os: Option<String>,
}

impl Node {
    /// Creates a node with every attribute at its default: kind `device`,
    /// state `unknown`, reverse DNS equal to `id`, zero MAC, unknown vendor,
    /// no ports and no OS label.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Node {
            reverse_dns: id.clone(),
            id,
            kind: default_kind(),
            state: default_state(),
            hostname: None,
            mac_address: default_mac(),
            vendor: default_vendor(),
            open_ports: Vec::new(),
            os: None,
        }
    }

    /// Returns the port numbers of this node's open ports, in order.
    pub fn port_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.open_ports.iter().map(|p| p.port)
    }
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

fn default_state() -> String {
    UNKNOWN_STATE.to_string()
}

fn default_mac() -> String {
    ZERO_MAC.to_string()
}

fn default_vendor() -> String {
    UNKNOWN_VENDOR.to_string()
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// A directed, typed connection between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub edge_type: String,
    pub protocol: String,
    pub layer: String,
}

impl Edge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        edge_type: impl Into<String>,
        protocol: impl Into<String>,
        layer: impl Into<String>,
    ) -> Self {
        Edge {
            from: from.into(),
            to: to.into(),
            edge_type: edge_type.into(),
            protocol: protocol.into(),
            layer: layer.into(),
        }
    }

    /// Creates a `traceroute` / `ICMP` / `Layer 3` edge, the only kind the
    /// trace reconstructor emits.
    pub fn traceroute(from: impl Into<String>, to: impl Into<String>) -> Self {
        Edge::new(from, to, EDGE_TYPE_TRACEROUTE, PROTOCOL_ICMP, LAYER_3)
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The finished graph of one build: nodes and edges in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}
