//! Host records: the scanner-neutral input shape, and their normalization
//! into graph [`Node`]s.
//!
//! Adapters for concrete report formats produce [`HostRecord`] values; the
//! accumulator only ever sees this shape.

use serde::{Deserialize, Serialize};

use crate::model::{Node, OpenPort, UNKNOWN_STATE};

/// Port state label that marks a port as worth keeping.
pub const PORT_STATE_OPEN: &str = "open";

/// Service label used when the scanner did not identify one.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// One reported hop of a traced path.
///
/// `ip` is `None` for a hop that was listed but did not respond.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub ttl: u8,
    pub ip: Option<String>,
}

impl Hop {
    pub fn new(ttl: u8, ip: impl Into<String>) -> Self {
        Hop {
            ttl,
            ip: Some(ip.into()),
        }
    }

    pub fn silent(ttl: u8) -> Self {
        Hop { ttl, ip: None }
    }
}

/// One port entry as reported by the scanner, in any state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortObservation {
    pub port: u16,
    pub protocol: String,
    pub state: String,
    pub service: Option<String>,
    pub version: Option<String>,
}

/// A single scanned host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub address: String,
    pub state: Option<String>,
    pub hostname: Option<String>,
    pub mac_address: Option<String>,
    pub vendor: Option<String>,
    pub os: Option<String>,
    pub ports: Vec<PortObservation>,
    /// `None` when the report carried no trace section for this host, which
    /// is different from a trace section with zero hops.
    pub trace: Option<Vec<Hop>>,
}

impl HostRecord {
    pub fn new(address: impl Into<String>) -> Self {
        HostRecord {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Normalizes this record into a graph node.
    ///
    /// Only ports in the `open` state are kept. Missing attributes fall back
    /// to the [`Node::new`] defaults.
    pub fn to_node(&self) -> Node {
        let mut node = Node::new(self.address.clone());
        node.state = self
            .state
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATE.to_string());
        node.hostname = self.hostname.clone();
        if let Some(mac) = &self.mac_address {
            node.mac_address = mac.clone();
        }
        if let Some(vendor) = &self.vendor {
            node.vendor = vendor.clone();
        }
        node.os = self.os.clone();
        node.open_ports = self
            .ports
            .iter()
            .filter(|p| p.state == PORT_STATE_OPEN)
            .map(|p| OpenPort {
                port: p.port,
                protocol: p.protocol.clone(),
                service: p
                    .service
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_SERVICE.to_string()),
                version: p.version.clone(),
            })
            .collect();
        node
    }
}
