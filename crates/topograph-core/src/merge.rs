//! Multi-source merging of a graph fragment into per-IP host records.
//!
//! The merger enriches an already-persisted list of [`MergedHost`] entries
//! (for example an fscan report) with the nodes of a [`GraphDocument`]
//! produced by a different extraction pass. Entries are matched by IP alone,
//! not by the accumulator's identity key: the goal here is to combine what
//! every source learned about a host, not to reject exact duplicates.
//!
//! Merging only ever adds. Ports are unioned by number (existing ports keep
//! their position, new ones are appended in encounter order) and OS labels
//! accumulate into `osinfo` without repeats. Edges are not reconciled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{GraphDocument, Node};

/// A web endpoint observed on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub url: String,
    pub status_code: u16,
    pub length: u64,
    pub title: Option<String>,
    pub redirect: Option<String>,
}

/// A product or framework fingerprint matched on a target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub target: String,
    pub fingerprint: String,
}

/// A vulnerability or weak-credential finding.
///
/// Different report lines carry different subsets of the optional fields;
/// absent ones are left out of the serialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
}

/// Everything known about one IP across merged sources.
///
/// Every list defaults to empty when absent from a loaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedHost {
    pub ip: String,
    #[serde(default)]
    pub open_ports: Vec<u16>,
    #[serde(default)]
    pub websites: Vec<Website>,
    #[serde(default)]
    pub netbios: Vec<String>,
    #[serde(default)]
    pub osinfo: Vec<String>,
    #[serde(default)]
    pub fingerprints: Vec<Fingerprint>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

impl MergedHost {
    pub fn new(ip: impl Into<String>) -> Self {
        MergedHost {
            ip: ip.into(),
            ..Default::default()
        }
    }

    /// Adds `port` unless already listed.
    pub fn add_port(&mut self, port: u16) -> bool {
        if self.open_ports.contains(&port) {
            return false;
        }
        self.open_ports.push(port);
        true
    }

    /// Adds an OS observation unless already listed.
    pub fn add_os(&mut self, os: &str) -> bool {
        if self.osinfo.iter().any(|seen| seen == os) {
            return false;
        }
        self.osinfo.push(os.to_string());
        true
    }

    /// Folds one graph node's ports and OS label into this entry.
    fn absorb(&mut self, node: &Node) {
        for port in node.port_numbers() {
            self.add_port(port);
        }
        if let Some(os) = &node.os {
            self.add_os(os);
        }
    }
}

/// Counts of what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Secondary nodes folded into an existing entry.
    pub enriched: usize,
    /// Secondary nodes that created a new entry.
    pub appended: usize,
}

/// Merges the nodes of `secondary` into `primary`, matching on IP.
///
/// When `primary` lists the same IP more than once, the first entry is
/// the one enriched.
pub fn merge_fragment(primary: &mut Vec<MergedHost>, secondary: &GraphDocument) -> MergeSummary {
    let mut index: IndexMap<String, usize> = IndexMap::new();
    for (pos, entry) in primary.iter().enumerate() {
        index.entry(entry.ip.clone()).or_insert(pos);
    }

    let mut summary = MergeSummary::default();
    for node in &secondary.nodes {
        match index.get(&node.id) {
            Some(&pos) => {
                primary[pos].absorb(node);
                summary.enriched += 1;
            }
            None => {
                let mut entry = MergedHost::new(node.id.clone());
                entry.absorb(node);
                index.insert(node.id.clone(), primary.len());
                primary.push(entry);
                summary.appended += 1;
            }
        }
    }

    tracing::info!(
        enriched = summary.enriched,
        appended = summary.appended,
        total = primary.len(),
        "merged graph fragment"
    );
    summary
}
