//! Topology: a petgraph view over a finished [`GraphDocument`] for
//! path queries and summary statistics.
//!
//! Vertices are keyed by node id. Every id referenced by an edge gets a
//! vertex, including placeholder hops and stitch targets that have no
//! [`crate::model::Node`] record of their own.

use indexmap::IndexMap;
use petgraph::algo::astar;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::Directed;

use crate::model::{Edge, GraphDocument};
use crate::trace::is_placeholder;

/// Directed topology graph built from a document.
#[derive(Debug, Clone)]
pub struct Topology {
    graph: StableGraph<String, Edge, Directed, u32>,
    index: IndexMap<String, NodeIndex<u32>>,
}

impl Topology {
    /// Builds the topology. Node records come first (in document order),
    /// then any ids only seen on edges.
    pub fn from_document(doc: &GraphDocument) -> Self {
        let mut topology = Topology {
            graph: StableGraph::new(),
            index: IndexMap::new(),
        };
        for node in &doc.nodes {
            topology.vertex(&node.id);
        }
        for edge in &doc.edges {
            let from = topology.vertex(&edge.from);
            let to = topology.vertex(&edge.to);
            topology.graph.add_edge(from, to, edge.clone());
        }
        topology
    }

    fn vertex(&mut self, id: &str) -> NodeIndex<u32> {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Returns a read-only reference to the underlying graph.
    pub fn graph(&self) -> &StableGraph<String, Edge, Directed, u32> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of vertices that stand for inferred, unobserved hops.
    pub fn placeholder_count(&self) -> usize {
        self.index.keys().filter(|id| is_placeholder(id)).count()
    }

    /// Returns `true` if `id` appears anywhere in the topology.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Fewest-hop directed path from `from` to `to`, as a list of ids
    /// including both endpoints. `None` if either id is unknown or `to`
    /// is unreachable.
    pub fn path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let start = *self.index.get(from)?;
        let goal = *self.index.get(to)?;
        let (_, route) = astar(&self.graph, start, |n| n == goal, |_| 1u32, |_| 0u32)?;
        Some(route.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }
}
