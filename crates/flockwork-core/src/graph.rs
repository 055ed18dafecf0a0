//! Contact graph over a fixed node set
//!
//! Adjacency is stored as one ordered neighbor set per node. Every edge is
//! recorded in both endpoints' sets; `connect`, `disconnect` and
//! `clear_neighbors` are the only mutators and all of them keep the two
//! copies in step.

use std::collections::BTreeSet;

use crate::error::{ConfigError, InvariantError};
use crate::types::{Edge, NodeId};

/// Symmetric adjacency structure over nodes `0..node_count`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactGraph {
    adjacency: Vec<BTreeSet<NodeId>>,
    edge_count: usize,
}

impl ContactGraph {
    /// Create a graph of isolated nodes
    pub fn new(node_count: usize) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); node_count],
            edge_count: 0,
        }
    }

    /// Build a graph from an edge list, rejecting out-of-range ids and self-loops
    ///
    /// Duplicate edges (in either orientation) collapse into one.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        if node_count == 0 {
            return Err(ConfigError::EmptyNetwork);
        }

        let mut graph = Self::new(node_count);
        for (a, b) in edges {
            for node in [a, b] {
                if node >= node_count {
                    return Err(ConfigError::NodeOutOfRange { node, node_count });
                }
            }
            if a == b {
                return Err(ConfigError::SelfLoop { node: a });
            }
            graph.connect(a, b);
        }
        Ok(graph)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Neighbors of `node`
    pub fn neighbors(&self, node: NodeId) -> &BTreeSet<NodeId> {
        &self.adjacency[node]
    }

    /// Degree of `node`
    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency[node].len()
    }

    /// Check if two nodes are directly connected
    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency[a].contains(&b)
    }

    /// Add an edge; returns `false` if it already existed or `a == b`
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        let inserted = self.adjacency[a].insert(b);
        if inserted {
            self.adjacency[b].insert(a);
            self.edge_count += 1;
        }
        inserted
    }

    /// Remove an edge; returns `false` if it did not exist
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> bool {
        let removed = self.adjacency[a].remove(&b);
        if removed {
            self.adjacency[b].remove(&a);
            self.edge_count -= 1;
        }
        removed
    }

    /// Disconnect `node` from all of its neighbors, returning them in ascending order
    pub fn clear_neighbors(&mut self, node: NodeId) -> Vec<NodeId> {
        let former = std::mem::take(&mut self.adjacency[node]);
        for &neighbor in &former {
            self.adjacency[neighbor].remove(&node);
        }
        self.edge_count -= former.len();
        former.into_iter().collect()
    }

    /// All edges in canonical ascending order
    pub fn edges(&self) -> Vec<Edge> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(node, neighbors)| {
                neighbors
                    .range(node + 1..)
                    .map(move |&other| Edge::new(node, other))
            })
            .collect()
    }

    /// Mean degree computed from scratch
    pub fn mean_degree(&self) -> f64 {
        2.0 * self.edge_count as f64 / self.node_count() as f64
    }

    /// Verify that every neighbor relation is mirrored and the edge counter matches
    pub fn check_symmetry(&self) -> Result<(), InvariantError> {
        let mut half_edges = 0;
        for (node, neighbors) in self.adjacency.iter().enumerate() {
            for &other in neighbors {
                if other == node || !self.adjacency[other].contains(&node) {
                    return Err(InvariantError::AsymmetricAdjacency { a: node, b: other });
                }
            }
            half_edges += neighbors.len();
        }
        if half_edges != 2 * self.edge_count {
            return Err(InvariantError::IndexMismatch {
                index: "edge_count",
                detail: format!(
                    "counter says {} edges, adjacency holds {}",
                    self.edge_count,
                    half_edges / 2
                ),
            });
        }
        Ok(())
    }
}
