//! Initial contact network construction
//!
//! Provides functions to create starting topologies:
//! - Empty: isolated nodes
//! - Complete: every node connected to every other
//! - Ring, line and star
//! - Erdős–Rényi: each pair connected independently with probability `p`
//! - Custom: build from an edge list

use flockwork_core::{ConfigError, ContactGraph, NodeId, SimRng};

/// Builder for standard starting topologies over nodes `0..node_count`
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder {
    node_count: usize,
}

impl GraphBuilder {
    pub fn new(node_count: usize) -> Self {
        Self { node_count }
    }

    /// No edges at all
    pub fn empty(self) -> ContactGraph {
        ContactGraph::new(self.node_count)
    }

    /// Every pair connected
    pub fn complete(self) -> ContactGraph {
        let mut graph = ContactGraph::new(self.node_count);
        for i in 0..self.node_count {
            for j in (i + 1)..self.node_count {
                graph.connect(i, j);
            }
        }
        graph
    }

    /// 0 - 1 - 2 - ... - (N-1) - 0
    pub fn ring(self) -> ContactGraph {
        let mut graph = self.line();
        if self.node_count > 2 {
            graph.connect(self.node_count - 1, 0);
        }
        graph
    }

    /// 0 - 1 - 2 - ... - (N-1)
    pub fn line(self) -> ContactGraph {
        let mut graph = ContactGraph::new(self.node_count);
        for i in 1..self.node_count {
            graph.connect(i - 1, i);
        }
        graph
    }

    /// Node 0 at the center, connected to all others
    pub fn star(self) -> ContactGraph {
        let mut graph = ContactGraph::new(self.node_count);
        for leaf in 1..self.node_count {
            graph.connect(0, leaf);
        }
        graph
    }

    /// G(N, p) random graph drawn from `rng`
    pub fn erdos_renyi(self, p: f64, rng: &mut SimRng) -> ContactGraph {
        let mut graph = ContactGraph::new(self.node_count);
        for i in 0..self.node_count {
            for j in (i + 1)..self.node_count {
                if rng.bernoulli(p) {
                    graph.connect(i, j);
                }
            }
        }
        graph
    }

    /// Custom edge list over this builder's nodes
    pub fn from_edges(
        self,
        edges: impl IntoIterator<Item = (NodeId, NodeId)>,
    ) -> Result<ContactGraph, ConfigError> {
        ContactGraph::from_edges(self.node_count, edges)
    }
}
