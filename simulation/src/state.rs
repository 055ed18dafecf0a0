//! Coupled network and epidemic state
//!
//! [`NetworkState`] owns the contact graph, the status vector and every
//! index derived from them. The graph and statuses are private: the only way
//! to change either is through [`NetworkState::connect`],
//! [`NetworkState::disconnect`], [`NetworkState::isolate`] and
//! [`NetworkState::set_status`], each of which brings the SI-edge index,
//! the infected and recovered indices and the mean-degree counter back in
//! line before returning.

use flockwork_core::types::is_si_pair;
use flockwork_core::{ContactGraph, Edge, InvariantError, NodeId, SampleSet, Status};
use tracing::trace;

use crate::rewiring::EdgeDiff;

/// Graph, statuses and derived indices, mutated in lockstep
#[derive(Debug, Clone)]
pub struct NetworkState {
    graph: ContactGraph,
    status: Vec<Status>,
    si_edges: SampleSet<Edge>,
    infected: SampleSet<NodeId>,
    recovered: SampleSet<NodeId>,
    mean_degree: f64,
}

impl NetworkState {
    /// Wrap a graph with every node susceptible
    pub fn new(graph: ContactGraph) -> Self {
        let node_count = graph.node_count();
        let mean_degree = graph.mean_degree();
        Self {
            graph,
            status: vec![Status::Susceptible; node_count],
            si_edges: SampleSet::new(),
            infected: SampleSet::new(),
            recovered: SampleSet::new(),
            mean_degree,
        }
    }

    pub fn graph(&self) -> &ContactGraph {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.status.len()
    }

    pub fn status(&self, node: NodeId) -> Status {
        self.status[node]
    }

    pub fn statuses(&self) -> &[Status] {
        &self.status
    }

    /// Edges joining one susceptible and one infected node
    pub fn si_edges(&self) -> &SampleSet<Edge> {
        &self.si_edges
    }

    pub fn infected(&self) -> &SampleSet<NodeId> {
        &self.infected
    }

    pub fn recovered(&self) -> &SampleSet<NodeId> {
        &self.recovered
    }

    pub fn susceptible_count(&self) -> usize {
        self.node_count() - self.infected.len() - self.recovered.len()
    }

    /// Running mean degree, updated per edge change
    pub fn mean_degree(&self) -> f64 {
        self.mean_degree
    }

    /// Add edge `a`–`b`; returns the edge if it was newly created
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Option<Edge> {
        if !self.graph.connect(a, b) {
            return None;
        }
        let edge = Edge::new(a, b);
        if is_si_pair(self.status[a], self.status[b]) {
            self.si_edges.insert(edge);
        }
        self.mean_degree += self.degree_step();
        Some(edge)
    }

    /// Remove edge `a`–`b`; returns the edge if it existed
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> Option<Edge> {
        if !self.graph.disconnect(a, b) {
            return None;
        }
        let edge = Edge::new(a, b);
        self.si_edges.remove(&edge);
        self.mean_degree -= self.degree_step();
        Some(edge)
    }

    /// Remove every edge incident to `node`, returning them in ascending order
    pub fn isolate(&mut self, node: NodeId) -> Vec<Edge> {
        let former = self.graph.clear_neighbors(node);
        let step = self.degree_step();
        former
            .into_iter()
            .map(|neighbor| {
                let edge = Edge::new(node, neighbor);
                self.si_edges.remove(&edge);
                self.mean_degree -= step;
                edge
            })
            .collect()
    }

    /// Apply removals then additions from a diff
    pub fn apply(&mut self, diff: &EdgeDiff) {
        for edge in &diff.removed {
            let (a, b) = edge.endpoints();
            self.disconnect(a, b);
        }
        for edge in &diff.added {
            let (a, b) = edge.endpoints();
            self.connect(a, b);
        }
    }

    /// Change the status of `node`, returning the previous one
    ///
    /// Every incident edge has its SI membership recomputed against the
    /// neighbor's current status.
    pub fn set_status(&mut self, node: NodeId, status: Status) -> Status {
        let previous = std::mem::replace(&mut self.status[node], status);
        if previous == status {
            return previous;
        }

        match previous {
            Status::Infected => {
                self.infected.remove(&node);
            }
            Status::Recovered => {
                self.recovered.remove(&node);
            }
            Status::Susceptible => {}
        }
        match status {
            Status::Infected => {
                self.infected.insert(node);
            }
            Status::Recovered => {
                self.recovered.insert(node);
            }
            Status::Susceptible => {}
        }

        for &neighbor in self.graph.neighbors(node) {
            let edge = Edge::new(node, neighbor);
            if is_si_pair(status, self.status[neighbor]) {
                self.si_edges.insert(edge);
            } else {
                self.si_edges.remove(&edge);
            }
        }

        trace!(node, from = %previous, to = %status, "status change");
        previous
    }

    /// Recompute every derived structure from scratch and compare
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.graph.check_symmetry()?;

        for edge in self.si_edges.iter() {
            let (a, b) = edge.endpoints();
            if !self.graph.are_connected(a, b) {
                return Err(InvariantError::IndexMismatch {
                    index: "si_edges",
                    detail: format!("{edge} is indexed but not in the graph"),
                });
            }
            if !is_si_pair(self.status[a], self.status[b]) {
                return Err(InvariantError::NotAnSiEdge {
                    edge: *edge,
                    left: self.status[a],
                    right: self.status[b],
                });
            }
        }
        let expected_si = self
            .graph
            .edges()
            .into_iter()
            .filter(|edge| {
                let (a, b) = edge.endpoints();
                is_si_pair(self.status[a], self.status[b])
            })
            .count();
        if expected_si != self.si_edges.len() {
            return Err(InvariantError::IndexMismatch {
                index: "si_edges",
                detail: format!(
                    "{} SI edges in the graph, {} indexed",
                    expected_si,
                    self.si_edges.len()
                ),
            });
        }

        self.check_status_index("infected", &self.infected, Status::Infected)?;
        self.check_status_index("recovered", &self.recovered, Status::Recovered)?;

        let actual = self.graph.mean_degree();
        if (actual - self.mean_degree).abs() > 1e-9 * actual.max(1.0) {
            return Err(InvariantError::IndexMismatch {
                index: "mean_degree",
                detail: format!("tracked {}, recomputed {}", self.mean_degree, actual),
            });
        }
        Ok(())
    }

    fn check_status_index(
        &self,
        index: &'static str,
        set: &SampleSet<NodeId>,
        status: Status,
    ) -> Result<(), InvariantError> {
        let mut expected = 0;
        for (node, &current) in self.status.iter().enumerate() {
            if current == status {
                expected += 1;
                if !set.contains(&node) {
                    return Err(InvariantError::IndexMismatch {
                        index,
                        detail: format!("node {node} is {status} but not indexed"),
                    });
                }
            }
        }
        if expected != set.len() {
            return Err(InvariantError::IndexMismatch {
                index,
                detail: format!("{} nodes are {}, {} indexed", expected, status, set.len()),
            });
        }
        Ok(())
    }

    fn degree_step(&self) -> f64 {
        2.0 / self.node_count() as f64
    }
}
