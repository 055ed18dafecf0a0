//! Core types for Flockwork simulations
//!
//! Nodes are dense integer ids in `[0, N)`. Edges are unordered pairs stored
//! in canonical (smaller id first) order so that `(i, j)` and `(j, i)` are the
//! same key everywhere.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifier of a node in the contact network
pub type NodeId = usize;

/// An undirected edge between two distinct nodes, smaller id first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[display("({_0}, {_1})")]
#[serde(from = "(NodeId, NodeId)", into = "(NodeId, NodeId)")]
pub struct Edge(NodeId, NodeId);

impl Edge {
    /// Create the canonical edge for the pair `a`, `b`
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// The endpoint with the smaller id
    pub fn low(&self) -> NodeId {
        self.0
    }

    /// The endpoint with the larger id
    pub fn high(&self) -> NodeId {
        self.1
    }

    /// Both endpoints, smaller id first
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.0, self.1)
    }

    /// Check whether `node` is one of the endpoints
    pub fn contains(&self, node: NodeId) -> bool {
        self.0 == node || self.1 == node
    }

    /// The endpoint opposite to `node`, if `node` is on this edge
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.0 {
            Some(self.1)
        } else if node == self.1 {
            Some(self.0)
        } else {
            None
        }
    }
}

impl From<(NodeId, NodeId)> for Edge {
    fn from((a, b): (NodeId, NodeId)) -> Self {
        Self::new(a, b)
    }
}

impl From<Edge> for (NodeId, NodeId) {
    fn from(edge: Edge) -> Self {
        edge.endpoints()
    }
}

/// Epidemic state of a single node
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Display, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    #[display("S")]
    Susceptible,
    #[display("I")]
    Infected,
    #[display("R")]
    Recovered,
}

/// Compartmental model governing which status transitions exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum DiseaseModel {
    /// Infection only, no recovery
    #[display("SI")]
    SI,
    /// Infected nodes return to susceptible
    #[default]
    #[display("SIS")]
    SIS,
    /// Infected nodes become permanently immune
    #[display("SIR")]
    SIR,
    /// Immunity wanes back to susceptible
    #[display("SIRS")]
    SIRS,
}

impl DiseaseModel {
    /// Status a node takes on when it recovers, `None` if the model has no recovery
    pub fn recovery_target(&self) -> Option<Status> {
        match self {
            DiseaseModel::SI => None,
            DiseaseModel::SIS => Some(Status::Susceptible),
            DiseaseModel::SIR | DiseaseModel::SIRS => Some(Status::Recovered),
        }
    }

    /// Whether recovered nodes can lose immunity
    pub fn has_waning(&self) -> bool {
        matches!(self, DiseaseModel::SIRS)
    }
}

/// Whether an edge between nodes of these two statuses can transmit infection
pub fn is_si_pair(a: Status, b: Status) -> bool {
    matches!(
        (a, b),
        (Status::Susceptible, Status::Infected) | (Status::Infected, Status::Susceptible)
    )
}
