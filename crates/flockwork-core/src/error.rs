//! Error types for Flockwork simulations

use thiserror::Error;

use crate::types::{Edge, NodeId, Status};

/// Result alias used across the Flockwork crates
pub type Result<T> = std::result::Result<T, FlockworkError>;

/// Top-level error type for a simulation run
#[derive(Debug, Error)]
pub enum FlockworkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantError),

    #[error("Total event rate is not finite at t = {at}")]
    RateOverflow { at: f64 },
}

/// Problems detected while setting up a run, before any event fires
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Network must contain at least one node")]
    EmptyNetwork,

    #[error("Rate `{name}` must be non-negative, got {value}")]
    NegativeRate { name: &'static str, value: f64 },

    #[error("Rate `{name}` must be finite, got {value}")]
    NonFiniteRate { name: &'static str, value: f64 },

    #[error("Probability `{name}` must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    #[error("Total rate `{name}` overflows for this network, got {value}")]
    RateOverflow { name: &'static str, value: f64 },

    #[error("Duration `{name}` must be finite and non-negative, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },

    #[error("Horizon {horizon} must be finite and not precede start time {t0}")]
    InvalidHorizon { t0: f64, horizon: f64 },

    #[error("Node {node} out of range for a network of {node_count} nodes")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    #[error("Self-loop on node {node} in edge list")]
    SelfLoop { node: NodeId },

    #[error("Cannot seed {requested} nodes in a network of {available}")]
    TooManySeeded { requested: usize, available: usize },

    #[error("Node {node} seeded more than once")]
    DuplicateSeed { node: NodeId },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Corruption of the derived indices; a run that hits one of these is aborted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantError {
    #[error("Edge {edge} in SI index joins {left} and {right}")]
    NotAnSiEdge {
        edge: Edge,
        left: Status,
        right: Status,
    },

    #[error("Process `{process}` fired with an empty source set")]
    EmptySource { process: &'static str },

    #[error("Index `{index}` out of sync: {detail}")]
    IndexMismatch { index: &'static str, detail: String },

    #[error("Adjacency is not symmetric between {a} and {b}")]
    AsymmetricAdjacency { a: NodeId, b: NodeId },
}
