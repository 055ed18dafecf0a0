//! Core building blocks for Flockwork epidemic simulations
//!
//! This crate holds the pieces that every simulation run is made of but that
//! carry no process semantics of their own:
//!
//! - **Types** (`types.rs`): node ids, canonical edges, epidemic status, disease models
//! - **Errors** (`error.rs`): configuration and invariant-violation errors
//! - **Graph** (`graph.rs`): symmetric adjacency over a fixed node set
//! - **Index** (`index.rs`): dense sampling set with O(1) insert/remove/sample
//! - **RNG** (`rng.rs`): the single seeded generator owned by a run
//!
//! The rewiring and epidemic engines that mutate these structures live in
//! `flockwork-simulation`.

pub mod error;
pub mod graph;
pub mod index;
pub mod rng;
pub mod types;

pub use error::{ConfigError, FlockworkError, InvariantError, Result};
pub use graph::ContactGraph;
pub use index::SampleSet;
pub use rng::SimRng;
pub use types::{DiseaseModel, Edge, NodeId, Status};
