//! # Flockwork Simulation
//!
//! Epidemic spreading on a Flockwork-P temporal network.
//!
//! ## Overview
//!
//! The contact network rewires continuously while an SI, SIS, SIR or SIRS
//! process runs on top of it. Both evolve together in one continuous-time
//! Gillespie loop:
//!
//! - **Rewiring**: a random node drops all its contacts and, with probability
//!   P, joins the neighborhood of a second random node
//! - **Infection** along SI edges
//! - **Recovery** of infected nodes, back to susceptible or to immune
//! - **Waning** immunity (SIRS only)
//!
//! ## Architecture
//!
//! - **State** (`state.rs`): graph, statuses and the derived indices, mutated in lockstep
//! - **Rewiring** (`rewiring.rs`) and **Epidemic** (`epidemic.rs`): the event rules
//! - **Simulation** (`simulation.rs`): the event loop
//! - **Change log** (`changelog.rs`): temporal and aggregated network records
//! - **Observables** (`observables.rs`): compartment time series
//! - **Topology** (`topology.rs`): starting networks (complete, ring, random, ...)
//! - **Scenarios** (`scenarios.rs`): small runs with known outcomes
//!
//! ## Example
//!
//! ```rust
//! use flockwork_simulation::*;
//!
//! let config = SimConfig {
//!     rewiring: RewiringConfig::flockwork(1.0, 0.5),
//!     epidemic: EpidemicConfig::sis(0.8, 1.0),
//!     initial: InitialStatus::infected([0]),
//!     horizon: 20.0,
//!     seed: 7,
//!     ..Default::default()
//! };
//!
//! let result = Simulation::new(GraphBuilder::new(50).ring(), config)?.run()?;
//! assert_eq!(result.final_status.len(), 50);
//! # Ok::<(), FlockworkError>(())
//! ```

pub mod changelog;
pub mod config;
pub mod epidemic;
pub mod observables;
pub mod rewiring;
pub mod scenarios;
pub mod simulation;
pub mod state;
pub mod topology;

pub use changelog::{AggregatedNetwork, ChangeLog, EdgeChanges};
pub use config::{EpidemicConfig, InitialStatus, RecordConfig, RewiringConfig, SimConfig};
pub use epidemic::{EpidemicEngine, StatusChange};
pub use observables::{Sample, TimeSeries};
pub use rewiring::{EdgeDiff, FlockworkRewirer};
pub use simulation::{
    EventKind, Rates, SimStats, Simulation, SimulationResult, StepOutcome, Termination,
};
pub use state::NetworkState;
pub use topology::GraphBuilder;

// Re-export core types so callers need only one dependency
pub use flockwork_core::{
    ConfigError, ContactGraph, DiseaseModel, Edge, FlockworkError, InvariantError, NodeId, SimRng,
    Status,
};
