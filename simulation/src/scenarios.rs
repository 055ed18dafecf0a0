//! Pre-defined simulation scenarios
//!
//! Small, fully specified runs whose outcome is known in advance. They double
//! as smoke tests and as starting points for experiments.

use rand::RngCore;

use flockwork_core::{Result, SimRng};

use crate::config::{EpidemicConfig, InitialStatus, RecordConfig, RewiringConfig, SimConfig};
use crate::simulation::{Simulation, SimulationResult};
use crate::topology::GraphBuilder;

/// Scenario: SI outbreak on a static complete graph
///
/// Four nodes, every pair in contact, node 0 infected and no rewiring. The
/// infection reaches everyone, after which no process has a positive rate
/// and the run stops early.
pub fn run_full_spread_scenario(seed: u64) -> Result<SimulationResult> {
    let config = SimConfig {
        rewiring: RewiringConfig::disabled(),
        epidemic: EpidemicConfig::si(1.0),
        initial: InitialStatus::infected([0]),
        horizon: 1_000.0,
        seed,
        audit_every_event: true,
        ..Default::default()
    };
    Simulation::new(GraphBuilder::new(4).complete(), config)?.run()
}

/// Scenario: pure rewiring of a single pair
///
/// Two nodes sharing one edge, nobody infected. A disconnection drops the
/// edge and the next reconnection restores it. With
/// `reconnection_probability = 1` every firing reconnects towards the
/// existing neighbor, so the edge never changes.
pub fn run_single_pair_scenario(
    reconnection_probability: f64,
    horizon: f64,
    seed: u64,
) -> Result<SimulationResult> {
    let config = SimConfig {
        rewiring: RewiringConfig::flockwork(1.0, reconnection_probability),
        epidemic: EpidemicConfig::si(0.0),
        initial: InitialStatus::infected(Vec::new()),
        horizon,
        seed,
        audit_every_event: true,
        ..Default::default()
    };
    let graph = GraphBuilder::new(2).from_edges([(0, 1)])?;
    Simulation::new(graph, config)?.run()
}

/// Scenario: infection on a network that never forms contacts
///
/// No initial edges and P = 0, so every rewiring firing isolates an already
/// isolated node. The infected node has nobody to infect until the horizon.
pub fn run_isolated_scenario(node_count: usize, horizon: f64, seed: u64) -> Result<SimulationResult> {
    let config = SimConfig {
        rewiring: RewiringConfig::flockwork(1.0, 0.0),
        epidemic: EpidemicConfig::si(5.0),
        initial: InitialStatus::infected([0]),
        record: RecordConfig {
            time_series: false,
            ..Default::default()
        },
        horizon,
        seed,
        audit_every_event: true,
        ..Default::default()
    };
    Simulation::new(GraphBuilder::new(node_count).empty(), config)?.run()
}

/// Scenario: SIRS endemic state on a rewiring network
///
/// An Erdős–Rényi start is equilibrated under Flockwork-P before ten percent
/// of the nodes are infected. Returns the run for inspection of the
/// time series.
pub fn run_endemic_scenario(node_count: usize, horizon: f64, seed: u64) -> Result<SimulationResult> {
    let mut rng = SimRng::new(seed);
    let graph = GraphBuilder::new(node_count).erdos_renyi(4.0 / node_count as f64, &mut rng);
    let config = SimConfig {
        rewiring: RewiringConfig::flockwork(1.0, 0.5),
        epidemic: EpidemicConfig::sirs(1.0, 0.5, 0.2),
        initial: InitialStatus::Random {
            infected: (node_count / 10).max(1),
            vaccinated: 0,
        },
        record: RecordConfig {
            temporal_network: false,
            ..Default::default()
        },
        horizon,
        seed: rng.next_u64(),
        equilibration_time: Some(10.0),
        ..Default::default()
    };
    Simulation::new(graph, config)?.run()
}
