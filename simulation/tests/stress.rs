//! Stress tests for flockwork-simulation
//!
//! Long randomized runs that recheck every derived index after each event
//! and compare compartment counts event by event.

use std::thread;
use std::time::Instant;

use flockwork_simulation::{
    DiseaseModel, EpidemicConfig, EventKind, GraphBuilder, InitialStatus, RecordConfig,
    RewiringConfig, SimConfig, SimRng, Simulation, Status, StepOutcome,
};

fn counts(sim: &Simulation) -> (usize, usize, usize) {
    let state = sim.state();
    (
        state.susceptible_count(),
        state.infected().len(),
        state.recovered().len(),
    )
}

fn stress_config(epidemic: EpidemicConfig, seed: u64) -> SimConfig {
    SimConfig {
        rewiring: RewiringConfig {
            rate: 1.0,
            reconnection_probability: 0.6,
            carry_over_probability: 0.7,
        },
        epidemic,
        initial: InitialStatus::Random {
            infected: 10,
            vaccinated: 5,
        },
        record: RecordConfig::nothing(),
        horizon: 1.0e9,
        seed,
        ..Default::default()
    }
}

/// Drive `events` steps, checking invariants and conservation after each
fn drive_and_audit(epidemic: EpidemicConfig, seed: u64, events: usize) -> usize {
    let model = epidemic.model;
    let mut rng = SimRng::new(seed);
    let graph = GraphBuilder::new(100).erdos_renyi(0.04, &mut rng);
    let mut sim = Simulation::new(graph, stress_config(epidemic, seed)).unwrap();

    let mut fired = 0;
    while fired < events {
        let before = counts(&sim);
        let kind = match sim.step().unwrap() {
            StepOutcome::Event { kind, .. } => kind,
            StepOutcome::Finished(_) => break,
        };
        fired += 1;

        sim.state().check_invariants().unwrap();
        let (s, i, r) = counts(&sim);
        assert_eq!(s + i + r, 100);

        let (s0, i0, r0) = before;
        match kind {
            EventKind::Rewiring => assert_eq!((s, i, r), before),
            EventKind::Infection => assert_eq!((s, i, r), (s0 - 1, i0 + 1, r0)),
            EventKind::Recovery if model == DiseaseModel::SIS => {
                assert_eq!((s, i, r), (s0 + 1, i0 - 1, r0))
            }
            EventKind::Recovery => assert_eq!((s, i, r), (s0, i0 - 1, r0 + 1)),
            EventKind::Waning => assert_eq!((s, i, r), (s0 + 1, i0, r0 - 1)),
        }
    }
    fired
}

#[test]
fn test_sis_invariants_over_many_events() {
    let start = Instant::now();
    let fired = drive_and_audit(EpidemicConfig::sis(0.8, 0.5), 11, 20_000);
    println!("Audited {} SIS events in {:?}", fired, start.elapsed());
    assert_eq!(fired, 20_000);
}

#[test]
fn test_sirs_invariants_over_many_events() {
    let fired = drive_and_audit(EpidemicConfig::sirs(1.2, 0.5, 0.3), 12, 10_000);
    assert_eq!(fired, 10_000);
}

#[test]
fn test_sir_invariants_until_extinction() {
    // SIR may burn out before the event budget; every event up to then is audited
    let fired = drive_and_audit(EpidemicConfig::sir(1.0, 0.5), 13, 10_000);
    assert!(fired > 0);
}

#[test]
fn test_si_reaches_full_infection_on_rewiring_network() {
    // Vaccinated nodes stay recovered in SI, everyone else ends up infected
    let mut rng = SimRng::new(21);
    let graph = GraphBuilder::new(100).erdos_renyi(0.04, &mut rng);
    let config = SimConfig {
        epidemic: EpidemicConfig::si(2.0),
        horizon: 500.0,
        audit_every_event: true,
        ..stress_config(EpidemicConfig::si(2.0), 21)
    };
    let result = Simulation::new(graph, config).unwrap().run().unwrap();
    let recovered = result
        .final_status
        .iter()
        .filter(|&&s| s == Status::Recovered)
        .count();
    let infected = result
        .final_status
        .iter()
        .filter(|&&s| s == Status::Infected)
        .count();
    assert_eq!(recovered, 5);
    assert_eq!(infected, 95);
}

#[test]
fn test_concurrent_runs_are_independent() {
    // Starting graphs come from generators forked off a parent, so two
    // parents with the same seed hand out the same sequence of children
    let mut parent_a = SimRng::new(100);
    let mut parent_b = SimRng::new(100);
    let children = [
        parent_a.fork(),
        parent_b.fork(),
        parent_a.fork(),
        parent_b.fork(),
    ];

    let handles: Vec<_> = children
        .into_iter()
        .map(|mut graph_rng| {
            thread::spawn(move || {
                let graph = GraphBuilder::new(60).erdos_renyi(0.05, &mut graph_rng);
                let config = SimConfig {
                    rewiring: RewiringConfig::flockwork(1.0, 0.5),
                    epidemic: EpidemicConfig::sis(1.0, 0.7),
                    initial: InitialStatus::infected([0, 30]),
                    horizon: 30.0,
                    seed: 5,
                    ..Default::default()
                };
                Simulation::new(graph, config).unwrap().run().unwrap()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results[0].edge_changes, results[1].edge_changes);
    assert_eq!(results[0].time_series, results[1].time_series);
    assert_eq!(results[2].final_status, results[3].final_status);
    let initial = |i: usize| &results[i].edge_changes.as_ref().unwrap().edges_initial;
    assert_ne!(initial(0), initial(2));
}
