//! Event-driven simulation engine
//!
//! Implements a continuous-time Gillespie loop over four processes:
//! - Flockwork-P rewiring at rate `N·γ`
//! - Infection at rate `β·|SI|`
//! - Recovery at rate `μ·|I|` (SIS, SIR, SIRS)
//! - Waning immunity at rate `ω·|R|` (SIRS)
//!
//! Each step draws an exponential waiting time from the total rate, picks a
//! process proportionally to its share, applies it through the engines and
//! records the outcome before the next draw.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace};

use flockwork_core::{
    ContactGraph, Edge, FlockworkError, InvariantError, Result, SimRng, Status,
};

use crate::changelog::{AggregatedNetwork, ChangeLog, EdgeChanges};
use crate::config::{InitialStatus, SimConfig};
use crate::epidemic::EpidemicEngine;
use crate::observables::{Sample, TimeSeries};
use crate::rewiring::FlockworkRewirer;
use crate::state::NetworkState;

/// The processes the scheduler can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Rewiring,
    Infection,
    Recovery,
    Waning,
}

/// Current rate of every process
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rates {
    pub rewiring: f64,
    pub infection: f64,
    pub recovery: f64,
    pub waning: f64,
}

impl Rates {
    /// Total event rate Λ
    pub fn total(&self) -> f64 {
        self.rewiring + self.infection + self.recovery + self.waning
    }

    /// Pick the process whose cumulative share covers `draw`, a value in `[0, Λ)`
    pub fn choose(&self, draw: f64) -> Option<EventKind> {
        let channels = [
            (EventKind::Rewiring, self.rewiring),
            (EventKind::Infection, self.infection),
            (EventKind::Recovery, self.recovery),
            (EventKind::Waning, self.waning),
        ];
        let mut cumulative = 0.0;
        let mut last_active = None;
        for (kind, rate) in channels {
            if rate <= 0.0 {
                continue;
            }
            cumulative += rate;
            if draw < cumulative {
                return Some(kind);
            }
            last_active = Some(kind);
        }
        // Rounding can leave `draw` a hair above the accumulated sum
        last_active
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Termination {
    /// The clock reached the horizon
    Horizon,
    /// Every rate dropped to zero at time `at`; nothing can happen any more
    Exhausted { at: f64 },
}

/// Result of a single [`Simulation::step`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Event { kind: EventKind, time: f64 },
    Finished(Termination),
}

/// Event counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub events: u64,
    pub rewirings: u64,
    /// Rewiring firings that left the topology untouched
    pub noop_rewirings: u64,
    pub infections: u64,
    pub recoveries: u64,
    pub wanings: u64,
    pub edges_added: u64,
    pub edges_removed: u64,
    /// Rewiring firings spent in the warm-up phase
    pub equilibration_rewirings: u64,
}

/// Everything a finished run hands back
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub t0: f64,
    pub horizon: f64,
    pub termination: Termination,
    pub time_series: Option<TimeSeries>,
    pub edge_changes: Option<EdgeChanges>,
    pub aggregated: Option<AggregatedNetwork>,
    pub final_edges: Vec<Edge>,
    pub final_status: Vec<Status>,
    pub stats: SimStats,
}

/// The simulation state
#[derive(Debug)]
pub struct Simulation {
    state: NetworkState,
    config: SimConfig,
    rng: SimRng,
    time: f64,
    rewirer: FlockworkRewirer,
    epidemic: EpidemicEngine,
    log: ChangeLog,
    series: Option<TimeSeries>,
    stats: SimStats,
    termination: Option<Termination>,
}

impl Simulation {
    /// Validate the configuration and prepare a run over `graph`
    ///
    /// Runs the optional equilibration phase and seeds initial statuses, both
    /// drawing from the run's generator.
    pub fn new(graph: ContactGraph, config: SimConfig) -> Result<Self> {
        config.validate(graph.node_count())?;

        let mut rng = SimRng::new(config.seed);
        let rewirer = FlockworkRewirer::new(&config.rewiring);
        let epidemic = EpidemicEngine::new(config.epidemic.model);
        let mut state = NetworkState::new(graph);
        let mut stats = SimStats::default();

        if let Some(duration) = config.equilibration_time {
            stats.equilibration_rewirings =
                equilibrate(&mut state, &rewirer, config.rewiring.rate, duration, &mut rng);
        }
        seed_statuses(&mut state, &config.initial, &mut rng);

        let log = ChangeLog::new(
            state.node_count(),
            config.t0,
            state.graph().edges(),
            config.record.temporal_network,
            config.record.aggregated_network,
        );
        let series = config.record.time_series.then(|| {
            let mut series = TimeSeries::new();
            series.push(Sample::capture(config.t0, &state, &config.epidemic));
            series
        });

        info!(
            nodes = state.node_count(),
            edges = state.graph().edge_count(),
            model = %config.epidemic.model,
            infected = state.infected().len(),
            horizon = config.horizon,
            seed = config.seed,
            "Simulation initialized at t = {}",
            config.t0
        );

        Ok(Self {
            time: config.t0,
            state,
            config,
            rng,
            rewirer,
            epidemic,
            log,
            series,
            stats,
            termination: None,
        })
    }

    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current simulated time
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn change_log(&self) -> &ChangeLog {
        &self.log
    }

    pub fn time_series(&self) -> Option<&TimeSeries> {
        self.series.as_ref()
    }

    /// Rates of every process in the current state
    pub fn rates(&self) -> Rates {
        let node_count = self.state.node_count();
        let epidemic = &self.config.epidemic;
        let rewiring = if node_count >= 2 {
            node_count as f64 * self.config.rewiring.rate
        } else {
            0.0
        };
        let recovery = if epidemic.model.recovery_target().is_some() {
            epidemic.recovery_rate * self.state.infected().len() as f64
        } else {
            0.0
        };
        let waning = if epidemic.model.has_waning() {
            epidemic.waning_rate * self.state.recovered().len() as f64
        } else {
            0.0
        };
        Rates {
            rewiring,
            infection: epidemic.infection_rate * self.state.si_edges().len() as f64,
            recovery,
            waning,
        }
    }

    /// Advance to the next event, or finish the run
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let Some(termination) = self.termination {
            return Ok(StepOutcome::Finished(termination));
        }

        let rates = self.rates();
        let total = rates.total();
        if !total.is_finite() {
            return Err(FlockworkError::RateOverflow { at: self.time });
        }
        let Some(tau) = self.rng.exponential(total) else {
            debug!(t = self.time, "all rates are zero, stopping early");
            return Ok(self.finish(Termination::Exhausted { at: self.time }));
        };

        let next = self.time + tau;
        if next >= self.config.horizon {
            self.time = self.config.horizon;
            return Ok(self.finish(Termination::Horizon));
        }
        self.time = next;

        let kind = rates
            .choose(self.rng.uniform() * total)
            .ok_or(InvariantError::EmptySource {
                process: "scheduler",
            })?;
        self.execute(kind)?;
        self.stats.events += 1;

        if self.config.audit_every_event {
            self.state.check_invariants()?;
        }
        if let Some(series) = &mut self.series {
            series.push(Sample::capture(self.time, &self.state, &self.config.epidemic));
        }

        Ok(StepOutcome::Event {
            kind,
            time: self.time,
        })
    }

    /// Step until the run finishes
    pub fn run_to_end(&mut self) -> Result<Termination> {
        loop {
            if let StepOutcome::Finished(termination) = self.step()? {
                return Ok(termination);
            }
        }
    }

    /// Run to completion and collect the outputs
    pub fn run(mut self) -> Result<SimulationResult> {
        let span = info_span!("run", seed = self.config.seed);
        let _guard = span.enter();

        let termination = self.run_to_end()?;
        let (edge_changes, aggregated) = self.log.into_parts();
        Ok(SimulationResult {
            t0: self.config.t0,
            horizon: self.config.horizon,
            termination,
            time_series: self.series,
            edge_changes,
            aggregated,
            final_edges: self.state.graph().edges(),
            final_status: self.state.statuses().to_vec(),
            stats: self.stats,
        })
    }

    fn execute(&mut self, kind: EventKind) -> Result<()> {
        match kind {
            EventKind::Rewiring => {
                let diff = self.rewirer.fire(&mut self.state, &mut self.rng);
                self.stats.rewirings += 1;
                if diff.is_empty() {
                    self.stats.noop_rewirings += 1;
                }
                self.stats.edges_added += diff.added.len() as u64;
                self.stats.edges_removed += diff.removed.len() as u64;
                self.log.record(self.time, &diff);
            }
            EventKind::Infection => {
                let change = self.epidemic.infect(&mut self.state, &mut self.rng)?;
                self.stats.infections += 1;
                trace!(t = self.time, node = change.node, "infection");
            }
            EventKind::Recovery => {
                let change = self.epidemic.recover(&mut self.state, &mut self.rng)?;
                self.stats.recoveries += 1;
                trace!(t = self.time, node = change.node, to = %change.to, "recovery");
            }
            EventKind::Waning => {
                let change = self.epidemic.wane(&mut self.state, &mut self.rng)?;
                self.stats.wanings += 1;
                trace!(t = self.time, node = change.node, "immunity waned");
            }
        }
        Ok(())
    }

    fn finish(&mut self, termination: Termination) -> StepOutcome {
        // The topology is frozen from an exhausted state onwards, so open
        // contacts last until the horizon either way.
        self.log.finish(self.config.horizon);
        self.termination = Some(termination);

        info!(
            ?termination,
            events = self.stats.events,
            infected = self.state.infected().len(),
            recovered = self.state.recovered().len(),
            edges = self.state.graph().edge_count(),
            "Simulation complete at t = {}",
            self.time
        );
        StepOutcome::Finished(termination)
    }
}

/// Pure rewiring for `duration` time units; returns the number of firings
fn equilibrate(
    state: &mut NetworkState,
    rewirer: &FlockworkRewirer,
    rate: f64,
    duration: f64,
    rng: &mut SimRng,
) -> u64 {
    let node_count = state.node_count();
    if node_count < 2 {
        return 0;
    }
    let total = node_count as f64 * rate;
    let mut t = 0.0;
    let mut firings = 0;
    while let Some(tau) = rng.exponential(total) {
        t += tau;
        if t >= duration {
            break;
        }
        rewirer.fire(state, rng);
        firings += 1;
    }
    debug!(
        firings,
        edges = state.graph().edge_count(),
        mean_degree = state.mean_degree(),
        "Topology equilibrated"
    );
    firings
}

fn seed_statuses(state: &mut NetworkState, initial: &InitialStatus, rng: &mut SimRng) {
    match initial {
        InitialStatus::Explicit {
            infected,
            recovered,
        } => {
            for &node in recovered {
                state.set_status(node, Status::Recovered);
            }
            for &node in infected {
                state.set_status(node, Status::Infected);
            }
        }
        InitialStatus::Random {
            infected,
            vaccinated,
        } => {
            let chosen = rand::seq::index::sample(rng, state.node_count(), infected + vaccinated);
            for (rank, node) in chosen.into_iter().enumerate() {
                let status = if rank < *infected {
                    Status::Infected
                } else {
                    Status::Recovered
                };
                state.set_status(node, status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EpidemicConfig, RecordConfig, RewiringConfig};
    use crate::topology::GraphBuilder;

    #[test]
    fn test_rate_selection() {
        let rates = Rates {
            rewiring: 1.0,
            infection: 0.0,
            recovery: 2.0,
            waning: 1.0,
        };
        assert_eq!(rates.total(), 4.0);
        assert_eq!(rates.choose(0.5), Some(EventKind::Rewiring));
        assert_eq!(rates.choose(1.0), Some(EventKind::Recovery));
        assert_eq!(rates.choose(2.99), Some(EventKind::Recovery));
        assert_eq!(rates.choose(3.5), Some(EventKind::Waning));
        assert_eq!(rates.choose(4.0), Some(EventKind::Waning));
        assert_eq!(Rates::default().choose(0.0), None);
    }

    #[test]
    fn test_rates_reflect_state() {
        let config = SimConfig {
            rewiring: RewiringConfig::flockwork(0.5, 0.5),
            epidemic: EpidemicConfig::sis(2.0, 3.0),
            initial: InitialStatus::infected([0]),
            ..Default::default()
        };
        let sim = Simulation::new(GraphBuilder::new(4).star(), config).unwrap();
        let rates = sim.rates();
        assert_eq!(rates.rewiring, 2.0);
        assert_eq!(rates.infection, 6.0);
        assert_eq!(rates.recovery, 3.0);
        assert_eq!(rates.waning, 0.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimConfig {
            horizon: -1.0,
            ..Default::default()
        };
        assert!(Simulation::new(GraphBuilder::new(3).ring(), config).is_err());
    }

    #[test]
    fn test_exhausted_run_stops_early() {
        // SIR without rewiring: once the only infected node recovers, nothing is left
        let config = SimConfig {
            rewiring: RewiringConfig::disabled(),
            epidemic: EpidemicConfig::sir(0.0, 1.0),
            initial: InitialStatus::infected([0]),
            horizon: 1.0e6,
            ..Default::default()
        };
        let result = Simulation::new(GraphBuilder::new(3).line(), config)
            .unwrap()
            .run()
            .unwrap();
        let Termination::Exhausted { at } = result.termination else {
            panic!("expected early stop, got {:?}", result.termination);
        };
        assert!(at < 1.0e6);
        assert_eq!(result.stats.recoveries, 1);
        assert_eq!(result.final_status[0], Status::Recovered);
        // Contacts stay open until the horizon
        let aggregated = result.aggregated.unwrap();
        assert_eq!(aggregated.duration(&Edge::new(0, 1)), 1.0e6);
    }

    #[test]
    fn test_overflowing_total_rate_is_an_error() {
        // Each process alone stays finite, their sum does not
        let config = SimConfig {
            rewiring: RewiringConfig::flockwork(1.7e307, 0.5),
            epidemic: EpidemicConfig::sis(0.0, 1.7e307),
            initial: InitialStatus::Random {
                infected: 10,
                vaccinated: 0,
            },
            ..Default::default()
        };
        let mut sim = Simulation::new(GraphBuilder::new(10).ring(), config).unwrap();
        assert!(matches!(
            sim.step(),
            Err(FlockworkError::RateOverflow { at }) if at == 0.0
        ));
        assert_eq!(sim.termination(), None);
    }

    #[test]
    fn test_rejects_rewiring_rate_overflowing_for_network_size() {
        let config = SimConfig {
            rewiring: RewiringConfig::flockwork(1e308, 0.5),
            ..Default::default()
        };
        let err = Simulation::new(GraphBuilder::new(10).ring(), config).unwrap_err();
        assert!(matches!(
            err,
            FlockworkError::Config(flockwork_core::ConfigError::RateOverflow { .. })
        ));
    }

    #[test]
    fn test_step_after_finish_is_stable() {
        let config = SimConfig {
            rewiring: RewiringConfig::disabled(),
            epidemic: EpidemicConfig::si(1.0),
            initial: InitialStatus::infected(Vec::new()),
            record: RecordConfig::nothing(),
            ..Default::default()
        };
        let mut sim = Simulation::new(GraphBuilder::new(2).line(), config).unwrap();
        let first = sim.step().unwrap();
        assert_eq!(first, StepOutcome::Finished(Termination::Exhausted { at: 0.0 }));
        assert_eq!(sim.step().unwrap(), first);
        assert!(sim.time_series().is_none());
    }

    #[test]
    fn test_random_seeding_counts() {
        let config = SimConfig {
            initial: InitialStatus::Random {
                infected: 3,
                vaccinated: 4,
            },
            ..Default::default()
        };
        let sim = Simulation::new(GraphBuilder::new(10).ring(), config).unwrap();
        assert_eq!(sim.state().infected().len(), 3);
        assert_eq!(sim.state().recovered().len(), 4);
        sim.state().check_invariants().unwrap();
    }

    #[test]
    fn test_equilibration_happens_before_t0() {
        let config = SimConfig {
            rewiring: RewiringConfig::flockwork(1.0, 0.5),
            equilibration_time: Some(20.0),
            t0: 0.0,
            ..Default::default()
        };
        let sim = Simulation::new(GraphBuilder::new(20).ring(), config).unwrap();
        assert!(sim.stats().equilibration_rewirings > 0);
        assert_eq!(sim.time(), 0.0);
        let initial = &sim.change_log().temporal().unwrap().edges_initial;
        assert_eq!(initial, &sim.state().graph().edges());
    }

    #[test]
    fn test_vaccinated_nodes_never_infected_in_sir() {
        let config = SimConfig {
            rewiring: RewiringConfig::disabled(),
            epidemic: EpidemicConfig::sir(5.0, 0.1),
            initial: InitialStatus::Explicit {
                infected: vec![0],
                recovered: vec![1],
            },
            horizon: 50.0,
            seed: 4,
            ..Default::default()
        };
        // 0 - 1 - 2: the only path to 2 runs through the vaccinated node
        let result = Simulation::new(GraphBuilder::new(3).line(), config)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(result.final_status[2], Status::Susceptible);
        assert_eq!(result.stats.infections, 0);
    }
}
