//! Run configuration
//!
//! Every parameter a run consumes lives in [`SimConfig`]. The initial edge
//! list is not part of it; it arrives as a [`ContactGraph`](flockwork_core::ContactGraph)
//! so the same configuration can be replayed over different starting topologies.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use flockwork_core::{ConfigError, DiseaseModel, NodeId};

/// Flockwork-P rewiring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewiringConfig {
    /// Per-node rewiring rate γ; the process fires at total rate `N·γ`
    pub rate: f64,
    /// Probability P that a firing reconnects through a second node
    pub reconnection_probability: f64,
    /// Probability Q that each neighbor of the second node is carried over
    pub carry_over_probability: f64,
}

impl Default for RewiringConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            reconnection_probability: 0.5,
            carry_over_probability: 1.0,
        }
    }
}

impl RewiringConfig {
    /// Plain Flockwork-P: every neighbor of the second node is carried over
    pub fn flockwork(rate: f64, reconnection_probability: f64) -> Self {
        Self {
            rate,
            reconnection_probability,
            carry_over_probability: 1.0,
        }
    }

    /// Two-outcome formulation with explicit per-node rates
    ///
    /// Firing at `reconnect_rate + disconnect_rate` and reconnecting with
    /// probability `reconnect_rate / (reconnect_rate + disconnect_rate)` is the
    /// same Markov process as running the two outcomes as separate channels.
    pub fn from_rates(reconnect_rate: f64, disconnect_rate: f64) -> Self {
        let rate = reconnect_rate + disconnect_rate;
        let reconnection_probability = if rate > 0.0 { reconnect_rate / rate } else { 0.0 };
        Self {
            rate,
            reconnection_probability,
            carry_over_probability: 1.0,
        }
    }

    /// No topology changes at all
    pub fn disabled() -> Self {
        Self {
            rate: 0.0,
            reconnection_probability: 0.0,
            carry_over_probability: 1.0,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_rate("rewiring.rate", self.rate)?;
        check_probability(
            "rewiring.reconnection_probability",
            self.reconnection_probability,
        )?;
        check_probability(
            "rewiring.carry_over_probability",
            self.carry_over_probability,
        )
    }
}

/// Disease model and its transition rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpidemicConfig {
    pub model: DiseaseModel,
    /// Rate per SI edge
    pub infection_rate: f64,
    /// Rate per infected node; ignored by SI
    pub recovery_rate: f64,
    /// Rate per recovered node; only used by SIRS
    pub waning_rate: f64,
}

impl Default for EpidemicConfig {
    fn default() -> Self {
        Self::sis(1.0, 1.0)
    }
}

impl EpidemicConfig {
    pub fn si(infection_rate: f64) -> Self {
        Self {
            model: DiseaseModel::SI,
            infection_rate,
            recovery_rate: 0.0,
            waning_rate: 0.0,
        }
    }

    pub fn sis(infection_rate: f64, recovery_rate: f64) -> Self {
        Self {
            model: DiseaseModel::SIS,
            infection_rate,
            recovery_rate,
            waning_rate: 0.0,
        }
    }

    pub fn sir(infection_rate: f64, recovery_rate: f64) -> Self {
        Self {
            model: DiseaseModel::SIR,
            infection_rate,
            recovery_rate,
            waning_rate: 0.0,
        }
    }

    pub fn sirs(infection_rate: f64, recovery_rate: f64, waning_rate: f64) -> Self {
        Self {
            model: DiseaseModel::SIRS,
            infection_rate,
            recovery_rate,
            waning_rate,
        }
    }

    /// Effective reproduction number for the given mean degree, `None` without recovery
    pub fn reproduction_number(&self, mean_degree: f64) -> Option<f64> {
        if self.model.recovery_target().is_none() || self.recovery_rate <= 0.0 {
            return None;
        }
        Some(self.infection_rate * mean_degree / self.recovery_rate)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_rate("epidemic.infection_rate", self.infection_rate)?;
        check_rate("epidemic.recovery_rate", self.recovery_rate)?;
        check_rate("epidemic.waning_rate", self.waning_rate)
    }
}

/// How node statuses are set at `t0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InitialStatus {
    /// Exactly these nodes start infected / recovered
    Explicit {
        infected: Vec<NodeId>,
        recovered: Vec<NodeId>,
    },
    /// Draw this many infected and vaccinated (immune) nodes without replacement
    Random { infected: usize, vaccinated: usize },
}

impl Default for InitialStatus {
    fn default() -> Self {
        InitialStatus::Random {
            infected: 1,
            vaccinated: 0,
        }
    }
}

impl InitialStatus {
    /// Only the given nodes start infected
    pub fn infected(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        InitialStatus::Explicit {
            infected: nodes.into_iter().collect(),
            recovered: Vec::new(),
        }
    }

    fn validate(&self, node_count: usize) -> Result<(), ConfigError> {
        match self {
            InitialStatus::Explicit {
                infected,
                recovered,
            } => {
                let mut seen = BTreeSet::new();
                for &node in infected.iter().chain(recovered) {
                    if node >= node_count {
                        return Err(ConfigError::NodeOutOfRange { node, node_count });
                    }
                    if !seen.insert(node) {
                        return Err(ConfigError::DuplicateSeed { node });
                    }
                }
                Ok(())
            }
            InitialStatus::Random {
                infected,
                vaccinated,
            } => {
                let requested = infected.saturating_add(*vaccinated);
                if requested > node_count {
                    return Err(ConfigError::TooManySeeded {
                        requested,
                        available: node_count,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Which outputs a run keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Keep the time-stamped edge change log
    pub temporal_network: bool,
    /// Keep cumulative contact durations per edge
    pub aggregated_network: bool,
    /// Keep the compartment counts after every event
    pub time_series: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            temporal_network: true,
            aggregated_network: true,
            time_series: true,
        }
    }
}

impl RecordConfig {
    /// Keep only the final state
    pub fn nothing() -> Self {
        Self {
            temporal_network: false,
            aggregated_network: false,
            time_series: false,
        }
    }
}

/// Configuration for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub rewiring: RewiringConfig,
    pub epidemic: EpidemicConfig,
    pub initial: InitialStatus,
    pub record: RecordConfig,
    /// Simulated start time
    pub t0: f64,
    /// Simulated end time; the run stops once the clock reaches it
    pub horizon: f64,
    /// Seed for the run's single generator
    pub seed: u64,
    /// Pure-rewiring warm-up before the epidemic clock starts
    pub equilibration_time: Option<f64>,
    /// Recompute every derived index after each event and abort on mismatch
    pub audit_every_event: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rewiring: RewiringConfig::default(),
            epidemic: EpidemicConfig::default(),
            initial: InitialStatus::default(),
            record: RecordConfig::default(),
            t0: 0.0,
            horizon: 100.0,
            seed: 0,
            equilibration_time: None,
            audit_every_event: false,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every parameter against a network of `node_count` nodes
    pub fn validate(&self, node_count: usize) -> Result<(), ConfigError> {
        if node_count == 0 {
            return Err(ConfigError::EmptyNetwork);
        }
        self.rewiring.validate()?;
        self.epidemic.validate()?;
        self.initial.validate(node_count)?;

        if !(self.t0.is_finite() && self.horizon.is_finite() && self.horizon >= self.t0) {
            return Err(ConfigError::InvalidHorizon {
                t0: self.t0,
                horizon: self.horizon,
            });
        }
        if let Some(duration) = self.equilibration_time
            && !(duration.is_finite() && duration >= 0.0)
        {
            return Err(ConfigError::InvalidDuration {
                name: "equilibration_time",
                value: duration,
            });
        }
        self.check_totals(node_count)
    }

    /// Every process rate at its largest possible source count must stay finite
    fn check_totals(&self, node_count: usize) -> Result<(), ConfigError> {
        let nodes = node_count as f64;
        let pairs = nodes * (nodes - 1.0) / 2.0;
        check_total("rewiring.rate", self.rewiring.rate * nodes)?;
        check_total("epidemic.infection_rate", self.epidemic.infection_rate * pairs)?;
        check_total("epidemic.recovery_rate", self.epidemic.recovery_rate * nodes)?;
        check_total("epidemic.waning_rate", self.epidemic.waning_rate * nodes)
    }
}

fn check_total(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::RateOverflow { name, value });
    }
    Ok(())
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value.is_infinite() {
        return Err(ConfigError::NonFiniteRate { name, value });
    }
    if value < 0.0 {
        return Err(ConfigError::NegativeRate { name, value });
    }
    Ok(())
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ProbabilityOutOfRange { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate(10).is_ok());
    }

    #[test]
    fn test_rejects_empty_network() {
        assert_eq!(
            SimConfig::default().validate(0),
            Err(ConfigError::EmptyNetwork)
        );
    }

    #[test]
    fn test_rejects_negative_and_nan_rates() {
        let mut config = SimConfig::default();
        config.epidemic.infection_rate = -1.0;
        assert!(matches!(
            config.validate(5),
            Err(ConfigError::NegativeRate { name: "epidemic.infection_rate", .. })
        ));

        let mut config = SimConfig::default();
        config.rewiring.rate = f64::NAN;
        assert!(matches!(
            config.validate(5),
            Err(ConfigError::NonFiniteRate { name: "rewiring.rate", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = SimConfig::default();
        config.rewiring.carry_over_probability = 1.5;
        assert!(matches!(
            config.validate(5),
            Err(ConfigError::ProbabilityOutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_horizon_before_start() {
        let config = SimConfig {
            t0: 5.0,
            horizon: 1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(5),
            Err(ConfigError::InvalidHorizon { t0: 5.0, horizon: 1.0 })
        );
    }

    #[test]
    fn test_rejects_bad_seeding() {
        let config = SimConfig {
            initial: InitialStatus::Random {
                infected: 3,
                vaccinated: 3,
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(5),
            Err(ConfigError::TooManySeeded { requested: 6, available: 5 })
        );

        let config = SimConfig {
            initial: InitialStatus::Explicit {
                infected: vec![1],
                recovered: vec![1],
            },
            ..Default::default()
        };
        assert_eq!(config.validate(5), Err(ConfigError::DuplicateSeed { node: 1 }));

        let config = SimConfig {
            initial: InitialStatus::infected([7]),
            ..Default::default()
        };
        assert_eq!(
            config.validate(5),
            Err(ConfigError::NodeOutOfRange { node: 7, node_count: 5 })
        );
    }

    #[test]
    fn test_rejects_rates_that_overflow_for_the_network() {
        let config = SimConfig {
            rewiring: RewiringConfig::flockwork(1e308, 0.5),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(10),
            Err(ConfigError::RateOverflow { name: "rewiring.rate", .. })
        ));
        // The same rate is fine on a single node
        assert!(config.validate(1).is_ok());

        let config = SimConfig {
            epidemic: EpidemicConfig::si(1e306),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(1_000),
            Err(ConfigError::RateOverflow { name: "epidemic.infection_rate", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_equilibration_time() {
        for value in [-1.0, f64::INFINITY, f64::NAN] {
            let config = SimConfig {
                equilibration_time: Some(value),
                ..Default::default()
            };
            assert!(matches!(
                config.validate(5),
                Err(ConfigError::InvalidDuration { name: "equilibration_time", .. })
            ));
        }
        let config = SimConfig {
            equilibration_time: Some(0.0),
            ..Default::default()
        };
        assert!(config.validate(5).is_ok());
    }

    #[test]
    fn test_two_rate_formulation() {
        let rewiring = RewiringConfig::from_rates(3.0, 1.0);
        assert_eq!(rewiring.rate, 4.0);
        assert_eq!(rewiring.reconnection_probability, 0.75);
        assert_eq!(RewiringConfig::from_rates(0.0, 0.0).reconnection_probability, 0.0);
    }

    #[test]
    fn test_reproduction_number() {
        assert_eq!(EpidemicConfig::sis(2.0, 4.0).reproduction_number(3.0), Some(1.5));
        assert_eq!(EpidemicConfig::si(2.0).reproduction_number(3.0), None);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SimConfig::from_json(
            r#"{ "horizon": 12.5, "seed": 99, "epidemic": { "model": "SIR", "infection_rate": 0.5, "recovery_rate": 0.1, "waning_rate": 0.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.horizon, 12.5);
        assert_eq!(config.seed, 99);
        assert_eq!(config.epidemic.model, DiseaseModel::SIR);
        assert_eq!(config.rewiring, RewiringConfig::default());

        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
