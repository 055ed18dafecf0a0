//! Compartment counts sampled at event times

use serde::{Deserialize, Serialize};

use crate::config::EpidemicConfig;
use crate::state::NetworkState;

/// Snapshot of the epidemic taken right after an event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,
    pub infected: usize,
    pub recovered: usize,
    pub si_edges: usize,
    pub mean_degree: f64,
    /// `infection_rate · ⟨k⟩ / recovery_rate`; absent without recovery
    pub reproduction_number: Option<f64>,
}

impl Sample {
    pub fn capture(t: f64, state: &NetworkState, epidemic: &EpidemicConfig) -> Self {
        let mean_degree = state.mean_degree();
        Self {
            t,
            infected: state.infected().len(),
            recovered: state.recovered().len(),
            si_edges: state.si_edges().len(),
            mean_degree,
            reproduction_number: epidemic.reproduction_number(mean_degree),
        }
    }
}

/// Ordered samples of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Largest number of simultaneously infected nodes
    pub fn peak_infected(&self) -> usize {
        self.samples.iter().map(|s| s.infected).max().unwrap_or(0)
    }

    /// `(t, I(t))` pairs
    pub fn infected_curve(&self) -> Vec<(f64, usize)> {
        self.samples.iter().map(|s| (s.t, s.infected)).collect()
    }

    /// `(t, R(t))` pairs
    pub fn recovered_curve(&self) -> Vec<(f64, usize)> {
        self.samples.iter().map(|s| (s.t, s.recovered)).collect()
    }

    /// `(t, SI(t))` pairs
    pub fn si_curve(&self) -> Vec<(f64, usize)> {
        self.samples.iter().map(|s| (s.t, s.si_edges)).collect()
    }

    /// `(t, R0(t))` pairs, skipping samples without a defined value
    pub fn reproduction_curve(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| s.reproduction_number.map(|r| (s.t, r)))
            .collect()
    }
}
