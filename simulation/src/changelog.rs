//! Temporal and aggregated records of the evolving topology
//!
//! [`EdgeChanges`] keeps every topology-changing event with its timestamp,
//! enough to replay the network at any time in `[t0, tmax]`.
//! [`AggregatedNetwork`] folds the same stream into total contact duration
//! per node pair.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use flockwork_core::Edge;

use crate::rewiring::EdgeDiff;
use crate::state::NetworkState;

/// Time-stamped edge additions and removals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeChanges {
    pub node_count: usize,
    pub t0: f64,
    pub tmax: f64,
    pub edges_initial: Vec<Edge>,
    pub t: Vec<f64>,
    pub edges_in: Vec<Vec<Edge>>,
    pub edges_out: Vec<Vec<Edge>>,
}

impl EdgeChanges {
    /// Start an empty log at `t0`; `tmax` is set when the run ends
    pub fn new(node_count: usize, t0: f64, edges_initial: Vec<Edge>) -> Self {
        Self {
            node_count,
            t0,
            tmax: t0,
            edges_initial,
            t: Vec::new(),
            edges_in: Vec::new(),
            edges_out: Vec::new(),
        }
    }

    /// Append one change event
    pub fn push(&mut self, time: f64, diff: &EdgeDiff) {
        self.t.push(time);
        self.edges_in.push(diff.added.clone());
        self.edges_out.push(diff.removed.clone());
    }

    /// Number of change events
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Edges present at time `time`, after all changes stamped at or before it
    pub fn edges_at(&self, time: f64) -> Vec<Edge> {
        let mut edges: BTreeSet<Edge> = self.edges_initial.iter().copied().collect();
        for ((&t, added), removed) in self.t.iter().zip(&self.edges_in).zip(&self.edges_out) {
            if t > time {
                break;
            }
            for edge in removed {
                edges.remove(edge);
            }
            edges.extend(added.iter().copied());
        }
        edges.into_iter().collect()
    }

    /// Change events as `(time, diff)` pairs in log order
    pub fn diffs(&self) -> impl Iterator<Item = (f64, EdgeDiff)> + '_ {
        self.t
            .iter()
            .zip(&self.edges_in)
            .zip(&self.edges_out)
            .map(|((&t, added), removed)| {
                (
                    t,
                    EdgeDiff {
                        added: added.clone(),
                        removed: removed.clone(),
                    },
                )
            })
    }

    /// Drive `state` through every change stamped at or before `until`
    ///
    /// `state` must hold `edges_initial`. Returns the number of events applied.
    pub fn replay(&self, state: &mut NetworkState, until: f64) -> usize {
        let mut applied = 0;
        for (t, diff) in self.diffs() {
            if t > until {
                break;
            }
            state.apply(&diff);
            applied += 1;
        }
        applied
    }

    /// Edges present at the end of the log
    pub fn final_edges(&self) -> Vec<Edge> {
        self.edges_at(f64::INFINITY)
    }

    /// Chain several logs end to start
    ///
    /// Each later log is shifted in time so that it starts at the previous
    /// log's `tmax`. Where a log's initial edges differ from the previous
    /// log's final edges, a change event at the boundary reconciles them.
    /// Returns `None` for an empty slice.
    pub fn concatenate(logs: &[EdgeChanges]) -> Option<EdgeChanges> {
        let (first, rest) = logs.split_first()?;
        let mut combined = first.clone();

        for next in rest {
            let offset = combined.tmax - next.t0;
            let before: BTreeSet<Edge> = combined.final_edges().into_iter().collect();
            let after: BTreeSet<Edge> = next.edges_initial.iter().copied().collect();
            let boundary = EdgeDiff {
                added: after.difference(&before).copied().collect(),
                removed: before.difference(&after).copied().collect(),
            };
            if !boundary.is_empty() {
                combined.push(combined.tmax, &boundary);
            }

            combined.t.extend(next.t.iter().map(|t| t + offset));
            combined.edges_in.extend(next.edges_in.iter().cloned());
            combined.edges_out.extend(next.edges_out.iter().cloned());
            combined.tmax = next.tmax + offset;
            combined.node_count = combined.node_count.max(next.node_count);
        }
        Some(combined)
    }
}

/// Total contact duration per edge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedNetwork {
    durations: BTreeMap<Edge, f64>,
    activated_at: BTreeMap<Edge, f64>,
}

impl AggregatedNetwork {
    /// Start tracking with `edges` active since `t0`
    pub fn new(t0: f64, edges: impl IntoIterator<Item = Edge>) -> Self {
        Self {
            durations: BTreeMap::new(),
            activated_at: edges.into_iter().map(|edge| (edge, t0)).collect(),
        }
    }

    /// Fold one change event into the totals
    ///
    /// Removals are processed before additions, so an edge that is dropped
    /// and recreated by the same event keeps accumulating.
    pub fn record(&mut self, time: f64, diff: &EdgeDiff) {
        for edge in &diff.removed {
            match self.activated_at.remove(edge) {
                Some(since) => *self.durations.entry(*edge).or_insert(0.0) += time - since,
                None => warn!(%edge, time, "removed edge had no activation time"),
            }
        }
        for edge in &diff.added {
            self.activated_at.insert(*edge, time);
        }
    }

    /// Close every still-active edge at `horizon`
    pub fn close(&mut self, horizon: f64) {
        for (edge, since) in std::mem::take(&mut self.activated_at) {
            *self.durations.entry(edge).or_insert(0.0) += horizon - since;
        }
    }

    /// Accumulated duration of `edge`, zero if it never existed
    pub fn duration(&self, edge: &Edge) -> f64 {
        self.durations.get(edge).copied().unwrap_or(0.0)
    }

    /// Edges still open, with their activation times
    pub fn active(&self) -> impl Iterator<Item = (&Edge, &f64)> {
        self.activated_at.iter()
    }

    /// All closed durations in edge order
    pub fn iter(&self) -> impl Iterator<Item = (&Edge, &f64)> {
        self.durations.iter()
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Sum of all durations
    pub fn total_duration(&self) -> f64 {
        self.durations.values().sum()
    }
}

/// Records diffs into whichever logs the run keeps
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    temporal: Option<EdgeChanges>,
    aggregated: Option<AggregatedNetwork>,
}

impl ChangeLog {
    pub fn new(
        node_count: usize,
        t0: f64,
        edges_initial: Vec<Edge>,
        temporal: bool,
        aggregated: bool,
    ) -> Self {
        let aggregated =
            aggregated.then(|| AggregatedNetwork::new(t0, edges_initial.iter().copied()));
        let temporal = temporal.then(|| EdgeChanges::new(node_count, t0, edges_initial));
        Self {
            temporal,
            aggregated,
        }
    }

    /// Record `diff` at `time`; empty diffs are skipped
    pub fn record(&mut self, time: f64, diff: &EdgeDiff) {
        if diff.is_empty() {
            return;
        }
        if let Some(aggregated) = &mut self.aggregated {
            aggregated.record(time, diff);
        }
        if let Some(temporal) = &mut self.temporal {
            temporal.push(time, diff);
        }
    }

    /// Stamp the horizon and close open contacts
    pub fn finish(&mut self, horizon: f64) {
        if let Some(aggregated) = &mut self.aggregated {
            aggregated.close(horizon);
        }
        if let Some(temporal) = &mut self.temporal {
            temporal.tmax = horizon;
        }
    }

    pub fn temporal(&self) -> Option<&EdgeChanges> {
        self.temporal.as_ref()
    }

    pub fn aggregated(&self) -> Option<&AggregatedNetwork> {
        self.aggregated.as_ref()
    }

    pub fn into_parts(self) -> (Option<EdgeChanges>, Option<AggregatedNetwork>) {
        (self.temporal, self.aggregated)
    }
}
