//! Flockwork-P rewiring
//!
//! One firing picks a node `i` and a distinct node `j` uniformly at random.
//! With probability P the firing is a reconnection: `i` drops all of its
//! edges, then links to `j` and to each of `j`'s neighbors (each one kept
//! with probability Q). Otherwise `i` simply drops all of its edges. A
//! reconnection towards a node that is already a neighbor of `i` changes
//! nothing.
//!
//! All mutations go through [`NetworkState`], so the SI-edge index and mean
//! degree are already correct when a firing returns its [`EdgeDiff`].

use serde::{Deserialize, Serialize};
use tracing::trace;

use flockwork_core::{Edge, NodeId, SimRng};

use crate::config::RewiringConfig;
use crate::state::NetworkState;

/// Edges created and destroyed by one event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDiff {
    pub added: Vec<Edge>,
    pub removed: Vec<Edge>,
}

impl EdgeDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Net change in edge count
    pub fn net_change(&self) -> isize {
        self.added.len() as isize - self.removed.len() as isize
    }
}

/// The Flockwork-P rewiring rule
#[derive(Debug, Clone, Copy)]
pub struct FlockworkRewirer {
    reconnection_probability: f64,
    carry_over_probability: f64,
}

impl FlockworkRewirer {
    pub fn new(config: &RewiringConfig) -> Self {
        Self {
            reconnection_probability: config.reconnection_probability,
            carry_over_probability: config.carry_over_probability,
        }
    }

    /// Draw `i`, `j` and the reconnection flag, then rewire
    pub fn fire(&self, state: &mut NetworkState, rng: &mut SimRng) -> EdgeDiff {
        let Some((i, j)) = rng.distinct_pair(state.node_count()) else {
            return EdgeDiff::default();
        };
        let reconnect = rng.bernoulli(self.reconnection_probability);
        self.rewire(state, i, j, reconnect, rng)
    }

    /// Rewire node `i`, optionally reconnecting it through `j`
    pub fn rewire(
        &self,
        state: &mut NetworkState,
        i: NodeId,
        j: NodeId,
        reconnect: bool,
        rng: &mut SimRng,
    ) -> EdgeDiff {
        if reconnect && state.graph().are_connected(i, j) {
            trace!(i, j, "reconnection to existing neighbor, no change");
            return EdgeDiff::default();
        }

        let removed = state.isolate(i);
        let mut added = Vec::new();

        if reconnect {
            let candidates: Vec<NodeId> = state.graph().neighbors(j).iter().copied().collect();
            for k in candidates {
                if rng.bernoulli(self.carry_over_probability)
                    && let Some(edge) = state.connect(i, k)
                {
                    added.push(edge);
                }
            }
            if let Some(edge) = state.connect(i, j) {
                added.push(edge);
            }
        }

        trace!(
            i,
            j,
            reconnect,
            added = added.len(),
            removed = removed.len(),
            "rewired"
        );
        EdgeDiff { added, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flockwork_core::{ContactGraph, Status};

    fn rewirer(q: f64) -> FlockworkRewirer {
        FlockworkRewirer::new(&RewiringConfig {
            rate: 1.0,
            reconnection_probability: 1.0,
            carry_over_probability: q,
        })
    }

    #[test]
    fn test_reconnect_copies_neighborhood() {
        // 0 - 1, 2 - 3, 2 - 4
        let graph = ContactGraph::from_edges(5, [(0, 1), (2, 3), (2, 4)]).unwrap();
        let mut state = NetworkState::new(graph);
        let mut rng = SimRng::new(1);

        let diff = rewirer(1.0).rewire(&mut state, 0, 2, true, &mut rng);
        assert_eq!(diff.removed, vec![Edge::new(0, 1)]);
        assert_eq!(
            diff.added,
            vec![Edge::new(0, 3), Edge::new(0, 4), Edge::new(0, 2)]
        );
        assert_eq!(diff.net_change(), 2);
        assert!(state.graph().are_connected(0, 2));
        assert_eq!(state.graph().degree(1), 0);
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_disconnect_isolates() {
        let graph = ContactGraph::from_edges(3, [(0, 1), (0, 2)]).unwrap();
        let mut state = NetworkState::new(graph);
        let mut rng = SimRng::new(1);

        let diff = rewirer(1.0).rewire(&mut state, 0, 1, false, &mut rng);
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed, vec![Edge::new(0, 1), Edge::new(0, 2)]);
        assert_eq!(state.graph().edge_count(), 0);
    }

    #[test]
    fn test_reconnect_to_existing_neighbor_is_noop() {
        let graph = ContactGraph::from_edges(3, [(0, 1), (0, 2)]).unwrap();
        let mut state = NetworkState::new(graph);
        let mut rng = SimRng::new(1);

        let diff = rewirer(1.0).rewire(&mut state, 0, 1, true, &mut rng);
        assert!(diff.is_empty());
        assert_eq!(state.graph().edge_count(), 2);
    }

    #[test]
    fn test_zero_carry_over_links_only_to_target() {
        let graph = ContactGraph::from_edges(4, [(1, 2), (1, 3)]).unwrap();
        let mut state = NetworkState::new(graph);
        let mut rng = SimRng::new(1);

        let diff = rewirer(0.0).rewire(&mut state, 0, 1, true, &mut rng);
        assert_eq!(diff.added, vec![Edge::new(0, 1)]);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_rewiring_updates_si_index() {
        // 0 infected, linked to susceptible 1; 2 - 3 susceptible pair
        let graph = ContactGraph::from_edges(4, [(0, 1), (2, 3)]).unwrap();
        let mut state = NetworkState::new(graph);
        state.set_status(0, Status::Infected);
        let mut rng = SimRng::new(1);

        rewirer(1.0).rewire(&mut state, 0, 2, true, &mut rng);
        assert_eq!(
            state.si_edges().to_sorted_vec(),
            vec![Edge::new(0, 2), Edge::new(0, 3)]
        );
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_fire_on_single_node_is_empty() {
        let mut state = NetworkState::new(ContactGraph::new(1));
        let mut rng = SimRng::new(1);
        assert!(rewirer(1.0).fire(&mut state, &mut rng).is_empty());
    }
}
