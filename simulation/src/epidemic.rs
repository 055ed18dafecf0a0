//! Epidemic transitions
//!
//! Infection samples a uniform SI edge, recovery a uniform infected node and
//! waning a uniform recovered node. Each transition is a single
//! [`NetworkState::set_status`] call, which rescans the node's neighborhood
//! and keeps the SI-edge index exact.

use serde::{Deserialize, Serialize};

use flockwork_core::{DiseaseModel, InvariantError, NodeId, SimRng, Status};

use crate::state::NetworkState;

/// A single node's status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub node: NodeId,
    pub from: Status,
    pub to: Status,
}

/// Applies infection, recovery and waning according to a disease model
#[derive(Debug, Clone, Copy)]
pub struct EpidemicEngine {
    model: DiseaseModel,
}

impl EpidemicEngine {
    pub fn new(model: DiseaseModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> DiseaseModel {
        self.model
    }

    /// Infect the susceptible end of a uniformly chosen SI edge
    pub fn infect(
        &self,
        state: &mut NetworkState,
        rng: &mut SimRng,
    ) -> Result<StatusChange, InvariantError> {
        let edge = state
            .si_edges()
            .sample(rng)
            .ok_or(InvariantError::EmptySource {
                process: "infection",
            })?;

        let (a, b) = edge.endpoints();
        let target = match (state.status(a), state.status(b)) {
            (Status::Infected, Status::Susceptible) => b,
            (Status::Susceptible, Status::Infected) => a,
            (left, right) => {
                return Err(InvariantError::NotAnSiEdge { edge, left, right });
            }
        };

        let from = state.set_status(target, Status::Infected);
        Ok(StatusChange {
            node: target,
            from,
            to: Status::Infected,
        })
    }

    /// Recover a uniformly chosen infected node
    ///
    /// SIS nodes become susceptible again, SIR and SIRS nodes become immune.
    pub fn recover(
        &self,
        state: &mut NetworkState,
        rng: &mut SimRng,
    ) -> Result<StatusChange, InvariantError> {
        let target_status = self
            .model
            .recovery_target()
            .ok_or(InvariantError::EmptySource {
                process: "recovery",
            })?;
        let node = state
            .infected()
            .sample(rng)
            .ok_or(InvariantError::EmptySource {
                process: "recovery",
            })?;

        let from = state.set_status(node, target_status);
        Ok(StatusChange {
            node,
            from,
            to: target_status,
        })
    }

    /// Return a uniformly chosen recovered node to susceptible
    pub fn wane(
        &self,
        state: &mut NetworkState,
        rng: &mut SimRng,
    ) -> Result<StatusChange, InvariantError> {
        if !self.model.has_waning() {
            return Err(InvariantError::EmptySource { process: "waning" });
        }
        let node = state
            .recovered()
            .sample(rng)
            .ok_or(InvariantError::EmptySource { process: "waning" })?;

        let from = state.set_status(node, Status::Susceptible);
        Ok(StatusChange {
            node,
            from,
            to: Status::Susceptible,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flockwork_core::{ContactGraph, Edge};

    fn star_state() -> NetworkState {
        // 0 at the center of 1, 2, 3
        let graph = ContactGraph::from_edges(4, [(0, 1), (0, 2), (0, 3)]).unwrap();
        NetworkState::new(graph)
    }

    #[test]
    fn test_infection_moves_one_node() {
        let mut state = star_state();
        state.set_status(0, Status::Infected);
        let engine = EpidemicEngine::new(DiseaseModel::SI);
        let mut rng = SimRng::new(3);

        let change = engine.infect(&mut state, &mut rng).unwrap();
        assert_eq!(change.to, Status::Infected);
        assert_eq!(change.from, Status::Susceptible);
        assert_ne!(change.node, 0);
        assert_eq!(state.infected().len(), 2);
        assert_eq!(state.si_edges().len(), 2);
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_infection_without_si_edges_is_an_error() {
        let mut state = star_state();
        let engine = EpidemicEngine::new(DiseaseModel::SIS);
        let mut rng = SimRng::new(3);
        assert_eq!(
            engine.infect(&mut state, &mut rng),
            Err(InvariantError::EmptySource {
                process: "infection"
            })
        );
    }

    #[test]
    fn test_sis_recovery_reopens_edges() {
        let mut state = star_state();
        state.set_status(0, Status::Infected);
        state.set_status(1, Status::Infected);
        assert_eq!(state.si_edges().len(), 2);

        let engine = EpidemicEngine::new(DiseaseModel::SIS);
        let mut rng = SimRng::new(8);
        let change = engine.recover(&mut state, &mut rng).unwrap();
        assert_eq!(change.to, Status::Susceptible);
        assert_eq!(state.infected().len(), 1);
        // Hub recovery leaves one SI edge, leaf recovery leaves three
        let expected = if change.node == 0 { 1 } else { 3 };
        assert_eq!(state.si_edges().len(), expected);
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_sir_recovery_closes_edges() {
        let mut state = star_state();
        state.set_status(0, Status::Infected);
        let engine = EpidemicEngine::new(DiseaseModel::SIR);
        let mut rng = SimRng::new(8);

        let change = engine.recover(&mut state, &mut rng).unwrap();
        assert_eq!(change.node, 0);
        assert_eq!(change.to, Status::Recovered);
        assert!(state.si_edges().is_empty());
        assert!(state.recovered().contains(&0));
    }

    #[test]
    fn test_si_model_has_no_recovery() {
        let mut state = star_state();
        state.set_status(0, Status::Infected);
        let engine = EpidemicEngine::new(DiseaseModel::SI);
        let mut rng = SimRng::new(8);
        assert!(engine.recover(&mut state, &mut rng).is_err());
    }

    #[test]
    fn test_waning_restores_si_edges() {
        let mut state = star_state();
        state.set_status(1, Status::Infected);
        state.set_status(0, Status::Recovered);
        assert!(state.si_edges().is_empty());

        let engine = EpidemicEngine::new(DiseaseModel::SIRS);
        let mut rng = SimRng::new(2);
        let change = engine.wane(&mut state, &mut rng).unwrap();
        assert_eq!(change.node, 0);
        assert_eq!(state.si_edges().to_sorted_vec(), vec![Edge::new(0, 1)]);
        state.check_invariants().unwrap();
    }
}
