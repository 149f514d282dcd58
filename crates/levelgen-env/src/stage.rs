use serde::{Deserialize, Serialize};

/// Phase of a curriculum episode.
///
/// Stages run in declaration order. [`Stage::Walls`], [`Stage::Enemy`] and
/// [`Stage::Item`] place objects while a cursor sweeps the grid; the two
/// solver stages play the level generated so far.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[display("walls")]
    Walls,
    #[display("wall_solver")]
    WallSolver,
    #[display("enemy")]
    Enemy,
    #[display("item")]
    Item,
    #[display("solver")]
    Solver,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Walls,
        Stage::WallSolver,
        Stage::Enemy,
        Stage::Item,
        Stage::Solver,
    ];

    /// Stages that own a learning agent. The wall solver reuses the solver's.
    pub const AGENT_STAGES: [Stage; 4] = [Stage::Walls, Stage::Enemy, Stage::Item, Stage::Solver];

    #[must_use]
    pub fn successor(self) -> Option<Stage> {
        match self {
            Stage::Walls => Some(Stage::WallSolver),
            Stage::WallSolver => Some(Stage::Enemy),
            Stage::Enemy => Some(Stage::Item),
            Stage::Item => Some(Stage::Solver),
            Stage::Solver => None,
        }
    }

    #[must_use]
    pub fn is_placement(self) -> bool {
        matches!(self, Stage::Walls | Stage::Enemy | Stage::Item)
    }

    #[must_use]
    pub fn is_solving(self) -> bool {
        !self.is_placement()
    }

    /// Stage whose agent acts during this stage.
    #[must_use]
    pub fn agent_stage(self) -> Stage {
        match self {
            Stage::WallSolver => Stage::Solver,
            stage => stage,
        }
    }

    /// Observation width and action count of the agent acting in this stage.
    #[must_use]
    pub fn space(self) -> StageSpace {
        match self.agent_stage() {
            Stage::Walls => StageSpace::new(26, 2),
            Stage::Enemy => StageSpace::new(14, 2),
            Stage::Item => StageSpace::new(21, 3),
            _ => StageSpace::new(33, 8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpace {
    pub observation_size: usize,
    pub action_count: usize,
}

impl StageSpace {
    #[must_use]
    pub const fn new(observation_size: usize, action_count: usize) -> Self {
        Self {
            observation_size,
            action_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successors_follow_declaration_order() {
        for pair in Stage::ALL.windows(2) {
            assert_eq!(pair[0].successor(), Some(pair[1]));
        }
        assert_eq!(Stage::Solver.successor(), None);
    }

    #[test]
    fn test_wall_solver_shares_solver_space() {
        assert_eq!(Stage::WallSolver.agent_stage(), Stage::Solver);
        assert_eq!(Stage::WallSolver.space(), Stage::Solver.space());
    }

    #[test]
    fn test_display_matches_serde_name() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{stage}\""));
        }
    }
}
