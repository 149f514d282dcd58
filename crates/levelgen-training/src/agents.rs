use std::path::Path;

use levelgen_agent::{AgentConfig, D3qnAgent, PersistError};
use levelgen_env::Stage;

/// One agent per agent-owning stage.
///
/// The wall solver stage is played by the solver agent, so lookups go
/// through [`Stage::agent_stage`].
#[derive(Debug, Clone)]
pub struct StageAgents {
    walls: D3qnAgent,
    enemy: D3qnAgent,
    item: D3qnAgent,
    solver: D3qnAgent,
}

fn agent_for(stage: Stage, config: &AgentConfig, seed: u64) -> D3qnAgent {
    let space = stage.space();
    D3qnAgent::new(space.observation_size, space.action_count, config.clone(), seed)
}

impl StageAgents {
    #[must_use]
    pub fn new(config: &AgentConfig, seed: u64) -> Self {
        Self {
            walls: agent_for(Stage::Walls, config, seed),
            enemy: agent_for(Stage::Enemy, config, seed.wrapping_add(1)),
            item: agent_for(Stage::Item, config, seed.wrapping_add(2)),
            solver: agent_for(Stage::Solver, config, seed.wrapping_add(3)),
        }
    }

    #[must_use]
    pub fn get(&self, stage: Stage) -> &D3qnAgent {
        match stage.agent_stage() {
            Stage::Walls => &self.walls,
            Stage::Enemy => &self.enemy,
            Stage::Item => &self.item,
            Stage::WallSolver | Stage::Solver => &self.solver,
        }
    }

    pub fn get_mut(&mut self, stage: Stage) -> &mut D3qnAgent {
        match stage.agent_stage() {
            Stage::Walls => &mut self.walls,
            Stage::Enemy => &mut self.enemy,
            Stage::Item => &mut self.item,
            Stage::WallSolver | Stage::Solver => &mut self.solver,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &D3qnAgent)> + '_ {
        Stage::AGENT_STAGES
            .into_iter()
            .map(|stage| (stage, self.get(stage)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut D3qnAgent> + '_ {
        [
            &mut self.walls,
            &mut self.enemy,
            &mut self.item,
            &mut self.solver,
        ]
        .into_iter()
    }

    /// Loads every agent found in `dir`, keyed by stage name.
    ///
    /// Returns `true` when all agents were restored. Agents without a
    /// checkpoint keep their fresh parameters; any other failure is returned.
    pub fn load_all(&mut self, dir: &Path) -> Result<bool, PersistError> {
        let mut restored = true;
        for stage in Stage::AGENT_STAGES {
            match self.get_mut(stage).load(dir, &stage.to_string()) {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    tracing::info!(%stage, dir = %dir.display(), "no checkpoint, starting fresh");
                    restored = false;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(restored)
    }

    pub fn save_all(&self, dir: &Path) -> Result<(), PersistError> {
        for (stage, agent) in self.iter() {
            agent.save(dir, &stage.to_string())?;
        }
        tracing::info!(dir = %dir.display(), "saved checkpoints");
        Ok(())
    }

    pub fn update_target_networks(&mut self) {
        for agent in self.iter_mut() {
            agent.update_target_network();
        }
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        for agent in self.iter_mut() {
            agent.set_epsilon(epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> AgentConfig {
        AgentConfig {
            hidden_size: 4,
            buffer_capacity: 16,
            batch_size: 4,
            ..AgentConfig::default()
        }
    }

    #[test]
    fn test_agents_match_stage_spaces() {
        let agents = StageAgents::new(&small_config(), 0);
        for stage in Stage::ALL {
            let space = stage.space();
            let agent = agents.get(stage);
            assert_eq!(agent.observation_size(), space.observation_size);
            assert_eq!(agent.action_count(), space.action_count);
        }
    }

    #[test]
    fn test_wall_solver_uses_solver_agent() {
        let mut agents = StageAgents::new(&small_config(), 1);
        agents
            .get_mut(Stage::WallSolver)
            .remember(vec![0.0; 33], 0, 1.0, vec![0.0; 33], false);
        assert_eq!(agents.get(Stage::Solver).buffer().len(), 1);
    }

    #[test]
    fn test_load_all_reports_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut agents = StageAgents::new(&small_config(), 2);
        assert!(!agents.load_all(dir.path()).unwrap());

        agents.set_epsilon(0.5);
        agents.save_all(dir.path()).unwrap();
        let mut restored = StageAgents::new(&small_config(), 3);
        assert!(restored.load_all(dir.path()).unwrap());
        for (stage, agent) in restored.iter() {
            assert_eq!(agent.online(), agents.get(stage).online());
            assert!((agent.epsilon() - 0.5).abs() < f32::EPSILON);
        }
    }
}
