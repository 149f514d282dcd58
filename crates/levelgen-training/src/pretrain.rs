//! Fully random warm-up passes for freshly created agents.
//!
//! Each pass starts a new curriculum episode, sweeps the placement stages up
//! to the one being warmed up with every acting agent learning from its
//! shaped rewards, and skips the solver stages.

use levelgen_env::{CurriculumEnv, EnvError, Stage};

use crate::{
    agents::StageAgents,
    episode::{self, FinalTransition},
};

const PRETRAIN_EPSILON: f32 = 1.0;

/// Placement stages warmed up by successive passes.
pub const PRETRAIN_STAGES: [Stage; 3] = [Stage::Walls, Stage::Enemy, Stage::Item];

/// Runs one pass ending with the sweep of `target` and returns that sweep's
/// score.
pub fn pretrain_pass(env: &mut CurriculumEnv, agents: &mut StageAgents, target: Stage) -> Result<f32, EnvError> {
    let mut state = env.reset()?;
    loop {
        let stage = env.stage();
        if stage.is_placement() {
            let outcome = episode::run_placement(
                env,
                agents.get_mut(stage),
                state,
                PRETRAIN_EPSILON,
                FinalTransition::Learn,
            )?;
            if stage == target {
                return Ok(outcome.score);
            }
        }
        state = env.advance()?;
    }
}

/// `rounds` passes for each stage of [`PRETRAIN_STAGES`], in order.
pub fn pretrain(env: &mut CurriculumEnv, agents: &mut StageAgents, rounds: usize) -> Result<(), EnvError> {
    for target in PRETRAIN_STAGES {
        let mut total = 0.0;
        for round in 1..=rounds {
            let score = pretrain_pass(env, agents, target)?;
            total += score;
            tracing::debug!(stage = %target, round, score, "pretrain pass");
        }
        #[expect(clippy::cast_precision_loss)]
        let mean = if rounds == 0 { 0.0 } else { total / rounds as f32 };
        tracing::info!(stage = %target, rounds, mean_score = mean, "pretrained");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use levelgen_agent::AgentConfig;
    use levelgen_env::EnvConfig;

    use super::*;

    #[test]
    fn test_item_pass_trains_all_placement_agents() {
        let config = EnvConfig {
            map_size: Some(3),
            ..EnvConfig::default()
        };
        let mut env = CurriculumEnv::new(config, 50).unwrap();
        let agent_config = AgentConfig {
            hidden_size: 4,
            batch_size: 4,
            ..AgentConfig::default()
        };
        let mut agents = StageAgents::new(&agent_config, 51);
        pretrain_pass(&mut env, &mut agents, Stage::Item).unwrap();

        for stage in PRETRAIN_STAGES {
            assert_eq!(agents.get(stage).buffer().len(), 9);
        }
        assert!(agents.get(Stage::Solver).buffer().is_empty());
        assert_eq!(env.stage(), Stage::Item);
    }

    #[test]
    fn test_pretrain_rounds() {
        let config = EnvConfig {
            map_size: Some(3),
            ..EnvConfig::default()
        };
        let mut env = CurriculumEnv::new(config, 52).unwrap();
        let agent_config = AgentConfig {
            hidden_size: 4,
            batch_size: 4,
            ..AgentConfig::default()
        };
        let mut agents = StageAgents::new(&agent_config, 53);
        pretrain(&mut env, &mut agents, 2).unwrap();

        // walls sweep in all three passes, enemy in two, item in one
        assert_eq!(agents.get(Stage::Walls).buffer().len(), 6 * 9);
        assert_eq!(agents.get(Stage::Enemy).buffer().len(), 4 * 9);
        assert_eq!(agents.get(Stage::Item).buffer().len(), 2 * 9);
    }
}
