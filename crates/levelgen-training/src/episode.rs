//! Single-stage rollouts.
//!
//! Each runner plays the current stage of a [`CurriculumEnv`] to its end,
//! feeding every transition to the acting agent. None of them advances the
//! environment.

use levelgen_agent::{D3qnAgent, TransitionHandle};
use levelgen_env::{CurriculumEnv, EnvError, Observation};

/// Reward given to generation stages for a level the solver completed.
pub const COMPLETION_REWARD: f32 = 100.0;
/// Reward given to generation stages for a level the solver failed.
pub const FAILURE_REWARD: f32 = -100.0;

/// Curriculum reward for a solver outcome.
#[must_use]
pub fn curriculum_reward(completed: bool) -> f32 {
    if completed {
        COMPLETION_REWARD
    } else {
        FAILURE_REWARD
    }
}

/// How a placement runner stores the last transition of its sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum FinalTransition {
    /// Store it with its shaped reward and learn from it.
    Learn,
    /// Store it without learning; its reward is assigned later.
    Defer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementOutcome {
    /// Sum of shaped rewards over the sweep.
    pub score: f32,
    pub steps: usize,
    /// Handle of the last stored transition.
    pub last: Option<TransitionHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOutcome {
    pub score: f32,
    pub steps: usize,
    /// The exit was reached before truncation.
    pub completed: bool,
}

/// Sweeps the current placement stage with `agent`.
pub fn run_placement(
    env: &mut CurriculumEnv,
    agent: &mut D3qnAgent,
    mut state: Observation,
    eps: f32,
    last: FinalTransition,
) -> Result<PlacementOutcome, EnvError> {
    let mut score = 0.0;
    let mut steps = 0;
    loop {
        let action = agent.act(&state, eps);
        let outcome = env.step(action)?;
        score += outcome.reward;
        steps += 1;

        let done = outcome.is_terminal();
        let next_state = outcome.observation;
        if done && last.is_defer() {
            let handle = agent.remember(state, action, outcome.reward, next_state, true);
            return Ok(PlacementOutcome {
                score,
                steps,
                last: Some(handle),
            });
        }
        let handle = agent.step(state, action, outcome.reward, next_state.clone(), done);
        if done {
            return Ok(PlacementOutcome {
                score,
                steps,
                last: Some(handle),
            });
        }
        state = next_state;
    }
}

/// Plays the current solver stage with `agent`, learning from every step.
///
/// Truncated runs still end with a terminal transition.
pub fn run_solver(
    env: &mut CurriculumEnv,
    agent: &mut D3qnAgent,
    mut state: Observation,
    eps: f32,
) -> Result<SolverOutcome, EnvError> {
    let mut score = 0.0;
    let mut steps = 0;
    loop {
        let action = agent.act(&state, eps);
        let outcome = env.step(action)?;
        score += outcome.reward;
        steps += 1;

        let done = outcome.is_terminal();
        agent.step(state, action, outcome.reward, outcome.observation.clone(), done);
        if done {
            return Ok(SolverOutcome {
                score,
                steps,
                completed: outcome.stage_done,
            });
        }
        state = outcome.observation;
    }
}

/// Plays the current stage greedily without storing or learning anything.
///
/// Returns the summed reward and whether the stage ended by completion.
pub fn run_greedy(
    env: &mut CurriculumEnv,
    agent: &mut D3qnAgent,
    mut state: Observation,
) -> Result<(f32, bool), EnvError> {
    let mut score = 0.0;
    loop {
        let action = agent.act(&state, 0.0);
        let outcome = env.step(action)?;
        score += outcome.reward;
        if outcome.is_terminal() {
            return Ok((score, outcome.stage_done));
        }
        state = outcome.observation;
    }
}

#[cfg(test)]
mod tests {
    use levelgen_agent::AgentConfig;
    use levelgen_env::{EnvConfig, Stage};
    use levelgen_game::{Level, Pos};

    use super::*;

    fn setup(map_size: usize, stage: Stage) -> (CurriculumEnv, D3qnAgent, Observation) {
        let config = EnvConfig {
            map_size: Some(map_size),
            ..EnvConfig::default()
        };
        let mut env = CurriculumEnv::new(config, 40).unwrap();
        let mut state = env.reset().unwrap();
        while env.stage() != stage {
            state = env.advance().unwrap();
        }
        let space = stage.space();
        let agent_config = AgentConfig {
            hidden_size: 8,
            batch_size: 8,
            ..AgentConfig::default()
        };
        let agent = D3qnAgent::new(space.observation_size, space.action_count, agent_config, 41);
        (env, agent, state)
    }

    #[test]
    fn test_deferred_sweep_stores_every_step_once() {
        let (mut env, mut agent, state) = setup(4, Stage::Walls);
        let outcome = run_placement(&mut env, &mut agent, state, 1.0, FinalTransition::Defer).unwrap();
        assert_eq!(outcome.steps, 16);
        assert_eq!(agent.buffer().len(), 16);

        let handle = outcome.last.unwrap();
        assert!(agent.buffer().get(handle).unwrap().done);
        assert!(agent.assign_reward(handle, COMPLETION_REWARD));
        assert_eq!(agent.buffer().len(), 16);
        let last = agent.buffer().iter().last().unwrap();
        assert!((last.reward - COMPLETION_REWARD).abs() < f32::EPSILON);
    }

    #[test]
    fn test_learned_sweep_keeps_shaped_reward() {
        let (mut env, mut agent, state) = setup(3, Stage::Enemy);
        let outcome = run_placement(&mut env, &mut agent, state, 1.0, FinalTransition::Learn).unwrap();
        assert_eq!(outcome.steps, 9);
        let stored: f32 = agent.buffer().iter().map(|t| t.reward).sum();
        assert!((stored - outcome.score).abs() < 1e-4);
    }

    #[test]
    fn test_solver_run_ends_with_terminal_transition() {
        let (mut env, mut agent, state) = setup(3, Stage::WallSolver);
        let outcome = run_solver(&mut env, &mut agent, state, 1.0).unwrap();
        assert_eq!(agent.buffer().len(), outcome.steps);
        assert!(agent.buffer().iter().last().unwrap().done);
        assert!(outcome.steps <= 3 * 3 * 4 + 1);
    }

    #[test]
    fn test_solver_run_ends_on_death() {
        let (mut env, mut agent, _) = setup(3, Stage::Solver);
        let mut params = env.params().clone();
        params.health = 1;
        // the exit is walled off and every open tile is next to an enemy
        let mut level = Level::new(3, Pos::new(0, 0), Pos::new(2, 2)).unwrap();
        level.add_wall_at(Pos::new(1, 2));
        level.add_wall_at(Pos::new(2, 1));
        for pos in [(1, 0), (0, 1), (1, 1), (2, 0), (0, 2)] {
            level.add_enemy_at(Pos::new(pos.0, pos.1));
        }
        env.reset_with_level(params, level);
        let mut state = env.observe();
        while env.stage() != Stage::Solver {
            state = env.advance().unwrap();
        }

        let outcome = run_solver(&mut env, &mut agent, state, 1.0).unwrap();
        assert!(!outcome.completed);
        assert!(env.game().player().health() <= 0);
        assert_eq!(agent.buffer().len(), outcome.steps);
        let last = agent.buffer().iter().last().unwrap();
        assert!(last.done);
        assert!((last.reward - -100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_greedy_run_stores_nothing() {
        let (mut env, mut agent, state) = setup(3, Stage::Item);
        run_greedy(&mut env, &mut agent, state).unwrap();
        assert!(agent.buffer().is_empty());
    }

    #[test]
    fn test_curriculum_reward_sign() {
        assert!(curriculum_reward(true) > 0.0);
        assert!(curriculum_reward(false) < 0.0);
    }
}
