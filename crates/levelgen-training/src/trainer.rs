use levelgen_agent::{D3qnAgent, PersistError, TransitionHandle};
use levelgen_env::{CurriculumEnv, EnvConfig, EnvError, Stage};
use levelgen_game::{AsciiFrame, Renderer};
use rand::Rng as _;

use crate::{
    agents::StageAgents,
    config::TrainConfig,
    episode::{FinalTransition, curriculum_reward, run_greedy, run_placement, run_solver},
    pretrain,
    score::{ScoreWindows, StageScores},
};

/// Episodes between pooled score summaries.
const SUMMARY_EVERY: usize = 100;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainError {
    #[display("environment error")]
    Env(EnvError),
    #[display("checkpoint error")]
    Persist(PersistError),
}

/// Outcome of one curriculum episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeReport {
    pub episode: usize,
    /// Exploration rate the episode was played with.
    pub epsilon: f32,
    pub scores: StageScores,
    /// The wall solver reached the exit of the walled level.
    pub walls_passable: bool,
    /// The final solver reached the exit.
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSummary {
    pub episodes: usize,
    pub resumed: bool,
    pub mean_score: f32,
    pub epsilon: f32,
}

/// One greedy curriculum episode, played without learning.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    /// Generated level before the solver ran.
    pub level: AsciiFrame,
    pub walls_passable: bool,
    pub solver_score: f32,
    pub completed: bool,
}

/// Drives curriculum episodes and owns everything they mutate.
///
/// Generation agents store the last transition of each sweep without
/// learning from it. Once the matching solver run is over, that transition's
/// reward is overwritten with the curriculum reward and the agent learns:
/// the wall agent from the wall solver, the enemy and item agents from the
/// final solver.
pub struct CurriculumTrainer {
    config: TrainConfig,
    env: CurriculumEnv,
    agents: StageAgents,
    renderer: Box<dyn Renderer>,
    windows: ScoreWindows,
    epsilon: f32,
    episode: usize,
}

impl CurriculumTrainer {
    pub fn new(config: TrainConfig, env_config: EnvConfig, renderer: Box<dyn Renderer>) -> Result<Self, TrainError> {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let env = CurriculumEnv::new(env_config, seed)?;
        let agents = StageAgents::new(&config.agent, seed.wrapping_add(1));
        tracing::debug!(seed, "created trainer");
        Ok(Self {
            epsilon: config.eps_start,
            config,
            env,
            agents,
            renderer,
            windows: ScoreWindows::default(),
            episode: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    #[must_use]
    pub fn env(&self) -> &CurriculumEnv {
        &self.env
    }

    #[must_use]
    pub fn agents(&self) -> &StageAgents {
        &self.agents
    }

    #[must_use]
    pub fn windows(&self) -> &ScoreWindows {
        &self.windows
    }

    #[must_use]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Number of curriculum episodes played so far.
    #[must_use]
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Restores checkpoints from the models directory.
    ///
    /// Returns `true` when every agent was restored; the exploration rate
    /// then continues from the saved one.
    pub fn load(&mut self) -> Result<bool, TrainError> {
        let resumed = self.agents.load_all(&self.config.models_dir)?;
        if resumed {
            self.epsilon = self.agents.get(Stage::Solver).epsilon();
            tracing::info!(epsilon = self.epsilon, "resumed from checkpoints");
        }
        Ok(resumed)
    }

    /// Loads checkpoints, pretraining the agents when any is missing.
    pub fn prepare(&mut self) -> Result<bool, TrainError> {
        let resumed = self.load()?;
        if !resumed {
            pretrain::pretrain(&mut self.env, &mut self.agents, self.config.pretrain_rounds)?;
        }
        Ok(resumed)
    }

    pub fn save(&mut self) -> Result<(), TrainError> {
        self.agents.set_epsilon(self.epsilon);
        self.agents.save_all(&self.config.models_dir)?;
        Ok(())
    }

    /// Prepares the agents, plays the configured number of episodes and
    /// saves the final checkpoints.
    pub fn train(&mut self) -> Result<TrainSummary, TrainError> {
        let resumed = self.prepare()?;
        for _ in 0..self.config.episodes {
            self.run_episode()?;
        }
        self.save()?;
        let summary = TrainSummary {
            episodes: self.config.episodes,
            resumed,
            mean_score: self.windows.overall_mean(),
            epsilon: self.epsilon,
        };
        tracing::info!(
            episodes = summary.episodes,
            mean_score = summary.mean_score,
            epsilon = summary.epsilon,
            "training finished"
        );
        Ok(summary)
    }

    /// Plays one full curriculum episode, learning in every stage.
    pub fn run_episode(&mut self) -> Result<EpisodeReport, TrainError> {
        self.episode += 1;
        let episode = self.episode;
        let eps = self.epsilon;
        let render = self.config.should_render(episode);
        let env = &mut self.env;
        let agents = &mut self.agents;

        let state = env.reset()?;
        let walls = run_placement(env, agents.get_mut(Stage::Walls), state, eps, FinalTransition::Defer)?;
        let state = env.advance()?;
        let wall_solver = run_solver(env, agents.get_mut(Stage::WallSolver), state, eps)?;
        assign_curriculum_reward(
            agents.get_mut(Stage::Walls),
            walls.last,
            curriculum_reward(wall_solver.completed),
        );

        let state = env.advance()?;
        let enemy = run_placement(env, agents.get_mut(Stage::Enemy), state, eps, FinalTransition::Defer)?;
        let state = env.advance()?;
        let item = run_placement(env, agents.get_mut(Stage::Item), state, eps, FinalTransition::Defer)?;
        if render {
            self.renderer.render(&format!("episode {episode} level"), env.game());
        }

        let state = env.advance()?;
        let solver = run_solver(env, agents.get_mut(Stage::Solver), state, eps)?;
        if render {
            self.renderer.render(&format!("episode {episode} solver"), env.game());
        }
        let reward = curriculum_reward(solver.completed);
        assign_curriculum_reward(agents.get_mut(Stage::Enemy), enemy.last, reward);
        assign_curriculum_reward(agents.get_mut(Stage::Item), item.last, reward);

        let report = EpisodeReport {
            episode,
            epsilon: eps,
            scores: StageScores {
                walls: walls.score,
                enemy: enemy.score,
                item: item.score,
                solver: wall_solver.score + solver.score,
            },
            walls_passable: wall_solver.completed,
            completed: solver.completed,
        };
        self.windows.push(&report.scores);
        self.epsilon = self.config.decay_epsilon(eps);

        if self.config.should_sync_targets(episode) {
            self.agents.update_target_networks();
            tracing::debug!(episode, "synced target networks");
        }
        if self.config.should_save(episode) {
            self.save()?;
        }

        let means = self.windows.means();
        tracing::debug!(
            episode,
            walls = means.walls,
            enemy = means.enemy,
            item = means.item,
            solver = means.solver,
            completed = report.completed,
            "episode finished"
        );
        if episode % SUMMARY_EVERY == 0 {
            tracing::info!(
                episode,
                mean_score = self.windows.overall_mean(),
                epsilon = self.epsilon,
                "average score"
            );
        }
        Ok(report)
    }

    /// Generates one level with greedy policies and lets the solver play it,
    /// without storing transitions or learning.
    pub fn preview(&mut self) -> Result<PreviewReport, TrainError> {
        let env = &mut self.env;
        let agents = &mut self.agents;

        let state = env.reset()?;
        run_greedy(env, agents.get_mut(Stage::Walls), state)?;
        let state = env.advance()?;
        let (_, walls_passable) = run_greedy(env, agents.get_mut(Stage::WallSolver), state)?;
        let state = env.advance()?;
        run_greedy(env, agents.get_mut(Stage::Enemy), state)?;
        let state = env.advance()?;
        run_greedy(env, agents.get_mut(Stage::Item), state)?;
        let level = AsciiFrame::capture(env.game());
        self.renderer.render("preview level", env.game());

        let state = env.advance()?;
        let (solver_score, completed) = run_greedy(env, agents.get_mut(Stage::Solver), state)?;
        self.renderer.render("preview solver", env.game());

        Ok(PreviewReport {
            level,
            walls_passable,
            solver_score,
            completed,
        })
    }
}

fn assign_curriculum_reward(agent: &mut D3qnAgent, last: Option<TransitionHandle>, reward: f32) {
    let Some(handle) = last else {
        return;
    };
    if agent.assign_reward(handle, reward) {
        agent.learn();
    } else {
        tracing::warn!("final sweep transition was evicted before its curriculum reward");
    }
}

#[cfg(test)]
mod tests {
    use levelgen_agent::AgentConfig;
    use levelgen_game::NullRenderer;

    use super::*;

    fn trainer(dir: &std::path::Path, map_size: usize) -> CurriculumTrainer {
        let config = TrainConfig {
            episodes: 3,
            pretrain_rounds: 1,
            target_update: 2,
            models_dir: dir.to_owned(),
            seed: Some(60),
            agent: AgentConfig {
                hidden_size: 8,
                batch_size: 16,
                ..AgentConfig::default()
            },
            ..TrainConfig::default()
        };
        let env_config = EnvConfig {
            map_size: Some(map_size),
            ..EnvConfig::default()
        };
        CurriculumTrainer::new(config, env_config, Box::new(NullRenderer)).unwrap()
    }

    #[test]
    fn test_episode_rewrites_last_sweep_rewards() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 4);
        let report = trainer.run_episode().unwrap();

        for stage in [Stage::Walls, Stage::Enemy, Stage::Item] {
            let buffer = trainer.agents().get(stage).buffer();
            assert_eq!(buffer.len(), 16, "{stage}");
            let last = buffer.iter().last().unwrap();
            assert!(last.done);
            assert!((last.reward.abs() - 100.0).abs() < f32::EPSILON);
        }
        let walls_last = trainer.agents().get(Stage::Walls).buffer().iter().last().unwrap().reward;
        assert_eq!(walls_last > 0.0, report.walls_passable);
        let item_last = trainer.agents().get(Stage::Item).buffer().iter().last().unwrap().reward;
        assert_eq!(item_last > 0.0, report.completed);
    }

    #[test]
    fn test_epsilon_decays_per_episode() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 3);
        let first = trainer.run_episode().unwrap();
        let second = trainer.run_episode().unwrap();
        assert!((first.epsilon - 1.0).abs() < f32::EPSILON);
        assert!((second.epsilon - 0.995).abs() < 1e-6);
        assert_eq!(trainer.episode(), 2);
        assert_eq!(trainer.windows().walls.len(), 2);
    }

    #[test]
    fn test_targets_sync_on_cadence() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 3);
        trainer.run_episode().unwrap();
        trainer.run_episode().unwrap();
        let solver = trainer.agents().get(Stage::Solver);
        assert_eq!(solver.target(), solver.online());
    }

    #[test]
    fn test_train_saves_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = trainer(dir.path(), 3);
        let summary = first.train().unwrap();
        assert!(!summary.resumed);
        for stage in Stage::AGENT_STAGES {
            assert!(dir.path().join(format!("{stage}.agent.json")).exists());
            assert!(dir.path().join(format!("{stage}.buffer.json")).exists());
        }

        let mut second = trainer(dir.path(), 3);
        assert!(second.load().unwrap());
        assert!((second.epsilon() - summary.epsilon).abs() < f32::EPSILON);
        assert_eq!(
            second.agents().get(Stage::Walls).online(),
            first.agents().get(Stage::Walls).online()
        );
    }

    #[test]
    fn test_preview_does_not_learn() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = trainer(dir.path(), 5);
        let report = trainer.preview().unwrap();
        assert_eq!(report.level.size(), 5);
        for (_, agent) in trainer.agents().iter() {
            assert!(agent.buffer().is_empty());
        }
    }
}
