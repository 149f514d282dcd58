use std::path::Path;

use chrono::Utc;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    network::{DuelingNetwork, argmax},
    optimizer::{Adam, AdamConfig},
    persist::{self, AgentCheckpoint, PersistError},
    replay_buffer::{Batch, ReplayBuffer, Transition, TransitionHandle},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub hidden_size: usize,
    pub buffer_capacity: usize,
    pub batch_size: usize,
    /// Discount factor of bootstrapped targets.
    pub gamma: f32,
    pub optimizer: AdamConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hidden_size: 64,
            buffer_capacity: 10_000,
            batch_size: 64,
            gamma: 0.99,
            optimizer: AdamConfig::default(),
        }
    }
}

/// Dueling double Q-learning agent.
///
/// The online network chooses actions and receives gradient steps. The
/// target network only changes through [`D3qnAgent::update_target_network`]
/// and provides the bootstrap term of every learning target.
#[derive(Debug, Clone)]
pub struct D3qnAgent {
    config: AgentConfig,
    online: DuelingNetwork,
    target: DuelingNetwork,
    optimizer: Adam,
    buffer: ReplayBuffer,
    epsilon: f32,
    rng: Pcg32,
}

impl D3qnAgent {
    #[must_use]
    pub fn new(observation_size: usize, action_count: usize, config: AgentConfig, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let online = DuelingNetwork::new(observation_size, config.hidden_size, action_count, &mut rng);
        let target = online.clone();
        let optimizer = Adam::new(config.optimizer, &online);
        let buffer = ReplayBuffer::new(config.buffer_capacity);
        Self {
            config,
            online,
            target,
            optimizer,
            buffer,
            epsilon: 1.0,
            rng,
        }
    }

    #[must_use]
    pub fn observation_size(&self) -> usize {
        self.online.inputs()
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.online.actions()
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    #[must_use]
    pub fn online(&self) -> &DuelingNetwork {
        &self.online
    }

    #[must_use]
    pub fn target(&self) -> &DuelingNetwork {
        &self.target
    }

    #[must_use]
    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    /// Exploration rate recorded with checkpoints.
    #[must_use]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon;
    }

    #[must_use]
    pub fn q_values(&self, state: &[f32]) -> Array1<f32> {
        self.online.q_values(state)
    }

    /// Epsilon-greedy action: uniform with probability `eps`, otherwise the
    /// first action of maximal Q-value.
    pub fn act(&mut self, state: &[f32], eps: f32) -> usize {
        if self.rng.random::<f32>() < eps {
            let action_count = self.action_count();
            return self.rng.random_range(0..action_count);
        }
        argmax(&self.q_values(state))
    }

    /// Stores a transition without learning from it.
    pub fn remember(
        &mut self,
        state: Vec<f32>,
        action: usize,
        reward: f32,
        next_state: Vec<f32>,
        done: bool,
    ) -> TransitionHandle {
        self.buffer.push(Transition {
            state,
            action,
            reward,
            next_state,
            done,
        })
    }

    /// Stores a transition, then learns from one sampled batch once the
    /// buffer holds enough transitions.
    pub fn step(
        &mut self,
        state: Vec<f32>,
        action: usize,
        reward: f32,
        next_state: Vec<f32>,
        done: bool,
    ) -> TransitionHandle {
        let handle = self.remember(state, action, reward, next_state, done);
        self.learn();
        handle
    }

    /// Overwrites the reward of a transition still held by the buffer.
    ///
    /// Returns `false` when the transition was already evicted.
    pub fn assign_reward(&mut self, handle: TransitionHandle, reward: f32) -> bool {
        self.buffer.set_reward(handle, reward)
    }

    /// One gradient step on a uniformly sampled batch. Returns the batch
    /// loss, or `None` while the buffer holds less than one batch.
    pub fn learn(&mut self) -> Option<f32> {
        let batch_size = self.config.batch_size;
        if batch_size == 0 || self.buffer.len() < batch_size {
            return None;
        }
        let batch = self.buffer.sample(batch_size, &mut self.rng).ok()?;
        Some(self.train_on(&batch))
    }

    /// `r + γ · max_a Q_target(s', a)`, or `r` alone for terminal transitions.
    #[must_use]
    pub fn targets(&self, batch: &Batch) -> Array1<f32> {
        let next_q = self.target.forward(batch.next_states.view());
        let best_next = next_q.map_axis(Axis(1), |row| {
            row.fold(f32::NEG_INFINITY, |acc, &q| acc.max(q))
        });
        let mut targets = batch.rewards.clone();
        for ((target, best), done) in targets.iter_mut().zip(&best_next).zip(&batch.dones) {
            if !done {
                *target += self.config.gamma * best;
            }
        }
        targets
    }

    /// Mean squared error between the online Q-value of each taken action
    /// and its target, minimized by one optimizer step.
    fn train_on(&mut self, batch: &Batch) -> f32 {
        let targets = self.targets(batch);
        let pass = self.online.forward_pass(batch.states.view());

        #[expect(clippy::cast_precision_loss)]
        let n = batch.len() as f32;
        let mut d_q = Array2::zeros(pass.q.raw_dim());
        let mut loss = 0.0;
        for (row, (&action, &target)) in batch.actions.iter().zip(&targets).enumerate() {
            let error = pass.q[[row, action]] - target;
            loss += error * error / n;
            d_q[[row, action]] = 2.0 * error / n;
        }

        let gradients = self.online.backward(&pass, &d_q);
        self.optimizer.update(&mut self.online, &gradients);
        loss
    }

    /// Copies the online parameters into the target network.
    pub fn update_target_network(&mut self) {
        self.target.copy_from(&self.online);
    }

    /// Writes `<name>.agent.json` and `<name>.buffer.json` into `dir`.
    pub fn save(&self, dir: &Path, name: &str) -> Result<(), PersistError> {
        let checkpoint = AgentCheckpoint {
            name: name.to_owned(),
            saved_at: Utc::now(),
            epsilon: self.epsilon,
            observation_size: self.observation_size(),
            action_count: self.action_count(),
            online: self.online.clone(),
            target: self.target.clone(),
            optimizer: self.optimizer.clone(),
        };
        persist::write_json(&persist::agent_path(dir, name), &checkpoint)?;
        self.buffer.save(&persist::buffer_path(dir, name))?;
        tracing::debug!(name, dir = %dir.display(), buffered = self.buffer.len(), "saved agent");
        Ok(())
    }

    /// Restores the state written by [`D3qnAgent::save`].
    ///
    /// A missing agent file is reported as [`PersistError::NotFound`]. A
    /// missing buffer file only starts the agent with an empty buffer.
    pub fn load(&mut self, dir: &Path, name: &str) -> Result<(), PersistError> {
        let path = persist::agent_path(dir, name);
        let checkpoint: AgentCheckpoint = persist::read_json(&path)?;
        let shape_ok = checkpoint.observation_size == self.observation_size()
            && checkpoint.action_count == self.action_count()
            && checkpoint.online.inputs() == checkpoint.observation_size
            && checkpoint.online.actions() == checkpoint.action_count;
        if !shape_ok {
            return Err(PersistError::ShapeMismatch {
                path,
                inputs: self.observation_size(),
                actions: self.action_count(),
                found_inputs: checkpoint.observation_size,
                found_actions: checkpoint.action_count,
            });
        }

        let buffer = match ReplayBuffer::load(&persist::buffer_path(dir, name)) {
            Ok(buffer) => buffer,
            Err(err) if err.is_not_found() => {
                tracing::warn!(name, "no replay buffer next to checkpoint, starting empty");
                ReplayBuffer::new(self.config.buffer_capacity)
            }
            Err(err) => return Err(err),
        };

        self.online = checkpoint.online;
        self.target = checkpoint.target;
        self.optimizer = checkpoint.optimizer;
        self.epsilon = checkpoint.epsilon;
        self.buffer = buffer;
        tracing::info!(
            name,
            saved_at = %checkpoint.saved_at,
            buffered = self.buffer.len(),
            "loaded agent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> AgentConfig {
        AgentConfig {
            hidden_size: 8,
            buffer_capacity: 32,
            batch_size: 4,
            ..AgentConfig::default()
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn fill(agent: &mut D3qnAgent, count: usize) {
        for i in 0..count {
            let x = i as f32 / 10.0;
            agent.remember(vec![x, 1.0 - x, 0.5], i % 2, x, vec![x + 0.1, 0.9 - x, 0.5], i % 5 == 0);
        }
    }

    #[test]
    fn test_greedy_act_picks_best_q() {
        let mut agent = D3qnAgent::new(3, 4, small_config(), 1);
        let state = [0.3, -0.2, 0.8];
        let q = agent.q_values(&state);
        let best = argmax(&q);
        for _ in 0..10 {
            assert_eq!(agent.act(&state, 0.0), best);
        }
    }

    #[test]
    fn test_random_act_covers_actions() {
        let mut agent = D3qnAgent::new(3, 4, small_config(), 2);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[agent.act(&[0.0; 3], 1.0)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_learn_waits_for_full_batch() {
        let mut agent = D3qnAgent::new(3, 2, small_config(), 3);
        fill(&mut agent, 3);
        assert_eq!(agent.learn(), None);
        fill(&mut agent, 1);
        assert!(agent.learn().is_some());
    }

    #[test]
    fn test_learning_leaves_target_untouched() {
        let mut agent = D3qnAgent::new(3, 2, small_config(), 4);
        let target_before = agent.target().clone();
        let online_before = agent.online().clone();
        fill(&mut agent, 16);
        for _ in 0..10 {
            agent.learn();
        }
        assert_eq!(agent.target(), &target_before);
        assert_ne!(agent.online(), &online_before);

        agent.update_target_network();
        assert_eq!(agent.target(), agent.online());
    }

    #[test]
    fn test_terminal_targets_skip_bootstrap() {
        let agent = D3qnAgent::new(2, 2, small_config(), 5);
        let batch = Batch {
            states: Array2::zeros((2, 2)),
            actions: vec![0, 1],
            rewards: Array1::from(vec![1.0, 1.0]),
            next_states: Array2::from_elem((2, 2), 0.5),
            dones: vec![true, false],
        };
        let targets = agent.targets(&batch);
        let next_q = agent.target().q_values(&[0.5, 0.5]);
        let best = next_q.fold(f32::NEG_INFINITY, |m, &q| m.max(q));
        assert!((targets[0] - 1.0).abs() < f32::EPSILON);
        assert!((targets[1] - (1.0 + 0.99 * best)).abs() < 1e-5);
    }

    #[test]
    fn test_learning_reduces_loss_on_fixed_data() {
        let config = AgentConfig {
            hidden_size: 16,
            buffer_capacity: 8,
            batch_size: 8,
            gamma: 0.0,
            optimizer: AdamConfig {
                learning_rate: 1e-2,
                ..AdamConfig::default()
            },
        };
        let mut agent = D3qnAgent::new(3, 2, config, 6);
        fill(&mut agent, 8);
        let first = agent.learn().unwrap();
        let mut last = first;
        for _ in 0..300 {
            last = agent.learn().unwrap();
        }
        assert!(last < first);
    }

    #[test]
    fn test_assign_reward_overwrites_in_place() {
        let mut agent = D3qnAgent::new(3, 2, small_config(), 7);
        fill(&mut agent, 2);
        let handle = agent.remember(vec![0.0; 3], 1, 2.5, vec![0.0; 3], true);
        assert!(agent.assign_reward(handle, -100.0));
        assert_eq!(agent.buffer().len(), 3);
        let stored = agent.buffer().get(handle).unwrap();
        assert!((stored.reward + 100.0).abs() < f32::EPSILON);
        assert!(stored.done);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = D3qnAgent::new(3, 2, small_config(), 8);
        fill(&mut agent, 10);
        agent.learn();
        agent.set_epsilon(0.25);
        agent.save(dir.path(), "enemy").unwrap();

        let mut restored = D3qnAgent::new(3, 2, small_config(), 9);
        restored.load(dir.path(), "enemy").unwrap();
        assert_eq!(restored.online(), agent.online());
        assert_eq!(restored.target(), agent.target());
        assert!((restored.epsilon() - 0.25).abs() < f32::EPSILON);
        assert!(restored.buffer().iter().eq(agent.buffer().iter()));
    }

    #[test]
    fn test_load_distinguishes_missing_and_mismatched() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = D3qnAgent::new(3, 2, small_config(), 10);
        let err = agent.load(dir.path(), "walls").unwrap_err();
        assert!(err.is_not_found());

        agent.save(dir.path(), "walls").unwrap();
        let mut wider = D3qnAgent::new(4, 2, small_config(), 11);
        let err = wider.load(dir.path(), "walls").unwrap_err();
        assert!(matches!(err, PersistError::ShapeMismatch { .. }));
    }
}
