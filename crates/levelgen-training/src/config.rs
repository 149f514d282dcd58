use std::path::PathBuf;

use levelgen_agent::AgentConfig;
use serde::{Deserialize, Serialize};

/// Curriculum training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    pub episodes: usize,
    pub eps_start: f32,
    pub eps_end: f32,
    /// Multiplicative decay applied once per curriculum episode.
    pub eps_decay: f32,
    /// Episodes between target network syncs.
    pub target_update: usize,
    /// Rounds of each pretraining pass when no checkpoint was loaded.
    pub pretrain_rounds: usize,
    /// Episodes between rendered levels, `0` disables rendering.
    pub render_every: usize,
    pub save_every: Option<usize>,
    pub models_dir: PathBuf,
    pub seed: Option<u64>,
    pub agent: AgentConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            episodes: 10_000,
            eps_start: 1.0,
            eps_end: 0.01,
            eps_decay: 0.995,
            target_update: 10,
            pretrain_rounds: 20,
            render_every: 50,
            save_every: None,
            models_dir: PathBuf::from("models"),
            seed: None,
            agent: AgentConfig::default(),
        }
    }
}

impl TrainConfig {
    /// `max(eps_end, eps_decay * epsilon)`
    #[must_use]
    pub fn decay_epsilon(&self, epsilon: f32) -> f32 {
        (self.eps_decay * epsilon).max(self.eps_end)
    }

    #[must_use]
    pub fn is_due(every: usize, episode: usize) -> bool {
        every > 0 && episode % every == 0
    }

    #[must_use]
    pub fn should_render(&self, episode: usize) -> bool {
        Self::is_due(self.render_every, episode)
    }

    #[must_use]
    pub fn should_sync_targets(&self, episode: usize) -> bool {
        Self::is_due(self.target_update, episode)
    }

    #[must_use]
    pub fn should_save(&self, episode: usize) -> bool {
        self.save_every.is_some_and(|every| Self::is_due(every, episode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_decays_to_floor() {
        let config = TrainConfig::default();
        let mut eps = config.eps_start;
        for _ in 0..2000 {
            let next = config.decay_epsilon(eps);
            assert!(next <= eps);
            eps = next;
        }
        assert!((eps - config.eps_end).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cadences() {
        let config = TrainConfig {
            render_every: 0,
            save_every: Some(25),
            ..TrainConfig::default()
        };
        assert!(!config.should_render(50));
        assert!(config.should_sync_targets(20));
        assert!(!config.should_sync_targets(21));
        assert!(config.should_save(75));
        assert!(!config.should_save(80));
        assert!(!TrainConfig::default().should_save(100));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: TrainConfig =
            serde_json::from_str(r#"{ "episodes": 5, "agent": { "batch_size": 8 } }"#).unwrap();
        assert_eq!(config.episodes, 5);
        assert_eq!(config.agent.batch_size, 8);
        assert_eq!(config.agent.hidden_size, 64);
        assert_eq!(config.target_update, 10);
    }
}
