use std::path::PathBuf;

use anyhow::Context;
use levelgen_game::TracingRenderer;
use levelgen_training::{CurriculumTrainer, TrainConfig};

use super::env_args::EnvArgs;
use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of curriculum episodes
    #[arg(long)]
    episodes: Option<usize>,
    /// JSON file with training parameters
    #[arg(long)]
    train_config: Option<PathBuf>,
    /// Directory holding agent checkpoints
    #[arg(long)]
    models_dir: Option<PathBuf>,
    /// Save checkpoints every N episodes
    #[arg(long)]
    save_every: Option<usize>,
    /// Render the generated level every N episodes (0 disables)
    #[arg(long)]
    render_every: Option<usize>,
    /// Sync target networks every N episodes
    #[arg(long)]
    target_update: Option<usize>,
    /// Pretraining rounds per placement stage
    #[arg(long)]
    pretrain_rounds: Option<usize>,
    #[arg(long)]
    eps_start: Option<f32>,
    #[arg(long)]
    eps_end: Option<f32>,
    #[arg(long)]
    eps_decay: Option<f32>,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
    #[clap(flatten)]
    env: EnvArgs,
}

impl TrainArg {
    fn to_train_config(&self) -> anyhow::Result<TrainConfig> {
        let mut config = match &self.train_config {
            Some(path) => util::read_json_file(path)?,
            None => TrainConfig::default(),
        };
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(dir) = &self.models_dir {
            config.models_dir.clone_from(dir);
        }
        if let Some(every) = self.save_every {
            config.save_every = Some(every);
        }
        if let Some(every) = self.render_every {
            config.render_every = every;
        }
        if let Some(every) = self.target_update {
            config.target_update = every;
        }
        if let Some(rounds) = self.pretrain_rounds {
            config.pretrain_rounds = rounds;
        }
        if let Some(eps) = self.eps_start {
            config.eps_start = eps;
        }
        if let Some(eps) = self.eps_end {
            config.eps_end = eps;
        }
        if let Some(decay) = self.eps_decay {
            config.eps_decay = decay;
        }
        config.seed = self.seed.or(config.seed);
        Ok(config)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.to_train_config()?;
    let env_config = arg.env.to_env_config()?;
    tracing::info!(
        episodes = config.episodes,
        models_dir = %config.models_dir.display(),
        "starting curriculum training"
    );

    let mut trainer = CurriculumTrainer::new(config, env_config, Box::new(TracingRenderer))
        .context("Failed to set up training")?;
    let summary = trainer.train().context("Training failed")?;
    tracing::info!(
        episodes = summary.episodes,
        resumed = summary.resumed,
        mean_score = summary.mean_score,
        "done"
    );
    Ok(())
}
