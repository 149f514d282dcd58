use std::{
    io::{self, Write as _},
    path::PathBuf,
};

use anyhow::Context;
use levelgen_game::NullRenderer;
use levelgen_training::{CurriculumTrainer, TrainConfig};

use super::env_args::EnvArgs;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PreviewArg {
    /// Directory holding agent checkpoints
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
    #[clap(flatten)]
    env: EnvArgs,
}

pub(crate) fn run(arg: &PreviewArg) -> anyhow::Result<()> {
    let config = TrainConfig {
        models_dir: arg.models_dir.clone(),
        seed: arg.seed,
        ..TrainConfig::default()
    };
    let env_config = arg.env.to_env_config()?;
    let mut trainer =
        CurriculumTrainer::new(config, env_config, Box::new(NullRenderer)).context("Failed to set up preview")?;
    if !trainer.load().context("Failed to load checkpoints")? {
        tracing::warn!(
            models_dir = %arg.models_dir.display(),
            "some agents have no checkpoint, their moves are untrained"
        );
    }
    let report = trainer.preview().context("Preview episode failed")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", report.level).context("Failed to write level")?;
    writeln!(
        stdout,
        "walls passable: {}, solver completed: {}, solver score: {}",
        report.walls_passable, report.completed, report.solver_score
    )
    .context("Failed to write preview summary")?;
    Ok(())
}
