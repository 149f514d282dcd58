use std::path::PathBuf;

use levelgen_env::{EnvConfig, NearestMetric};

use crate::util;

/// Episode parameter overrides shared by every mode.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EnvArgs {
    /// JSON file with episode parameter overrides
    #[arg(long)]
    env_config: Option<PathBuf>,
    /// Fixed map side length
    #[arg(long)]
    map_size: Option<usize>,
    /// Fixed target wall density
    #[arg(long)]
    wall_density: Option<f32>,
    /// Fixed item quota
    #[arg(long)]
    item_count: Option<u32>,
    /// Fixed player health
    #[arg(long)]
    health: Option<i32>,
    /// Fixed expected damage per enemy
    #[arg(long)]
    damage: Option<f32>,
    /// Fixed enemy-free radius around entry and exit
    #[arg(long)]
    safe_zone: Option<i32>,
    /// Pick nearest objects by Manhattan distance instead of signed sum
    #[arg(long)]
    manhattan_nearest: bool,
}

impl EnvArgs {
    /// Loads `--env-config` if given, then applies the per-field flags.
    pub(crate) fn to_env_config(&self) -> anyhow::Result<EnvConfig> {
        let mut config = match &self.env_config {
            Some(path) => util::read_json_file(path)?,
            None => EnvConfig::default(),
        };
        config.map_size = self.map_size.or(config.map_size);
        config.wall_density = self.wall_density.or(config.wall_density);
        config.item_count = self.item_count.or(config.item_count);
        config.health = self.health.or(config.health);
        config.damage = self.damage.or(config.damage);
        config.safe_zone = self.safe_zone.or(config.safe_zone);
        if self.manhattan_nearest {
            config.nearest_metric = NearestMetric::Manhattan;
        }
        Ok(config)
    }
}
