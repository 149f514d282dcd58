use levelgen_game::Level;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Comparison used when picking the nearest object of a map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearestMetric {
    /// Smallest `dx + dy`, signs included. Favours objects below and to the left.
    #[default]
    SignedSum,
    /// Smallest `|dx| + |dy|`.
    Manhattan,
}

/// Episode parameter overrides.
///
/// Every `None` field is drawn again on each [`CurriculumEnv::reset`]
/// (see [`EpisodeParams::sample`] for the ranges).
///
/// [`CurriculumEnv::reset`]: crate::CurriculumEnv::reset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvConfig {
    pub map_size: Option<usize>,
    pub wall_density: Option<f32>,
    pub item_count: Option<u32>,
    pub health: Option<i32>,
    pub damage: Option<f32>,
    pub safe_zone: Option<i32>,
    pub nearest_metric: NearestMetric,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("map size {size} is below the minimum of {}", Level::MIN_MAP_SIZE)]
    MapTooSmall { size: usize },
    #[display("wall density must be positive, got {density}")]
    NonPositiveDensity { density: f32 },
    #[display("damage must be positive, got {damage}")]
    NonPositiveDamage { damage: f32 },
    #[display("health must be positive, got {health}")]
    NonPositiveHealth { health: i32 },
    #[display("item count must be at least 1")]
    ZeroItemCount,
    #[display("safe zone must not be negative, got {radius}")]
    NegativeSafeZone { radius: i32 },
}

impl EnvConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.map_size.filter(|size| *size < Level::MIN_MAP_SIZE) {
            return Err(ConfigError::MapTooSmall { size });
        }
        if let Some(density) = self.wall_density.filter(|density| *density <= 0.0) {
            return Err(ConfigError::NonPositiveDensity { density });
        }
        if let Some(damage) = self.damage.filter(|damage| *damage <= 0.0) {
            return Err(ConfigError::NonPositiveDamage { damage });
        }
        if let Some(health) = self.health.filter(|health| *health <= 0) {
            return Err(ConfigError::NonPositiveHealth { health });
        }
        if self.item_count == Some(0) {
            return Err(ConfigError::ZeroItemCount);
        }
        if let Some(radius) = self.safe_zone.filter(|radius| *radius < 0) {
            return Err(ConfigError::NegativeSafeZone { radius });
        }
        Ok(())
    }
}

/// Concrete parameters of one curriculum episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeParams {
    pub map_size: usize,
    /// Target ratio of wall tiles to map area.
    pub wall_density: f32,
    /// Number of items the item stage aims to place.
    pub item_quota: u32,
    pub health: i32,
    /// Expected health lost per enemy.
    pub damage: f32,
    /// Enemies closer than this to the entry or exit are penalized.
    pub safe_zone: i32,
    pub nearest_metric: NearestMetric,
}

impl EpisodeParams {
    /// Fills every unset field of `config` with a random draw.
    ///
    /// | field | range |
    /// |---|---|
    /// | map size | `5..=10` |
    /// | health | `2..=10` |
    /// | wall density | `randint(10, 500) / 1000` |
    /// | damage | `randint(10, 600) / 1000 * health` |
    /// | item quota | `1..=max(1, m² / 8)` |
    /// | safe zone | `0..=m / 3` |
    pub fn sample<R>(config: &EnvConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let map_size = config.map_size.unwrap_or_else(|| rng.random_range(5..=10));
        let health = config.health.unwrap_or_else(|| rng.random_range(2..=10));
        let wall_density = config
            .wall_density
            .unwrap_or_else(|| thousandths(rng.random_range(10..=500)));
        #[expect(clippy::cast_precision_loss)]
        let damage = config
            .damage
            .unwrap_or_else(|| thousandths(rng.random_range(10..=600)) * health as f32);
        let max_items = u32::try_from(map_size * map_size / 8).unwrap_or(u32::MAX).max(1);
        let item_quota = config
            .item_count
            .unwrap_or_else(|| rng.random_range(1..=max_items));
        let max_safe_zone = i32::try_from(map_size / 3).unwrap_or(i32::MAX);
        let safe_zone = config
            .safe_zone
            .unwrap_or_else(|| rng.random_range(0..=max_safe_zone));

        Self {
            map_size,
            wall_density,
            item_quota,
            health,
            damage,
            safe_zone,
            nearest_metric: config.nearest_metric,
        }
    }

    /// Number of enemies a player with `health` can afford to meet before dying.
    #[must_use]
    pub fn enemy_capacity_for(&self, health: i32) -> f32 {
        #[expect(clippy::cast_precision_loss)]
        let health = health as f32;
        (health / self.damage - 1.0).floor()
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn area(&self) -> f32 {
        (self.map_size * self.map_size) as f32
    }
}

#[expect(clippy::cast_precision_loss)]
fn thousandths(value: u32) -> f32 {
    value as f32 / 1000.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_sampled_params_stay_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        let config = EnvConfig::default();
        for _ in 0..500 {
            let params = EpisodeParams::sample(&config, &mut rng);
            let m = params.map_size;
            assert!((5..=10).contains(&m));
            assert!((2..=10).contains(&params.health));
            assert!((0.01..=0.5).contains(&params.wall_density));
            #[expect(clippy::cast_precision_loss)]
            let health = params.health as f32;
            assert!(params.damage >= 0.01 * health - 1e-4);
            assert!(params.damage <= 0.6 * health + 1e-4);
            assert!(params.item_quota >= 1);
            assert!(params.item_quota as usize <= (m * m / 8).max(1));
            assert!((0..=i32::try_from(m / 3).unwrap()).contains(&params.safe_zone));
        }
    }

    #[test]
    fn test_fixed_fields_are_kept() {
        let mut rng = Pcg32::seed_from_u64(4);
        let config = EnvConfig {
            map_size: Some(7),
            wall_density: Some(0.25),
            item_count: Some(3),
            health: Some(6),
            damage: Some(1.5),
            safe_zone: Some(1),
            nearest_metric: NearestMetric::Manhattan,
        };
        let params = EpisodeParams::sample(&config, &mut rng);
        assert_eq!(params.map_size, 7);
        assert!((params.wall_density - 0.25).abs() < f32::EPSILON);
        assert_eq!(params.item_quota, 3);
        assert_eq!(params.health, 6);
        assert!((params.damage - 1.5).abs() < f32::EPSILON);
        assert_eq!(params.safe_zone, 1);
        assert_eq!(params.nearest_metric, NearestMetric::Manhattan);
    }

    #[test]
    fn test_enemy_capacity_floors() {
        let mut rng = Pcg32::seed_from_u64(5);
        let config = EnvConfig {
            health: Some(10),
            damage: Some(3.0),
            ..EnvConfig::default()
        };
        let params = EpisodeParams::sample(&config, &mut rng);
        assert!((params.enemy_capacity_for(params.health) - 2.0).abs() < f32::EPSILON);
        assert!((params.enemy_capacity_for(4) - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let small = EnvConfig {
            map_size: Some(2),
            ..EnvConfig::default()
        };
        assert!(matches!(small.validate(), Err(ConfigError::MapTooSmall { size: 2 })));

        let no_items = EnvConfig {
            item_count: Some(0),
            ..EnvConfig::default()
        };
        assert!(matches!(no_items.validate(), Err(ConfigError::ZeroItemCount)));

        assert!(EnvConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: EnvConfig = serde_json::from_str(r#"{"map_size": 6, "health": 4}"#).unwrap();
        assert_eq!(config.map_size, Some(6));
        assert_eq!(config.health, Some(4));
        assert_eq!(config.damage, None);
    }
}
