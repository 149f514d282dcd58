//! Placement rewards.
//!
//! Every function runs right after the placement it scores, with the cursor
//! still on the placed tile. Solver stages return the game's own reward
//! unchanged.

use levelgen_game::{ItemKind, Level, Pos};

use crate::{
    config::EpisodeParams,
    observation::{entry_distance, exit_distance},
};

pub const PLACEMENT_REWARD: f32 = 1.0;
pub const ENDPOINT_WALL_PENALTY: f32 = -20.0;
pub const UNSAFE_ENEMY_PENALTY: f32 = -10.0;
pub const ENEMY_ON_WALL_PENALTY: f32 = -5.0;
pub const OVER_CAPACITY_PENALTY: f32 = -1.0;
pub const BLOCKED_ITEM_PENALTY: f32 = -10.0;
pub const ITEM_CHOICE_BONUS: f32 = 1.0;

/// Stepped shaping around a quota: `+3` on an empty map, `0` around three
/// quarters of the quota, negative beyond.
///
/// Ties round to even.
#[must_use]
pub fn density_penalty(relative_density: f32) -> f32 {
    -(relative_density * 4.0 - 3.0).round_ties_even()
}

#[expect(clippy::cast_precision_loss)]
fn count(n: usize) -> f32 {
    n as f32
}

/// Reward for a wall just placed at `cursor`.
#[must_use]
pub fn wall_placement(level: &Level, cursor: Pos, params: &EpisodeParams) -> f32 {
    let mut reward = PLACEMENT_REWARD;
    if level.is_endpoint(cursor) {
        reward += ENDPOINT_WALL_PENALTY;
    }
    let relative_density = count(level.wall_map().count()) / params.area() / params.wall_density;
    reward + density_penalty(relative_density)
}

/// Reward for an enemy just placed at `cursor` while the player has `health`.
#[must_use]
pub fn enemy_placement(level: &Level, cursor: Pos, params: &EpisodeParams, health: i32) -> f32 {
    let mut reward = PLACEMENT_REWARD;
    let near_entry = entry_distance(level, cursor) < params.safe_zone;
    let near_exit = exit_distance(level, cursor) < params.safe_zone;
    if near_entry || near_exit {
        reward += UNSAFE_ENEMY_PENALTY;
    }
    if level.wall_map().is_set(cursor) {
        reward += ENEMY_ON_WALL_PENALTY;
    }
    if count(level.enemy_map().count()) > params.enemy_capacity_for(health) {
        reward += OVER_CAPACITY_PENALTY;
    }
    reward
}

/// Reward for an item of `kind` just placed at `cursor`.
///
/// `prior_items` is the item count before the placement. Healing is the
/// right choice when the health left after meeting every enemy drops below
/// one enemy's damage; power otherwise.
#[must_use]
pub fn item_placement(
    level: &Level,
    cursor: Pos,
    params: &EpisodeParams,
    health: i32,
    kind: ItemKind,
    prior_items: usize,
) -> f32 {
    #[expect(clippy::cast_precision_loss)]
    let quota = params.item_quota as f32;
    let mut reward = PLACEMENT_REWARD + density_penalty(count(prior_items) / quota);

    #[expect(clippy::cast_precision_loss)]
    let remaining = health as f32 - params.damage * count(level.enemies().len());
    let needs_healing = remaining < params.damage;
    if needs_healing == kind.is_healing() {
        reward += ITEM_CHOICE_BONUS;
    }

    let blocked = level.is_endpoint(cursor)
        || level.wall_map().is_set(cursor)
        || level.enemy_map().is_set(cursor);
    if blocked {
        reward += BLOCKED_ITEM_PENALTY;
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NearestMetric;

    fn params() -> EpisodeParams {
        EpisodeParams {
            map_size: 5,
            wall_density: 0.2,
            item_quota: 4,
            health: 6,
            damage: 2.0,
            safe_zone: 2,
            nearest_metric: NearestMetric::SignedSum,
        }
    }

    fn level() -> Level {
        Level::new(5, Pos::new(0, 0), Pos::new(4, 4)).unwrap()
    }

    #[test]
    fn test_density_penalty_rounds_half_to_even() {
        assert!((density_penalty(0.0) - 3.0).abs() < f32::EPSILON);
        // 0.625 * 4 - 3 = -0.5 rounds to -0
        assert!(density_penalty(0.625).abs() < f32::EPSILON);
        // 0.875 * 4 - 3 = 0.5 rounds to 0
        assert!(density_penalty(0.875).abs() < f32::EPSILON);
        assert!((density_penalty(1.0) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_first_wall_rewarded() {
        let mut level = level();
        let cursor = Pos::new(2, 2);
        level.add_wall_at(cursor);
        // 1 wall on 25 tiles at density 0.2: relative 0.2, penalty -round(-2.2) = 2
        let reward = wall_placement(&level, cursor, &params());
        assert!((reward - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_wall_on_endpoint_penalized() {
        let mut level = level();
        let cursor = level.exit();
        level.add_wall_at(cursor);
        let reward = wall_placement(&level, cursor, &params());
        assert!((reward - (3.0 + ENDPOINT_WALL_PENALTY)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_enemy_penalties_accumulate() {
        let mut level = level();
        let cursor = Pos::new(1, 0);
        level.add_wall_at(cursor);
        level.add_enemy_at(Pos::new(3, 3));
        level.add_enemy_at(Pos::new(2, 3));
        level.add_enemy_at(cursor);
        // capacity floor(6 / 2 - 1) = 2 < 3 enemies, one step from the entry, on a wall
        let reward = enemy_placement(&level, cursor, &params(), 6);
        let expected =
            PLACEMENT_REWARD + UNSAFE_ENEMY_PENALTY + ENEMY_ON_WALL_PENALTY + OVER_CAPACITY_PENALTY;
        assert!((reward - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn test_enemy_in_open_field() {
        let mut level = level();
        let cursor = Pos::new(2, 2);
        level.add_enemy_at(cursor);
        let reward = enemy_placement(&level, cursor, &params(), 6);
        assert!((reward - PLACEMENT_REWARD).abs() < f32::EPSILON);
    }

    #[test]
    fn test_item_choice_follows_projected_health() {
        let mut level = level();
        level.add_enemy_at(Pos::new(3, 1));
        level.add_enemy_at(Pos::new(1, 3));
        let cursor = Pos::new(2, 2);
        // 6 - 2 * 2 = 2 is not below 2: power is the right choice
        level.add_power_item_at(cursor);
        let power = item_placement(&level, cursor, &params(), 6, ItemKind::Power, 0);
        assert!((power - (PLACEMENT_REWARD + 3.0 + ITEM_CHOICE_BONUS)).abs() < f32::EPSILON);

        let heal = item_placement(&level, cursor, &params(), 6, ItemKind::Healing, 0);
        assert!((heal - (PLACEMENT_REWARD + 3.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_item_on_enemy_penalized() {
        let mut level = level();
        let cursor = Pos::new(2, 2);
        level.add_enemy_at(cursor);
        level.add_healing_item_at(cursor);
        // 3 - 2 < 2 so healing is right; 2 of 4 items already placed
        let reward = item_placement(&level, cursor, &params(), 3, ItemKind::Healing, 2);
        let expected = PLACEMENT_REWARD + 1.0 + ITEM_CHOICE_BONUS + BLOCKED_ITEM_PENALTY;
        assert!((reward - expected).abs() < f32::EPSILON);
    }
}
