//! Observation encoders.
//!
//! Each stage observes a fixed-width `f32` vector built from the primitives
//! below. Windows are read around the cursor and cells outside of the map
//! resolve to a sentinel, so the cursor may stand anywhere (including one
//! row past the map after a finished sweep).
//!
//! Windows are flattened `x` first, then `y`, the same order in which
//! [`GridMap::iter_set`] visits cells.

use levelgen_game::{Game, GridMap, Level, Pos};

use crate::config::{EpisodeParams, NearestMetric};

pub type Observation = Vec<f32>;

/// Everything an encoder or reward function may read.
#[derive(Debug, Clone, Copy)]
pub struct StageView<'a> {
    pub game: &'a Game,
    pub params: &'a EpisodeParams,
    pub cursor: Pos,
    pub steps: usize,
}

impl StageView<'_> {
    #[must_use]
    pub fn level(&self) -> &Level {
        self.game.level()
    }

    #[must_use]
    pub fn health(&self) -> i32 {
        self.game.player().health()
    }
}

/// Pushes the `(2r + 1)²` cells around `center`, reading `cell` inside the
/// map and `sentinel` outside of it.
pub fn push_window<F>(out: &mut Observation, level: &Level, center: Pos, radius: i32, sentinel: f32, cell: F)
where
    F: Fn(Pos) -> f32,
{
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            let pos = center + Pos::new(dx, dy);
            out.push(if level.contains(pos) { cell(pos) } else { sentinel });
        }
    }
}

fn flag(set: bool) -> f32 {
    if set { 1.0 } else { 0.0 }
}

#[expect(clippy::cast_precision_loss)]
fn scalar(value: i32) -> f32 {
    value as f32
}

#[must_use]
pub fn entry_distance(level: &Level, cursor: Pos) -> i32 {
    level.entry().manhattan_distance(cursor)
}

#[must_use]
pub fn exit_distance(level: &Level, cursor: Pos) -> i32 {
    level.exit().manhattan_distance(cursor)
}

/// Per-axis sign of the vector from `cursor` to the exit.
///
/// A small epsilon keeps zero deltas from dividing by zero; they round to 0.
#[must_use]
pub fn exit_direction(level: &Level, cursor: Pos) -> [f32; 2] {
    let delta = level.exit() - cursor;
    let sign = |d: i32| {
        let d = scalar(d);
        (d / (d.abs() + 0.01)).round_ties_even()
    };
    [sign(delta.x), sign(delta.y)]
}

/// Delta from `cursor` to the nearest set cell of `map`, or `(0, 0)` for an
/// empty map.
///
/// Candidates are visited in [`GridMap::iter_set`] order and only a strictly
/// smaller key replaces the current best, so the first minimum wins.
#[must_use]
pub fn nearest_delta(map: &GridMap, cursor: Pos, metric: NearestMetric) -> Pos {
    let key = |delta: Pos| match metric {
        NearestMetric::SignedSum => delta.signed_sum(),
        NearestMetric::Manhattan => delta.manhattan_len(),
    };
    let mut best: Option<Pos> = None;
    for pos in map.iter_set() {
        let delta = pos - cursor;
        if best.is_none_or(|b| key(delta) < key(b)) {
            best = Some(delta);
        }
    }
    best.unwrap_or(Pos::ORIGIN)
}

/// Number of set cells on `cursor` and its four neighbours.
#[must_use]
pub fn near_count(map: &GridMap, cursor: Pos) -> usize {
    cursor
        .with_neighbors()
        .into_iter()
        .filter(|pos| map.is_set(*pos))
        .count()
}

/// 5×5 wall window (exit marked -1, outside 0) and the target wall density.
/// 26 values.
///
/// The entry reads its wall flag like any other tile.
#[must_use]
pub fn encode_walls(view: &StageView<'_>) -> Observation {
    let level = view.level();
    let mut obs = Vec::with_capacity(26);
    push_window(&mut obs, level, view.cursor, 2, 0.0, |pos| {
        if pos == level.exit() {
            -1.0
        } else {
            flag(level.wall_map().is_set(pos))
        }
    });
    obs.push(view.params.wall_density);
    obs
}

/// 14 values:
///
/// - 3×3 wall window
/// - signed sum of the delta to the nearest route tile
/// - distances to entry and exit
/// - enemy capacity per map tile
/// - health
#[must_use]
pub fn encode_enemy(view: &StageView<'_>) -> Observation {
    let level = view.level();
    let mut obs = Vec::with_capacity(14);
    push_window(&mut obs, level, view.cursor, 1, 0.0, |pos| {
        flag(level.wall_map().is_set(pos))
    });
    let route = nearest_delta(level.route(), view.cursor, view.params.nearest_metric);
    obs.push(scalar(route.signed_sum()));
    obs.push(scalar(entry_distance(level, view.cursor)));
    obs.push(scalar(exit_distance(level, view.cursor)));
    obs.push(view.params.enemy_capacity_for(view.health()) / view.params.area());
    obs.push(scalar(view.health()));
    obs
}

/// 3×3 wall and enemy windows, nearest route tile, health and the item
/// quota per map tile. 21 values.
#[must_use]
pub fn encode_item(view: &StageView<'_>) -> Observation {
    let level = view.level();
    let mut obs = Vec::with_capacity(21);
    push_window(&mut obs, level, view.cursor, 1, 0.0, |pos| {
        flag(level.wall_map().is_set(pos))
    });
    push_window(&mut obs, level, view.cursor, 1, 0.0, |pos| {
        flag(level.enemy_map().is_set(pos))
    });
    let route = nearest_delta(level.route(), view.cursor, view.params.nearest_metric);
    obs.push(scalar(route.signed_sum()));
    obs.push(scalar(view.health()));
    #[expect(clippy::cast_precision_loss)]
    let quota = view.params.item_quota as f32;
    obs.push(quota / view.params.area());
    obs
}

/// Value of one tile as the solver sees it: -1 for walls, 3 for the exit,
/// otherwise the number of enemies and items lying on it.
fn solver_tile(level: &Level, pos: Pos) -> f32 {
    if pos == level.exit() {
        return 3.0;
    }
    if level.wall_map().is_set(pos) {
        return -1.0;
    }
    [level.enemy_map(), level.heal_map(), level.power_map()]
        .into_iter()
        .map(|map| flag(map.is_set(pos)))
        .sum()
}

/// 33 values:
///
/// - 5×5 tile window, -1 outside of the map
/// - enemies on and next to the player
/// - deltas to the nearest healing and power items
/// - exit direction
/// - health
#[must_use]
pub fn encode_solver(view: &StageView<'_>) -> Observation {
    let level = view.level();
    let metric = view.params.nearest_metric;
    let mut obs = Vec::with_capacity(33);
    push_window(&mut obs, level, view.cursor, 2, -1.0, |pos| solver_tile(level, pos));
    #[expect(clippy::cast_precision_loss)]
    let near = near_count(level.enemy_map(), view.cursor) as f32;
    obs.push(near);
    for map in [level.heal_map(), level.power_map()] {
        let delta = nearest_delta(map, view.cursor, metric);
        obs.extend([scalar(delta.x), scalar(delta.y)]);
    }
    obs.extend(exit_direction(level, view.cursor));
    obs.push(scalar(view.health()));
    obs
}
