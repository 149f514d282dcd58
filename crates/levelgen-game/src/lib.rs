//! Grid dungeon model shared by the level generator and the solver.
//!
//! - [`core`] - Positions, boolean grid maps, entities and [`Level`]
//! - [`engine`] - Turn-based [`Game`] rules and frame rendering

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LevelError {
    #[display("map size {map_size} is below the minimum of {}", Level::MIN_MAP_SIZE)]
    MapTooSmall { map_size: usize },
    #[display("entry and exit both at ({}, {})", pos.x, pos.y)]
    CoincidentEndpoints { pos: Pos },
    #[display("({}, {}) lies outside of the {map_size}x{map_size} map", pos.x, pos.y)]
    OutOfBounds { pos: Pos, map_size: usize },
}
