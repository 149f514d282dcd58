//! Game rules and presentation on top of the core data structures.
//!
//! - [`Game`] - A single player run through a [`Level`](crate::Level)
//! - [`GameAction`] - Discrete solver action
//! - [`Renderer`] - Frame sink used while training or previewing levels

pub use self::{game::*, render::*};

mod game;
mod render;
