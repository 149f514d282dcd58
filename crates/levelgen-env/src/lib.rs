//! Curriculum environment for learned level generation.
//!
//! A [`CurriculumEnv`] runs one level through five [`Stage`]s: walls are
//! placed, a solver checks the walled level, enemies and items are placed,
//! and a solver plays the final level. Each stage is a separate decision
//! process with its own observation width and action count
//! ([`Stage::space`]), driven through a [`StageRules`] object.

pub use self::{config::*, env::*, observation::Observation, rules::*, stage::*};

pub mod config;
pub mod env;
pub mod observation;
pub mod reward;
pub mod rules;
pub mod stage;
