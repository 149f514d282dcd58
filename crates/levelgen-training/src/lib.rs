//! Curriculum training of the level generation agents.
//!
//! A curriculum episode generates one level and validates it:
//!
//! ```text
//! walls ──▶ wall solver ──▶ enemy ──▶ item ──▶ solver
//!   ▲            │            ▲        ▲         │
//!   └── ±100 ────┘            └────────┴─ ±100 ──┘
//! ```
//!
//! Placement agents learn from shaped per-cell rewards during their sweep.
//! The last transition of each sweep is held back until a solver has played
//! the level, then rewarded with [`COMPLETION_REWARD`] or [`FAILURE_REWARD`]
//! in place. This delayed signal is what teaches the generators to produce
//! completable levels.
//!
//! # Modules
//!
//! - [`agents`] - One [`D3qnAgent`](levelgen_agent::D3qnAgent) per agent stage
//! - [`episode`] - Rollouts of a single stage
//! - [`pretrain`] - Random warm-up sweeps for fresh agents
//! - [`score`] - Rolling score windows
//! - [`trainer`] - [`CurriculumTrainer`], the episode loop

pub use self::{agents::*, config::*, episode::*, score::*, trainer::*};

pub mod agents;
pub mod config;
pub mod episode;
pub mod pretrain;
pub mod score;
pub mod trainer;
