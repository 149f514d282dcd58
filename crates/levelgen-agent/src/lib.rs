//! Dueling double Q-learning for the curriculum stages.
//!
//! - [`network`] - Dueling Q-network with manual backpropagation
//! - [`optimizer`] - Adam over network parameters
//! - [`replay_buffer`] - FIFO experience replay with reward rewrites
//! - [`agent`] - [`D3qnAgent`] tying the pieces together
//! - [`persist`] - JSON checkpoints of agents and buffers

pub use self::{agent::*, network::*, optimizer::*, persist::*, replay_buffer::*};

pub mod agent;
pub mod network;
pub mod optimizer;
pub mod persist;
pub mod replay_buffer;
