use std::{collections::VecDeque, path::Path};

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::persist::{self, PersistError};

/// One `(state, action, reward, next_state, done)` sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub done: bool,
}

/// Stable reference to a pushed transition.
///
/// Handles count pushes, so they stay valid while older entries are evicted
/// and resolve to nothing once their own entry is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionHandle(u64);

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SampleError {
    #[display("cannot sample {requested} transitions from a buffer holding {available}")]
    BatchTooLarge { requested: usize, available: usize },
}

/// Columnar view of sampled transitions; row `i` of every field belongs to
/// the same transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    pub dones: Vec<bool>,
}

impl Batch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn from_rows(rows: &[&Transition]) -> Self {
        let width = rows.first().map_or(0, |t| t.state.len());
        let next_width = rows.first().map_or(0, |t| t.next_state.len());
        Self {
            states: Array2::from_shape_fn((rows.len(), width), |(i, j)| rows[i].state[j]),
            actions: rows.iter().map(|t| t.action).collect(),
            rewards: rows.iter().map(|t| t.reward).collect(),
            next_states: Array2::from_shape_fn((rows.len(), next_width), |(i, j)| {
                rows[i].next_state[j]
            }),
            dones: rows.iter().map(|t| t.done).collect(),
        }
    }
}

/// Fixed-capacity FIFO store of transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayBuffer {
    capacity: usize,
    transitions: VecDeque<Transition>,
    #[serde(skip)]
    first_seq: u64,
}

impl ReplayBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity),
            first_seq: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Appends `transition`, evicting the oldest entry when full.
    pub fn push(&mut self, transition: Transition) -> TransitionHandle {
        if self.capacity == 0 {
            return TransitionHandle(self.first_seq);
        }
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
            self.first_seq += 1;
        }
        self.transitions.push_back(transition);
        TransitionHandle(self.first_seq + self.transitions.len() as u64 - 1)
    }

    fn index_of(&self, handle: TransitionHandle) -> Option<usize> {
        let offset = handle.0.checked_sub(self.first_seq)?;
        let index = usize::try_from(offset).ok()?;
        (index < self.transitions.len()).then_some(index)
    }

    #[must_use]
    pub fn get(&self, handle: TransitionHandle) -> Option<&Transition> {
        self.transitions.get(self.index_of(handle)?)
    }

    /// Overwrites the reward of a stored transition in place.
    ///
    /// Returns `false` when the transition was already evicted.
    pub fn set_reward(&mut self, handle: TransitionHandle, reward: f32) -> bool {
        let Some(index) = self.index_of(handle) else {
            return false;
        };
        self.transitions[index].reward = reward;
        true
    }

    /// Transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter()
    }

    /// Draws `batch_size` distinct transitions uniformly at random.
    pub fn sample<R>(&self, batch_size: usize, rng: &mut R) -> Result<Batch, SampleError>
    where
        R: Rng + ?Sized,
    {
        let available = self.transitions.len();
        if batch_size > available {
            return Err(SampleError::BatchTooLarge {
                requested: batch_size,
                available,
            });
        }
        let rows: Vec<&Transition> = rand::seq::index::sample(rng, available, batch_size)
            .into_iter()
            .map(|i| &self.transitions[i])
            .collect();
        Ok(Batch::from_rows(&rows))
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        persist::write_json(path, self)
    }

    /// Restores a buffer written by [`ReplayBuffer::save`], keeping its
    /// insertion order. Handles issued before saving do not carry over.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let mut buffer: Self = persist::read_json(path)?;
        while buffer.transitions.len() > buffer.capacity {
            buffer.transitions.pop_front();
        }
        Ok(buffer)
    }
}
