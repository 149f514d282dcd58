//! Dueling Q-network.
//!
//! ```text
//! input ─ linear ─ relu ─ linear ─ sigmoid ─┬─ linear ─ A (actions)
//!                                           └─ linear ─ V (1)
//! Q(s, a) = V(s) + A(s, a) - max_a' A(s, a')
//! ```
//!
//! Centering the advantages on their maximum pins down `V` and `A`
//! uniquely, and the greedy action always has `Q = V`.

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip, aview1};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fully connected layer computing `x · Wᵀ + b` on row batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    /// `outputs × inputs`
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Linear {
    /// Uniform initialization in `±1/√inputs`.
    pub fn new<R>(inputs: usize, outputs: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        #[expect(clippy::cast_precision_loss)]
        let bound = 1.0 / (inputs.max(1) as f32).sqrt();
        Self {
            weight: Array2::from_shape_simple_fn((outputs, inputs), || rng.random_range(-bound..=bound)),
            bias: Array1::from_shape_simple_fn(outputs, || rng.random_range(-bound..=bound)),
        }
    }

    #[must_use]
    pub fn zeros_like(&self) -> Self {
        Self {
            weight: Array2::zeros(self.weight.raw_dim()),
            bias: Array1::zeros(self.bias.raw_dim()),
        }
    }

    #[must_use]
    pub fn inputs(&self) -> usize {
        self.weight.ncols()
    }

    #[must_use]
    pub fn outputs(&self) -> usize {
        self.weight.nrows()
    }

    fn forward(&self, x: &ArrayView2<'_, f32>) -> Array2<f32> {
        x.dot(&self.weight.t()) + &self.bias
    }

    /// Parameter gradients for upstream gradient `delta` and layer input `x`.
    fn gradients(x: &ArrayView2<'_, f32>, delta: &Array2<f32>) -> Self {
        Self {
            weight: delta.t().dot(x),
            bias: delta.sum_axis(Axis(0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelingNetwork {
    pub layer1: Linear,
    pub layer2: Linear,
    pub advantage: Linear,
    pub value: Linear,
}

/// Intermediate activations kept for the backward pass.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    input: Array2<f32>,
    pre_relu: Array2<f32>,
    hidden1: Array2<f32>,
    hidden2: Array2<f32>,
    advantage: Array2<f32>,
    pub q: Array2<f32>,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Index of the first maximum of `values`.
#[must_use]
pub fn argmax<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &value) in values.into_iter().enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

impl DuelingNetwork {
    pub fn new<R>(inputs: usize, hidden: usize, actions: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            layer1: Linear::new(inputs, hidden, rng),
            layer2: Linear::new(hidden, hidden, rng),
            advantage: Linear::new(hidden, actions, rng),
            value: Linear::new(hidden, 1, rng),
        }
    }

    #[must_use]
    pub fn zeros_like(&self) -> Self {
        Self {
            layer1: self.layer1.zeros_like(),
            layer2: self.layer2.zeros_like(),
            advantage: self.advantage.zeros_like(),
            value: self.value.zeros_like(),
        }
    }

    #[must_use]
    pub fn inputs(&self) -> usize {
        self.layer1.inputs()
    }

    #[must_use]
    pub fn actions(&self) -> usize {
        self.advantage.outputs()
    }

    #[must_use]
    pub fn layers(&self) -> [&Linear; 4] {
        [&self.layer1, &self.layer2, &self.advantage, &self.value]
    }

    pub fn layers_mut(&mut self) -> [&mut Linear; 4] {
        [
            &mut self.layer1,
            &mut self.layer2,
            &mut self.advantage,
            &mut self.value,
        ]
    }

    /// Recombines a value column and an advantage matrix into Q-values.
    #[must_use]
    pub fn combine(value: &Array2<f32>, advantage: &Array2<f32>) -> Array2<f32> {
        let mut q = advantage.clone();
        for (mut row, v) in q.rows_mut().into_iter().zip(value.column(0)) {
            let max = row.fold(f32::NEG_INFINITY, |acc, &a| acc.max(a));
            row.mapv_inplace(|a| v + a - max);
        }
        q
    }

    pub fn forward_pass(&self, states: ArrayView2<'_, f32>) -> ForwardPass {
        let pre_relu = self.layer1.forward(&states);
        let hidden1 = pre_relu.mapv(|x| x.max(0.0));
        let hidden2 = self.layer2.forward(&hidden1.view()).mapv(sigmoid);
        let advantage = self.advantage.forward(&hidden2.view());
        let value = self.value.forward(&hidden2.view());
        let q = Self::combine(&value, &advantage);
        ForwardPass {
            input: states.to_owned(),
            pre_relu,
            hidden1,
            hidden2,
            advantage,
            q,
        }
    }

    /// Q-values of a batch, one row per state.
    #[must_use]
    pub fn forward(&self, states: ArrayView2<'_, f32>) -> Array2<f32> {
        self.forward_pass(states).q
    }

    /// Q-values of a single state.
    #[must_use]
    pub fn q_values(&self, state: &[f32]) -> Array1<f32> {
        let input = aview1(state).insert_axis(Axis(0));
        self.forward(input).row(0).to_owned()
    }

    /// Parameter gradients for the loss gradient `d_q` with respect to the
    /// Q-values of `pass`.
    #[must_use]
    pub fn backward(&self, pass: &ForwardPass, d_q: &Array2<f32>) -> Self {
        // Q = V + A - A[argmax]: dV sums the row, the argmax advantage
        // absorbs the negated row sum.
        let row_sums = d_q.sum_axis(Axis(1));
        let d_value = row_sums.clone().insert_axis(Axis(1));
        let mut d_advantage = d_q.clone();
        for ((mut row, adv), sum) in d_advantage
            .rows_mut()
            .into_iter()
            .zip(pass.advantage.rows())
            .zip(&row_sums)
        {
            row[argmax(adv)] -= sum;
        }

        let hidden2 = pass.hidden2.view();
        let value = Linear::gradients(&hidden2, &d_value);
        let advantage = Linear::gradients(&hidden2, &d_advantage);

        let d_hidden2 = d_advantage.dot(&self.advantage.weight) + d_value.dot(&self.value.weight);
        let mut d_pre2 = d_hidden2;
        Zip::from(&mut d_pre2)
            .and(&pass.hidden2)
            .for_each(|d, &h| *d *= h * (1.0 - h));
        let layer2 = Linear::gradients(&pass.hidden1.view(), &d_pre2);

        let mut d_pre1 = d_pre2.dot(&self.layer2.weight);
        Zip::from(&mut d_pre1)
            .and(&pass.pre_relu)
            .for_each(|d, &z| {
                if z <= 0.0 {
                    *d = 0.0;
                }
            });
        let layer1 = Linear::gradients(&pass.input.view(), &d_pre1);

        Self {
            layer1,
            layer2,
            advantage,
            value,
        }
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }
}
