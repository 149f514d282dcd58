use ndarray::{Array, Dimension, Zip};
use serde::{Deserialize, Serialize};

use crate::network::DuelingNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 5e-4,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

/// Adam with bias-corrected moment estimates, one moment pair per network
/// parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adam {
    config: AdamConfig,
    step: i32,
    first_moment: DuelingNetwork,
    second_moment: DuelingNetwork,
}

impl Adam {
    #[must_use]
    pub fn new(config: AdamConfig, network: &DuelingNetwork) -> Self {
        Self {
            config,
            step: 0,
            first_moment: network.zeros_like(),
            second_moment: network.zeros_like(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdamConfig {
        &self.config
    }

    #[must_use]
    pub fn steps(&self) -> i32 {
        self.step
    }

    /// Moves `network` one step against `gradients`.
    pub fn update(&mut self, network: &mut DuelingNetwork, gradients: &DuelingNetwork) {
        self.step = self.step.saturating_add(1);
        let rate = StepRate::new(&self.config, self.step);

        let params = network.layers_mut();
        let grads = gradients.layers();
        let first = self.first_moment.layers_mut();
        let second = self.second_moment.layers_mut();
        for (((param, grad), m), v) in params.into_iter().zip(grads).zip(first).zip(second) {
            rate.apply(&mut param.weight, &grad.weight, &mut m.weight, &mut v.weight);
            rate.apply(&mut param.bias, &grad.bias, &mut m.bias, &mut v.bias);
        }
    }
}

struct StepRate {
    config: AdamConfig,
    correction1: f32,
    correction2: f32,
}

impl StepRate {
    fn new(config: &AdamConfig, step: i32) -> Self {
        Self {
            config: *config,
            correction1: 1.0 - config.beta1.powi(step),
            correction2: 1.0 - config.beta2.powi(step),
        }
    }

    fn apply<D>(
        &self,
        param: &mut Array<f32, D>,
        grad: &Array<f32, D>,
        m: &mut Array<f32, D>,
        v: &mut Array<f32, D>,
    ) where
        D: Dimension,
    {
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        Zip::from(param)
            .and(grad)
            .and(m)
            .and(v)
            .for_each(|p, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / self.correction1;
                let v_hat = *v / self.correction2;
                *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut rng = Pcg32::seed_from_u64(31);
        let mut network = DuelingNetwork::new(2, 3, 2, &mut rng);
        let before = network.clone();
        let mut gradients = network.zeros_like();
        gradients.value.bias[0] = 4.0;
        gradients.layer1.weight[[0, 1]] = -0.5;

        let mut adam = Adam::new(AdamConfig::default(), &network);
        adam.update(&mut network, &gradients);

        // bias-corrected first step is lr * sign(g)
        let lr = AdamConfig::default().learning_rate;
        assert!((before.value.bias[0] - network.value.bias[0] - lr).abs() < 1e-6);
        assert!((network.layer1.weight[[0, 1]] - before.layer1.weight[[0, 1]] - lr).abs() < 1e-6);
        assert_eq!(network.layer2, before.layer2);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut rng = Pcg32::seed_from_u64(32);
        let mut network = DuelingNetwork::new(1, 2, 1, &mut rng);
        let config = AdamConfig {
            learning_rate: 0.05,
            ..AdamConfig::default()
        };
        let mut adam = Adam::new(config, &network);
        // loss = bias², gradient 2 * bias
        for _ in 0..500 {
            let mut gradients = network.zeros_like();
            gradients.value.bias[0] = 2.0 * network.value.bias[0];
            adam.update(&mut network, &gradients);
        }
        assert!(network.value.bias[0].abs() < 0.1);
    }
}
