use serde::{Serialize, Deserialize};

use crate::network::network::FlatNetwork;

/// Gradient step with momentum over a flat weight vector.
///
/// Gradients follow the error signal (`ideal - actual`), so updates are
/// added to the weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum }
    }

    /// The update for one weight: gradient·lr + last_delta·momentum.
    pub fn delta(&self, gradient: f64, last_delta: f64) -> f64 {
        gradient * self.learning_rate + last_delta * self.momentum
    }

    /// Computes the update for weight `index` and records it as its new last
    /// delta.
    pub fn update_weight(&self, gradients: &[f64], last_delta: &mut [f64], index: usize) -> f64 {
        let delta = self.delta(gradients[index], last_delta[index]);
        last_delta[index] = delta;
        delta
    }

    /// Applies one update to every weight and zeroes the consumed gradients.
    pub fn step(&self, weights: &mut [f64], gradients: &mut [f64], last_delta: &mut [f64]) {
        for i in 0..gradients.len() {
            weights[i] += self.update_weight(gradients, last_delta, i);
            gradients[i] = 0.0;
        }
    }

    /// Like `step`, but connections already weaker than `limit` are cut to
    /// zero and left out of the update.
    pub fn step_limited(&self, weights: &mut [f64], gradients: &mut [f64], last_delta: &mut [f64], limit: f64) {
        for i in 0..gradients.len() {
            if weights[i].abs() < limit {
                weights[i] = 0.0;
            } else {
                weights[i] += self.update_weight(gradients, last_delta, i);
            }
            gradients[i] = 0.0;
        }
    }

    /// Updates the network's weights, pruning when the network is limited.
    pub fn apply(&self, network: &mut FlatNetwork, gradients: &mut [f64], last_delta: &mut [f64]) {
        if network.is_limited() {
            let limit = network.connection_limit();
            self.step_limited(&mut network.weights, gradients, last_delta, limit);
        } else {
            self.step(&mut network.weights, gradients, last_delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_deterministic() {
        let sgd = Sgd::new(0.3, 0.5);
        let gradients = [0.2, -1.0];

        let mut first = [0.1, 0.4];
        let mut second = [0.1, 0.4];
        let a = sgd.update_weight(&gradients, &mut first, 1);
        let b = sgd.update_weight(&gradients, &mut second, 1);

        assert_eq!(a, b);
        assert_eq!(first, second);
        assert_eq!(a, -1.0 * 0.3 + 0.4 * 0.5);
        assert_eq!(first[1], a);
    }

    #[test]
    fn step_applies_momentum_and_clears_gradients() {
        let sgd = Sgd::new(0.5, 0.1);
        let mut weights = [1.0, 1.0];
        let mut gradients = [2.0, 0.0];
        let mut last_delta = [0.0, 10.0];

        sgd.step(&mut weights, &mut gradients, &mut last_delta);

        assert_eq!(weights, [2.0, 2.0]);
        assert_eq!(gradients, [0.0, 0.0]);
        assert_eq!(last_delta, [1.0, 1.0]);
    }

    #[test]
    fn limited_step_keeps_pruned_weights_at_zero() {
        let sgd = Sgd::new(1.0, 0.9);
        let mut weights = [0.01, -0.02, 0.5];
        let mut gradients = [3.0, -3.0, 0.1];
        let mut last_delta = [1.0, 1.0, 0.0];

        sgd.step_limited(&mut weights, &mut gradients, &mut last_delta, 0.05);

        assert_eq!(weights[0], 0.0);
        assert_eq!(weights[1], 0.0);
        assert!((weights[2] - 0.6).abs() < 1e-12);
        // Pruned weights keep their old momentum state untouched.
        assert_eq!(last_delta[..2], [1.0, 1.0]);
        assert_eq!(gradients, [0.0; 3]);
    }
}
