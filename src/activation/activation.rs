use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};

/// Constant added to the sigmoid derivative when flat-spot fixing is enabled.
pub const SIGMOID_FLAT_SPOT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    /// Softmax is vector-valued; `activate()` normalises the whole slice and
    /// `function()` is never consulted for it.
    Softmax,
    Tanh,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    /// Element-wise activation of a pre-activation sum.
    ///
    /// # Panics
    /// Panics for `Softmax`, which only exists at slice level.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Softmax => {
                panic!("ActivationFunction::Softmax::function() must not be called directly; \
                        use ActivationFunction::activate() on the whole layer slice.")
            }
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + E.powf(-x)),
        }
    }

    /// Activates one layer in place. `values` holds the pre-activation sums on
    /// entry and the layer outputs on return.
    pub fn activate(&self, values: &mut [f64]) {
        if let ActivationFunction::Softmax = self {
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mut total = 0.0;
            for v in values.iter_mut() {
                *v = (*v - max).exp();
                total += *v;
            }
            if total > 0.0 {
                values.iter_mut().for_each(|v| *v /= total);
            }
            return;
        }

        for v in values.iter_mut() {
            *v = self.function(*v);
        }
    }

    /// Derivative of the activation for a neuron, given both its
    /// pre-activation `sum` and its activated `output`.
    ///
    /// Functions whose derivative is cheaper in terms of the output (sigmoid,
    /// tanh) use `output`; the rest use `sum`. `Softmax` returns `1.0`: the
    /// error signal handed to a softmax layer is already taken w.r.t. its
    /// inputs.
    pub fn derivative(&self, sum: f64, output: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => output * (1.0 - output),
            ActivationFunction::ReLU => if sum > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Softmax => 1.0,
            ActivationFunction::Tanh => 1.0 - output * output,
            ActivationFunction::LeakyReLU { alpha } => if sum > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Elu { alpha } => {
                if sum > 0.0 { 1.0 } else { alpha * E.powf(sum) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                let inner = c * (sum + 0.044715 * sum.powi(3));
                let tanh_inner = inner.tanh();
                let sech2 = 1.0 - tanh_inner * tanh_inner;
                let d_inner = c * (1.0 + 3.0 * 0.044715 * sum.powi(2));
                0.5 * tanh_inner + 0.5 * sum * sech2 * d_inner + 0.5
            }
            ActivationFunction::Swish => {
                let sig = 1.0 / (1.0 + E.powf(-sum));
                sig + sum * sig * (1.0 - sig)
            }
        }
    }

    /// Flat-spot constant for this activation: only the sigmoid saturates to a
    /// zero derivative at both ends.
    pub fn flat_spot(&self) -> f64 {
        match self {
            ActivationFunction::Sigmoid => SIGMOID_FLAT_SPOT,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_derivative_uses_output() {
        let act = ActivationFunction::Sigmoid;
        let out = act.function(0.3);
        let expected = out * (1.0 - out);
        assert!((act.derivative(0.3, out) - expected).abs() < 1e-12);
    }

    #[test]
    fn softmax_activation_sums_to_one() {
        let mut values = vec![1.0, 2.0, 3.0];
        ActivationFunction::Softmax.activate(&mut values);
        let total: f64 = values.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(values[2] > values[1] && values[1] > values[0]);
    }

    #[test]
    fn only_sigmoid_has_flat_spot() {
        assert_eq!(ActivationFunction::Sigmoid.flat_spot(), SIGMOID_FLAT_SPOT);
        assert_eq!(ActivationFunction::Tanh.flat_spot(), 0.0);
        assert_eq!(ActivationFunction::Identity.flat_spot(), 0.0);
    }
}
