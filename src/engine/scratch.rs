use crate::network::network::{reset_context, FlatNetwork};

/// Per-worker mutable state for forward and backward passes.
///
/// Sized from the network's layer layout so that workers never touch the
/// canonical network's buffers; the weights themselves stay shared.
#[derive(Debug, Clone)]
pub struct Scratch {
    pub layer_output: Vec<f64>,
    pub layer_sums: Vec<f64>,
    pub layer_delta: Vec<f64>,
}

impl Scratch {
    /// Starts from the network's current outputs so bias and context slots
    /// carry over.
    pub fn for_network(network: &FlatNetwork) -> Scratch {
        let len = network.layer_output().len();
        Scratch {
            layer_output: network.layer_output().to_vec(),
            layer_sums: vec![0.0; len],
            layer_delta: vec![0.0; len],
        }
    }

    pub fn clear_context(&mut self, network: &FlatNetwork) {
        reset_context(network.layers(), &mut self.layer_output);
    }
}
