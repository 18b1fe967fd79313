use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, TrainError};
use crate::layers::descriptor::LayerDescriptor;
use crate::network::network::FlatNetwork;

fn default_bias() -> bool {
    true
}

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`         — number of neurons in this layer
/// - `activation`   — activation applied to the layer's sums (ignored for the
///                    input layer)
/// - `bias`         — whether the layer carries a bias neuron feeding the next
///                    layer
/// - `context_from` — index (input → output order) of a layer whose outputs
///                    are fed back into this layer through context neurons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub activation: ActivationFunction,
    #[serde(default = "default_bias")]
    pub bias: bool,
    #[serde(default)]
    pub context_from: Option<usize>,
}

impl LayerSpec {
    pub fn new(size: usize, activation: ActivationFunction) -> LayerSpec {
        LayerSpec { size, activation, bias: true, context_from: None }
    }

    pub fn without_bias(mut self) -> LayerSpec {
        self.bias = false;
        self
    }

    pub fn with_context_from(mut self, layer: usize) -> LayerSpec {
        self.context_from = Some(layer);
        self
    }
}

/// A serializable description of a network topology, listed input → output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    pub layers: Vec<LayerSpec>,
    /// Weights whose magnitude falls below this are pruned during training;
    /// `0.0` disables pruning.
    #[serde(default)]
    pub connection_limit: f64,
}

impl NetworkSpec {
    pub fn new(name: &str, layers: Vec<LayerSpec>) -> NetworkSpec {
        NetworkSpec { name: name.to_string(), layers, connection_limit: 0.0 }
    }

    pub fn with_connection_limit(mut self, limit: f64) -> NetworkSpec {
        self.connection_limit = limit;
        self
    }

    /// Lays the specification out as a flat network with zeroed weights.
    pub fn build(&self) -> Result<FlatNetwork> {
        let n = self.layers.len();
        if n < 2 {
            return Err(TrainError::config(format!(
                "network '{}' needs at least two layers, got {n}",
                self.name
            )));
        }

        let mut descriptors = Vec::with_capacity(n);
        for (k, spec) in self.layers.iter().enumerate().rev() {
            if spec.size == 0 {
                return Err(TrainError::config(format!("layer {k} of '{}' is empty", self.name)));
            }

            let context_count = match spec.context_from {
                None => 0,
                Some(_) if k == n - 1 => {
                    return Err(TrainError::config("the output layer cannot hold context neurons"));
                }
                Some(src) if src == 0 || src >= n => {
                    return Err(TrainError::config(format!(
                        "layer {k} takes context from layer {src}, which is not a computed layer"
                    )));
                }
                Some(src) => self.layers[src].size,
            };

            let bias_activation = spec.bias.then_some(1.0);
            descriptors.push(LayerDescriptor {
                feed_count: spec.size,
                total_count: spec.size + usize::from(spec.bias) + context_count,
                output_offset: 0,
                weight_offset: 0,
                activation: spec.activation,
                bias_activation,
                context_count,
                context_source: spec.context_from.map(|src| n - 1 - src),
            });
        }

        FlatNetwork::from_layers(descriptors, self.connection_limit)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_lays_out_output_first() {
        let net = NetworkSpec::new("2-5-3", vec![
            LayerSpec::new(2, ActivationFunction::Identity),
            LayerSpec::new(5, ActivationFunction::Sigmoid),
            LayerSpec::new(3, ActivationFunction::Identity),
        ])
        .build()
        .unwrap();

        assert_eq!(net.output_count(), 3);
        assert_eq!(net.input_count(), 2);
        // (5 + bias) * 3 + (2 + bias) * 5
        assert_eq!(net.weight_count(), 18 + 15);

        let layers = net.layers();
        assert_eq!(layers[0].output_offset, 0);
        assert_eq!(layers[1].output_offset, 4);
        assert_eq!(layers[1].weight_offset, 18);
        assert_eq!(layers[2].weight_offset, 33);
    }

    #[test]
    fn output_layer_context_is_rejected() {
        let spec = NetworkSpec::new("bad", vec![
            LayerSpec::new(2, ActivationFunction::Identity),
            LayerSpec::new(1, ActivationFunction::Identity).with_context_from(1),
        ]);
        assert!(spec.build().is_err());
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let json = r#"{
            "name": "tiny",
            "layers": [
                { "size": 1, "activation": "Identity" },
                { "size": 1, "activation": "Sigmoid", "bias": false }
            ]
        }"#;
        let spec: NetworkSpec = serde_json::from_str(json).unwrap();
        assert!(spec.layers[0].bias);
        assert!(!spec.layers[1].bias);
        assert_eq!(spec.connection_limit, 0.0);
        assert_eq!(spec.build().unwrap().weight_count(), 2);
    }
}
