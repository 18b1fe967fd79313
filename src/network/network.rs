use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::layers::descriptor::LayerDescriptor;

/// A feed-forward network whose weights and layer state live in flat arrays.
///
/// Weights for the connections from layer `i + 1` into layer `i` start at
/// `layers[i].weight_offset` and are stored destination-major: the weight from
/// source neuron `y` to destination neuron `x` sits at
/// `weight_offset + x * layers[i + 1].total_count + y`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredNetwork")]
pub struct FlatNetwork {
    layers: Vec<LayerDescriptor>,
    pub weights: Vec<f64>,
    layer_output: Vec<f64>,
    layer_sums: Vec<f64>,
    connection_limit: f64,
}

impl FlatNetwork {
    /// Assembles a network from output-first layer descriptors. Buffer and
    /// weight offsets are recomputed from the neuron counts. Weights start at
    /// zero; see `randomize()`.
    pub fn from_layers(layers: Vec<LayerDescriptor>, connection_limit: f64) -> Result<FlatNetwork> {
        if layers.len() < 2 {
            return Err(TrainError::config("a network needs at least an input and an output layer"));
        }
        if !connection_limit.is_finite() || connection_limit < 0.0 {
            return Err(TrainError::config(format!(
                "connection limit must be a non-negative number, got {connection_limit}"
            )));
        }

        for (i, layer) in layers.iter().enumerate() {
            let bias = usize::from(layer.bias_activation.is_some());
            if layer.feed_count == 0 || layer.total_count != layer.feed_count + bias + layer.context_count {
                return Err(TrainError::config(format!("layer {i} has inconsistent neuron counts")));
            }
            if let Some(source) = layer.context_source {
                let fits = layers.get(source).is_some_and(|s| s.feed_count == layer.context_count);
                if !fits {
                    return Err(TrainError::config(format!(
                        "layer {i} has {} context neurons that do not match layer {source}",
                        layer.context_count
                    )));
                }
            }
        }

        let mut layers = layers;
        let mut neuron_total = 0;
        let mut weight_total = 0;
        for i in 0..layers.len() {
            layers[i].output_offset = neuron_total;
            layers[i].weight_offset = weight_total;
            neuron_total += layers[i].total_count;
            if let Some(source) = layers.get(i + 1) {
                weight_total += layers[i].feed_count * source.total_count;
            }
        }

        let mut network = FlatNetwork {
            layers,
            weights: vec![0.0; weight_total],
            layer_output: vec![0.0; neuron_total],
            layer_sums: vec![0.0; neuron_total],
            connection_limit,
        };
        network.clear_context();
        Ok(network)
    }

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn input_count(&self) -> usize {
        self.layers.last().map_or(0, |l| l.feed_count)
    }

    pub fn output_count(&self) -> usize {
        self.layers[0].feed_count
    }

    pub fn weight_count(&self) -> usize {
        self.weights.len()
    }

    pub fn layer_output(&self) -> &[f64] {
        &self.layer_output
    }

    pub fn layer_output_mut(&mut self) -> &mut [f64] {
        &mut self.layer_output
    }

    pub fn layer_sums(&self) -> &[f64] {
        &self.layer_sums
    }

    /// Outputs of the last forward pass.
    pub fn output(&self) -> &[f64] {
        &self.layer_output[self.layers[0].feed_range()]
    }

    pub fn has_context(&self) -> bool {
        self.layers.iter().any(LayerDescriptor::has_context)
    }

    pub fn connection_limit(&self) -> f64 {
        self.connection_limit
    }

    /// Limited networks prune connections whose magnitude falls under
    /// `connection_limit` during training.
    pub fn is_limited(&self) -> bool {
        self.connection_limit > 0.0
    }

    /// Resets bias neurons to their activation and context neurons to zero.
    pub fn clear_context(&mut self) {
        reset_context(&self.layers, &mut self.layer_output);
    }

    /// Fills every weight uniformly in `[-1, 1)`.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        for w in self.weights.iter_mut() {
            *w = rng.gen::<f64>() * 2.0 - 1.0;
        }
    }

    /// Forward pass on the network's own buffers.
    pub fn compute(&mut self, input: &[f64]) -> Result<&[f64]> {
        if input.len() != self.input_count() {
            return Err(TrainError::config(format!(
                "input has {} values but the network expects {}",
                input.len(),
                self.input_count()
            )));
        }

        forward_pass(&self.layers, &self.weights, input, &mut self.layer_output, &mut self.layer_sums);
        Ok(self.output())
    }

    /// Forward pass into caller-owned buffers, reading this network's weights.
    ///
    /// `layer_output` and `layer_sums` must be as long as the network's own
    /// buffers and `input` as long as the input layer; callers check this.
    pub fn compute_into(&self, input: &[f64], layer_output: &mut [f64], layer_sums: &mut [f64]) {
        forward_pass(&self.layers, &self.weights, input, layer_output, layer_sums);
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by
    /// `save_json`. The layout is rebuilt and checked against the stored
    /// weights.
    pub fn load_json(path: &str) -> Result<FlatNetwork> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let stored: StoredNetwork = serde_json::from_reader(reader)?;
        FlatNetwork::try_from(stored)
    }
}

/// On-disk form of a `FlatNetwork`. Offsets and buffers are rebuilt from the
/// layer counts when it is loaded.
#[derive(Deserialize)]
struct StoredNetwork {
    layers: Vec<LayerDescriptor>,
    weights: Vec<f64>,
    #[serde(default)]
    connection_limit: f64,
}

impl TryFrom<StoredNetwork> for FlatNetwork {
    type Error = TrainError;

    fn try_from(stored: StoredNetwork) -> Result<FlatNetwork> {
        let mut network = FlatNetwork::from_layers(stored.layers, stored.connection_limit)?;
        if stored.weights.len() != network.weights.len() {
            return Err(TrainError::config(format!(
                "stored network has {} weights but its layers need {}",
                stored.weights.len(),
                network.weights.len()
            )));
        }
        network.weights = stored.weights;
        Ok(network)
    }
}

/// Resets the bias and context slots of a layer-output buffer.
pub(crate) fn reset_context(layers: &[LayerDescriptor], layer_output: &mut [f64]) {
    for layer in layers {
        if let (Some(index), Some(bias)) = (layer.bias_index(), layer.bias_activation) {
            layer_output[index] = bias;
        }
        layer_output[layer.context_range()].fill(0.0);
    }
}

fn forward_pass(
    layers: &[LayerDescriptor],
    weights: &[f64],
    input: &[f64],
    layer_output: &mut [f64],
    layer_sums: &mut [f64],
) {
    let input_layer = &layers[layers.len() - 1];
    layer_output[input_layer.feed_range()].copy_from_slice(input);

    for current in (1..layers.len()).rev() {
        compute_layer(&layers[current], &layers[current - 1], weights, layer_output, layer_sums);
    }

    // Context neurons see the previous pass, so they are refreshed last.
    for layer in layers.iter().filter(|l| l.has_context()) {
        if let Some(source) = layer.context_source {
            let src = layers[source].feed_range();
            layer_output.copy_within(src, layer.context_range().start);
        }
    }
}

fn compute_layer(
    source: &LayerDescriptor,
    target: &LayerDescriptor,
    weights: &[f64],
    layer_output: &mut [f64],
    layer_sums: &mut [f64],
) {
    let mut index = target.weight_offset;
    let inputs = source.output_range();

    for x in target.feed_range() {
        let mut sum = 0.0;
        for y in inputs.clone() {
            sum += weights[index] * layer_output[y];
            index += 1;
        }
        layer_sums[x] = sum;
        layer_output[x] = sum;
    }

    target.activation.activate(&mut layer_output[target.feed_range()]);
}
