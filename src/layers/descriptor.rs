use std::ops::Range;

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;

/// Placement of one layer inside a flat network.
///
/// Layers are stored output-first: descriptor `0` is the output layer and the
/// last descriptor is the input layer. Inside the shared output/sum buffers a
/// layer occupies `total_count` slots laid out as
/// `[fed neurons..., bias?, context neurons...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Neurons computed from the previous layer (or fed by the input vector).
    pub feed_count: usize,
    /// Fed neurons plus the bias neuron and any context neurons.
    pub total_count: usize,
    /// Offset of this layer inside the layer output/sum buffers.
    pub output_offset: usize,
    /// Offset of the weights feeding this layer. For the input layer this is
    /// the weight count (nothing feeds it).
    pub weight_offset: usize,
    pub activation: ActivationFunction,
    /// Constant output of the bias neuron, `None` when the layer has none.
    pub bias_activation: Option<f64>,
    /// Number of context neurons appended after the bias.
    pub context_count: usize,
    /// Layer (output-first index) whose fed outputs are copied into this
    /// layer's context neurons after every forward pass.
    pub context_source: Option<usize>,
}

impl LayerDescriptor {
    /// Slots of the fed neurons.
    pub fn feed_range(&self) -> Range<usize> {
        self.output_offset..self.output_offset + self.feed_count
    }

    /// Every slot of the layer, bias and context included.
    pub fn output_range(&self) -> Range<usize> {
        self.output_offset..self.output_offset + self.total_count
    }

    pub fn bias_index(&self) -> Option<usize> {
        self.bias_activation.map(|_| self.output_offset + self.feed_count)
    }

    pub fn context_range(&self) -> Range<usize> {
        let end = self.output_offset + self.total_count;
        end - self.context_count..end
    }

    pub fn has_context(&self) -> bool {
        self.context_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_follow_feed_bias_context_order() {
        let layer = LayerDescriptor {
            feed_count: 3,
            total_count: 6,
            output_offset: 10,
            weight_offset: 0,
            activation: ActivationFunction::Identity,
            bias_activation: Some(1.0),
            context_count: 2,
            context_source: Some(1),
        };

        assert_eq!(layer.feed_range(), 10..13);
        assert_eq!(layer.bias_index(), Some(13));
        assert_eq!(layer.context_range(), 14..16);
        assert_eq!(layer.output_range(), 10..16);
    }
}
