use log::debug;

use crate::data::dataset::TrainingSet;
use crate::engine::scratch::Scratch;
use crate::engine::workload::WorkloadRange;
use crate::error::{Result, TrainError};
use crate::loss::error_calculation::{ErrorCalculation, ErrorMode};
use crate::loss::error_function::ErrorFunction;
use crate::network::network::FlatNetwork;

/// Read-only inputs shared by every worker during one gradient pass.
#[derive(Debug, Clone, Copy)]
pub struct GradientPass<'a> {
    pub network: &'a FlatNetwork,
    /// One flat-spot constant per layer, output-first.
    pub flat_spot: &'a [f64],
    pub error_function: ErrorFunction,
}

/// Gradient contribution of one worker's range.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientReport {
    pub worker: usize,
    pub gradients: Vec<f64>,
    pub error: f64,
    pub examples: usize,
}

impl GradientReport {
    /// Adds this report's gradients into `accumulator`.
    pub fn add_to(&self, accumulator: &mut [f64]) {
        for (acc, g) in accumulator.iter_mut().zip(self.gradients.iter()) {
            *acc += g;
        }
    }
}

/// Computes backpropagated gradients for a contiguous range of examples.
#[derive(Debug, Clone)]
pub struct GradientWorker {
    id: usize,
    range: WorkloadRange,
    scratch: Scratch,
    gradients: Vec<f64>,
    errors: ErrorCalculation,
}

impl GradientWorker {
    pub fn new(id: usize, network: &FlatNetwork, range: WorkloadRange, mode: ErrorMode) -> GradientWorker {
        GradientWorker {
            id,
            range,
            scratch: Scratch::for_network(network),
            gradients: vec![0.0; network.weight_count()],
            errors: ErrorCalculation::new(mode),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn range(&self) -> WorkloadRange {
        self.range
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }

    pub fn errors(&self) -> &ErrorCalculation {
        &self.errors
    }

    pub fn reset_errors(&mut self) {
        self.errors.reset();
    }

    /// Processes the whole assigned range and hands back the gradient.
    ///
    /// On failure the partial gradient is discarded.
    pub fn run(&mut self, pass: &GradientPass<'_>, training: &TrainingSet) -> Result<GradientReport> {
        self.errors.reset();

        for index in self.range.indices() {
            if let Err(err) = self.process(pass, training, index) {
                self.clear_gradients();
                return Err(err);
            }
        }

        let gradients = std::mem::replace(&mut self.gradients, vec![0.0; pass.network.weight_count()]);
        let report = GradientReport {
            worker: self.id,
            gradients,
            error: self.errors.calculate(),
            examples: self.range.len(),
        };
        debug!("worker {} processed {} examples, error {:.6}", self.id, report.examples, report.error);
        Ok(report)
    }

    /// Forward and backward pass for one example, accumulating into this
    /// worker's own gradient buffer.
    pub fn process(&mut self, pass: &GradientPass<'_>, training: &TrainingSet, index: usize) -> Result<()> {
        let network = pass.network;
        let pair = training.get(index).ok_or_else(|| self.failure(format!(
            "example {index} is outside the training set of {} examples",
            training.len()
        )))?;
        if pair.input.len() != network.input_count() {
            return Err(self.failure(format!(
                "example {index} has {} inputs, network expects {}",
                pair.input.len(),
                network.input_count()
            )));
        }
        if pair.ideal.len() != network.output_count() {
            return Err(self.failure(format!(
                "example {index} has {} ideal values, network produces {}",
                pair.ideal.len(),
                network.output_count()
            )));
        }

        let Scratch { layer_output, layer_sums, layer_delta } = &mut self.scratch;
        network.compute_into(&pair.input, layer_output, layer_sums);

        // The output layer sits at offset 0.
        let output_layer = &network.layers()[0];
        let outputs = output_layer.feed_range();
        self.errors.update(&layer_output[outputs.clone()], &pair.ideal, pair.significance);
        pass.error_function.calculate(&pair.ideal, &layer_output[outputs.clone()], &mut layer_delta[outputs.clone()]);

        for i in outputs {
            let derivative = output_layer.activation.derivative(layer_sums[i], layer_output[i]) + pass.flat_spot[0];
            layer_delta[i] *= derivative * pair.significance;
        }

        for level in 0..network.layers().len() - 1 {
            self.process_level(pass, level);
        }

        Ok(())
    }

    /// Accumulates gradients for the connections from layer `level + 1` into
    /// layer `level`, and backpropagates the deltas one layer further.
    fn process_level(&mut self, pass: &GradientPass<'_>, level: usize) {
        let layers = pass.network.layers();
        let weights = &pass.network.weights;
        let target = &layers[level];
        let source = &layers[level + 1];
        let flat_spot = pass.flat_spot[level + 1];
        let from_size = source.total_count;

        let Scratch { layer_output, layer_sums, layer_delta } = &mut self.scratch;

        for (y, yi) in source.output_range().enumerate() {
            let output = layer_output[yi];
            let mut sum = 0.0;
            let mut wi = target.weight_offset + y;

            for xi in target.feed_range() {
                self.gradients[wi] += output * layer_delta[xi];
                sum += weights[wi] * layer_delta[xi];
                wi += from_size;
            }

            layer_delta[yi] = sum * (source.activation.derivative(layer_sums[yi], output) + flat_spot);
        }
    }

    /// Adds the accumulated gradient into `target` and zeroes it here.
    pub fn drain_into(&mut self, target: &mut [f64]) {
        for (t, g) in target.iter_mut().zip(self.gradients.iter_mut()) {
            *t += *g;
            *g = 0.0;
        }
    }

    pub fn clear_gradients(&mut self) {
        self.gradients.fill(0.0);
    }

    fn failure(&self, message: String) -> TrainError {
        TrainError::WorkerComputationFailure { worker: self.id, message }
    }
}
