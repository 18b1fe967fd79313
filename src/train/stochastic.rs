use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::dataset::TrainingSet;
use crate::engine::worker::{GradientPass, GradientWorker};
use crate::engine::workload::WorkloadRange;
use crate::error::{Result, TrainError};
use crate::network::network::FlatNetwork;
use crate::network::validate::validate_network_for_training;
use crate::optim::sgd::Sgd;
use crate::train::continuation::TrainingContinuation;
use crate::train::error_buffer::PrioritizedErrorBuffer;
use crate::train::sampler::Sampler;
use crate::train::train_config::{check_rate, TrainConfig};
use crate::train::trainer::{flat_spot_for, wrap_worker_failure, Train};

pub const STOCHASTIC_TRAINING_TYPE: &str = "stochastic";

/// Single-threaded online backpropagation: one example per iteration,
/// updated immediately.
///
/// Examples are drawn by the configured `SamplingStrategy`; with the default
/// prioritized sampler every example is visited once, then badly-fit
/// examples are replayed more often. `batch_size` and `thread_count` in the
/// config are ignored.
///
/// Each draw comes from a generator seeded with `seed + iteration`, and pause
/// snapshots carry the per-example errors, so a resumed trainer picks the same
/// examples as an uninterrupted one. The `IndexRing` sampler reads the OS
/// generator and does not replay.
pub struct StochasticTrainer<'a> {
    network: &'a mut FlatNetwork,
    training: &'a TrainingSet,
    config: TrainConfig,
    gradients: Vec<f64>,
    last_delta: Vec<f64>,
    flat_spot: Vec<f64>,
    worker: GradientWorker,
    sampler: Sampler,
    errors: PrioritizedErrorBuffer,
    iteration: usize,
    error: f64,
}

impl<'a> StochasticTrainer<'a> {
    pub fn new(network: &'a mut FlatNetwork, training: &'a TrainingSet, config: TrainConfig) -> Result<StochasticTrainer<'a>> {
        config.validate()?;
        validate_network_for_training(network, training)?;

        let weight_count = network.weight_count();
        let flat_spot = flat_spot_for(network, config.fix_flat_spot);
        let range = WorkloadRange::new(0, training.len() - 1);
        let worker = GradientWorker::new(0, network, range, config.error_mode);
        let sampler = Sampler::new(config.sampling, training.len())?;
        let errors = PrioritizedErrorBuffer::new(training.len())?;

        Ok(StochasticTrainer {
            network,
            training,
            config,
            gradients: vec![0.0; weight_count],
            last_delta: vec![0.0; weight_count],
            flat_spot,
            worker,
            sampler,
            errors,
            iteration: 0,
            error: 0.0,
        })
    }

    pub fn network(&self) -> &FlatNetwork {
        &*self.network
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn learning_rate(&self) -> f64 {
        self.config.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        check_rate("learning rate", learning_rate)?;
        self.config.learning_rate = learning_rate;
        Ok(())
    }

    pub fn momentum(&self) -> f64 {
        self.config.momentum
    }

    pub fn set_momentum(&mut self, momentum: f64) -> Result<()> {
        check_rate("momentum", momentum)?;
        self.config.momentum = momentum;
        Ok(())
    }

    /// Last recorded error per example.
    pub fn error_buffer(&self) -> &PrioritizedErrorBuffer {
        &self.errors
    }

    fn check_resume(&self, state: &TrainingContinuation) -> Result<()> {
        state.validate(STOCHASTIC_TRAINING_TYPE, self.network.weight_count())?;
        if state.example_errors.len() != self.training.len() {
            return Err(TrainError::InvalidResumeState(format!(
                "state holds errors for {} examples but the training set has {}",
                state.example_errors.len(),
                self.training.len()
            )));
        }
        Ok(())
    }

    /// Trains on the example at `index` and returns its error.
    fn train_example(&mut self, index: usize) -> Result<f64> {
        self.worker.reset_errors();
        let pass = GradientPass {
            network: &*self.network,
            flat_spot: &self.flat_spot,
            error_function: self.config.error_function,
        };
        if let Err(err) = self.worker.process(&pass, self.training, index) {
            self.worker.clear_gradients();
            return Err(err);
        }

        self.worker.drain_into(&mut self.gradients);
        let sgd = Sgd::new(self.config.learning_rate, self.config.momentum);
        sgd.apply(self.network, &mut self.gradients, &mut self.last_delta);

        if self.network.has_context() {
            self.network.layer_output_mut().copy_from_slice(&self.worker.scratch().layer_output);
        }

        Ok(self.worker.errors().calculate())
    }
}

impl Train for StochasticTrainer<'_> {
    fn training_type(&self) -> &'static str {
        STOCHASTIC_TRAINING_TYPE
    }

    fn iteration(&mut self) -> Result<f64> {
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(self.iteration as u64));
        let u = rng.gen::<f64>();
        let index = self.sampler.next_index(u, &mut self.errors);

        let example_error = match self.train_example(index) {
            Ok(error) => error,
            Err(err) => {
                warn!("stochastic iteration {} aborted on example {index}: {err}", self.iteration + 1);
                return Err(wrap_worker_failure(self.network, self.training, err));
            }
        };

        self.error = self.errors.add_error(example_error, index);
        self.iteration += 1;
        debug!(
            "stochastic iteration {}: example {index} error {:.6}, average {:.6}",
            self.iteration, example_error, self.error
        );

        Ok(self.error)
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn iteration_number(&self) -> usize {
        self.iteration
    }

    fn set_iteration_number(&mut self, iteration: usize) {
        self.iteration = iteration;
    }

    fn pause(&self) -> TrainingContinuation {
        TrainingContinuation::new(STOCHASTIC_TRAINING_TYPE, self.iteration, self.last_delta.clone())
            .with_example_errors(self.errors.snapshot())
    }

    fn resume(&mut self, state: TrainingContinuation) -> Result<()> {
        self.check_resume(&state)?;
        let errors = PrioritizedErrorBuffer::from_snapshot(&state.example_errors)?;

        self.error = errors.average_error();
        self.errors = errors;
        self.iteration = state.iteration;
        self.last_delta = state.last_delta;
        Ok(())
    }

    fn is_valid_resume(&self, state: &TrainingContinuation) -> bool {
        self.check_resume(state).is_ok()
    }
}
