use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::TrainingSet;
use crate::engine::pool::WorkerPool;
use crate::engine::worker::GradientPass;
use crate::error::Result;
use crate::network::network::FlatNetwork;
use crate::network::validate::validate_network_for_training;
use crate::optim::sgd::Sgd;
use crate::train::continuation::TrainingContinuation;
use crate::train::error_buffer::MovingAverageBuffer;
use crate::train::train_config::{check_rate, TrainConfig};
use crate::train::trainer::{flat_spot_for, wrap_worker_failure, Train};

/// Tag written into pause snapshots of a `BatchTrainer`.
pub const BATCH_TRAINING_TYPE: &str = "batch";

/// Multithreaded backpropagation with momentum.
///
/// With `batch_size == 0` every iteration computes the gradient of the whole
/// training set in parallel and applies one update. Otherwise the set is
/// walked in a seeded shuffled order and an update is applied every
/// `batch_size` examples.
pub struct BatchTrainer<'a> {
    network: &'a mut FlatNetwork,
    training: &'a TrainingSet,
    config: TrainConfig,
    gradients: Vec<f64>,
    last_delta: Vec<f64>,
    flat_spot: Vec<f64>,
    pool: Option<WorkerPool>,
    iteration: usize,
    error: f64,
    recent_errors: MovingAverageBuffer,
}

impl<'a> BatchTrainer<'a> {
    pub fn new(network: &'a mut FlatNetwork, training: &'a TrainingSet, config: TrainConfig) -> Result<BatchTrainer<'a>> {
        config.validate()?;
        validate_network_for_training(network, training)?;

        let weight_count = network.weight_count();
        let flat_spot = flat_spot_for(network, config.fix_flat_spot);
        let recent_errors = MovingAverageBuffer::new(training.len())?;

        Ok(BatchTrainer {
            network,
            training,
            config,
            gradients: vec![0.0; weight_count],
            last_delta: vec![0.0; weight_count],
            flat_spot,
            pool: None,
            iteration: 0,
            error: 0.0,
            recent_errors,
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

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    /// `0` switches to pure batch. Switching between pure and mini-batch
    /// rebuilds the workers on the next iteration.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        if (batch_size == 0) != (self.config.batch_size == 0) {
            self.pool = None;
        }
        self.config.batch_size = batch_size;
    }

    pub fn thread_count(&self) -> usize {
        self.config.thread_count
    }

    /// Workers are rebuilt on the next iteration when the count changes.
    pub fn set_thread_count(&mut self, thread_count: usize) {
        if thread_count != self.config.thread_count {
            self.config.thread_count = thread_count;
            self.pool = None;
        }
    }

    /// Number of gradient workers, once the first iteration has built them.
    pub fn worker_count(&self) -> Option<usize> {
        self.pool.as_ref().map(WorkerPool::len)
    }

    /// Moving average of the iteration errors over a window as long as the
    /// training set.
    pub fn smoothed_error(&self) -> f64 {
        self.recent_errors.average_error()
    }

    fn sgd(&self) -> Sgd {
        Sgd::new(self.config.learning_rate, self.config.momentum)
    }

    /// Mini-batches run sequentially, so they get a single worker.
    fn take_pool(&mut self) -> Result<WorkerPool> {
        match self.pool.take() {
            Some(pool) => Ok(pool),
            None => {
                let thread_count = match self.config.batch_size {
                    0 => self.config.thread_count,
                    _ => 1,
                };
                let pool = WorkerPool::new(self.network, self.training, thread_count, self.config.error_mode)?;
                debug!("built {} gradient workers", pool.len());
                Ok(pool)
            }
        }
    }

    /// Fans every range out to the pool, merges the reports and applies one
    /// update.
    fn pure_batch(&mut self, pool: &mut WorkerPool) -> Result<f64> {
        let has_context = self.network.has_context();
        if has_context {
            pool.clear_leading_context(self.network);
        }

        let pass = GradientPass {
            network: &*self.network,
            flat_spot: &self.flat_spot,
            error_function: self.config.error_function,
        };
        let reports = pool.run_all(&pass, self.training);

        let worker_count = reports.len();
        let mut error_sum = 0.0;
        let mut failure = None;
        for report in reports {
            match report {
                Ok(report) => {
                    report.add_to(&mut self.gradients);
                    error_sum += report.error;
                }
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        if has_context {
            pool.relay_context(self.network);
        }

        let sgd = self.sgd();
        sgd.apply(self.network, &mut self.gradients, &mut self.last_delta);

        Ok(error_sum / worker_count as f64)
    }

    /// One shuffled pass with an update every `batch_size` examples.
    fn mini_batches(&mut self, pool: &mut WorkerPool) -> Result<f64> {
        let batch_size = self.config.batch_size;
        let mut order: Vec<usize> = (0..self.training.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(self.iteration as u64));
        order.shuffle(&mut rng);

        let sgd = self.sgd();
        let has_context = self.network.has_context();
        let worker = pool.first_mut();
        worker.reset_errors();
        if has_context {
            worker.scratch_mut().clear_context(self.network);
        }

        let mut pending = 0;
        for &index in &order {
            let pass = GradientPass {
                network: &*self.network,
                flat_spot: &self.flat_spot,
                error_function: self.config.error_function,
            };
            if let Err(err) = worker.process(&pass, self.training, index) {
                worker.clear_gradients();
                return Err(err);
            }

            pending += 1;
            if pending == batch_size {
                worker.drain_into(&mut self.gradients);
                sgd.apply(self.network, &mut self.gradients, &mut self.last_delta);
                pending = 0;
            }
        }

        if pending > 0 {
            worker.drain_into(&mut self.gradients);
            sgd.apply(self.network, &mut self.gradients, &mut self.last_delta);
        }

        if has_context {
            self.network.layer_output_mut().copy_from_slice(&worker.scratch().layer_output);
        }

        Ok(worker.errors().calculate())
    }
}

impl Train for BatchTrainer<'_> {
    fn training_type(&self) -> &'static str {
        BATCH_TRAINING_TYPE
    }

    fn iteration(&mut self) -> Result<f64> {
        let mut pool = self.take_pool()?;
        let result = if self.config.batch_size == 0 {
            self.pure_batch(&mut pool)
        } else {
            self.mini_batches(&mut pool)
        };
        self.pool = Some(pool);

        let error = match result {
            Ok(error) => error,
            Err(err) => {
                self.gradients.fill(0.0);
                warn!("iteration {} aborted: {err}", self.iteration + 1);
                return Err(wrap_worker_failure(self.network, self.training, err));
            }
        };

        self.iteration += 1;
        self.error = error;
        self.recent_errors.add_error(error);
        info!("batch iteration {}: error {:.6}", self.iteration, error);

        Ok(error)
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
        TrainingContinuation::new(BATCH_TRAINING_TYPE, self.iteration, self.last_delta.clone())
    }

    fn resume(&mut self, state: TrainingContinuation) -> Result<()> {
        state.validate(BATCH_TRAINING_TYPE, self.network.weight_count())?;
        self.iteration = state.iteration;
        self.last_delta = state.last_delta;
        Ok(())
    }

    fn is_valid_resume(&self, state: &TrainingContinuation) -> bool {
        state.validate(BATCH_TRAINING_TYPE, self.network.weight_count()).is_ok()
    }
}
