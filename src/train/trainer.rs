use crate::data::dataset::TrainingSet;
use crate::error::{Result, TrainError};
use crate::network::network::FlatNetwork;
use crate::network::validate::validate_network_for_training;
use crate::train::continuation::TrainingContinuation;

/// Common surface of the iterative trainers, driven by an outer loop.
pub trait Train {
    /// Tag stored in pause snapshots; a snapshot only resumes the same kind
    /// of trainer.
    fn training_type(&self) -> &'static str;

    /// Advances training by one step and returns the resulting error.
    fn iteration(&mut self) -> Result<f64>;

    /// Error reported by the last iteration.
    fn error(&self) -> f64;

    fn iteration_number(&self) -> usize;

    fn set_iteration_number(&mut self, iteration: usize);

    /// Snapshot of the momentum state.
    fn pause(&self) -> TrainingContinuation;

    /// Restores a snapshot taken by `pause()`; nothing changes if it is rejected.
    fn resume(&mut self, state: TrainingContinuation) -> Result<()>;

    fn is_valid_resume(&self, state: &TrainingContinuation) -> bool;
}

/// Per-layer flat-spot constants, output-first.
pub(crate) fn flat_spot_for(network: &FlatNetwork, fix_flat_spot: bool) -> Vec<f64> {
    network.layers()
        .iter()
        .map(|layer| if fix_flat_spot { layer.activation.flat_spot() } else { 0.0 })
        .collect()
}

/// Attaches the network/dataset compatibility check to a worker failure.
pub(crate) fn wrap_worker_failure(network: &FlatNetwork, training: &TrainingSet, err: TrainError) -> TrainError {
    match err {
        TrainError::WorkerComputationFailure { .. } => {
            let diagnostic = match validate_network_for_training(network, training) {
                Ok(()) => "network and training set are compatible".to_string(),
                Err(check) => check.to_string(),
            };
            TrainError::Training { diagnostic, source: Box::new(err) }
        }
        other => other,
    }
}
