//! Error types shared by the training engine.

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, TrainError>;

/// Errors raised while configuring or running a trainer.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Bad inputs to a constructor or partitioner. Fatal to the call.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A gradient worker could not process its examples.
    #[error("worker {worker} failed: {message}")]
    WorkerComputationFailure { worker: usize, message: String },

    /// A worker failure re-raised by the trainer after the merge step,
    /// together with the network/dataset compatibility diagnostic.
    #[error("training iteration failed ({diagnostic})")]
    Training {
        diagnostic: String,
        #[source]
        source: Box<TrainError>,
    },

    /// A pause blob that does not belong to this trainer or network.
    #[error("invalid resume state: {0}")]
    InvalidResumeState(String),

    #[error("could not build worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrainError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        TrainError::InvalidConfiguration(message.into())
    }
}
