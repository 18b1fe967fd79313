pub mod error;
pub mod activation;
pub mod layers;
pub mod network;
pub mod data;
pub mod loss;
pub mod optim;
pub mod engine;
pub mod train;

// Convenience re-exports
pub use error::{Result, TrainError};
pub use activation::activation::ActivationFunction;
pub use layers::descriptor::LayerDescriptor;
pub use network::network::FlatNetwork;
pub use network::spec::{LayerSpec, NetworkSpec};
pub use network::validate::validate_network_for_training;
pub use data::dataset::{TrainingPair, TrainingSet};
pub use loss::error_calculation::ErrorMode;
pub use loss::error_function::ErrorFunction;
pub use optim::sgd::Sgd;
pub use engine::workload::determine_workload;
pub use train::{
    train_loop, BatchTrainer, IterationStats, LoopOptions, SamplingStrategy, StochasticTrainer,
    Train, TrainConfig, TrainingContinuation,
};
