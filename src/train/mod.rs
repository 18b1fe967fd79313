pub mod trainer;
pub mod train_config;
pub mod continuation;
pub mod error_buffer;
pub mod sampler;
pub mod batch;
pub mod stochastic;
pub mod iteration_stats;
pub mod loop_fn;

pub use trainer::Train;
pub use train_config::TrainConfig;
pub use continuation::TrainingContinuation;
pub use error_buffer::{MovingAverageBuffer, PrioritizedErrorBuffer};
pub use sampler::{IndexRing, SamplingStrategy};
pub use batch::{BatchTrainer, BATCH_TRAINING_TYPE};
pub use stochastic::{StochasticTrainer, STOCHASTIC_TRAINING_TYPE};
pub use iteration_stats::IterationStats;
pub use loop_fn::{train_loop, LoopOptions};
