pub mod dataset;

pub use dataset::{TrainingPair, TrainingSet};
