use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::loss::error_calculation::ErrorMode;
use crate::loss::error_function::ErrorFunction;
use crate::train::sampler::SamplingStrategy;

/// Hyperparameters shared by the batch and stochastic trainers.
///
/// # Fields
/// - `learning_rate`  — scale applied to the merged gradient
/// - `momentum`       — fraction of the previous update carried into the next
/// - `batch_size`     — `0` for pure batch; otherwise examples per update
///                      (batch trainer only)
/// - `thread_count`   — gradient workers; `0` uses every available core
///                      (batch trainer only)
/// - `fix_flat_spot`  — add a constant to sigmoid derivatives
/// - `error_function` — how the output error signal is derived
/// - `error_mode`     — how reported errors are condensed
/// - `sampling`       — example selection for the stochastic trainer
/// - `seed`           — seeds shuffles and sampling draws
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub batch_size: usize,
    pub thread_count: usize,
    pub fix_flat_spot: bool,
    pub error_function: ErrorFunction,
    pub error_mode: ErrorMode,
    pub sampling: SamplingStrategy,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.3,
            momentum: 0.01,
            batch_size: 0,
            thread_count: 0,
            fix_flat_spot: true,
            error_function: ErrorFunction::Linear,
            error_mode: ErrorMode::Mse,
            sampling: SamplingStrategy::Prioritized,
            seed: 1001,
        }
    }
}

impl TrainConfig {
    /// Default configuration with the given learning rate and momentum.
    pub fn new(learning_rate: f64, momentum: f64) -> Self {
        TrainConfig { learning_rate, momentum, ..TrainConfig::default() }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_flat_spot(mut self, fix_flat_spot: bool) -> Self {
        self.fix_flat_spot = fix_flat_spot;
        self
    }

    pub fn with_error_function(mut self, error_function: ErrorFunction) -> Self {
        self.error_function = error_function;
        self
    }

    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingStrategy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_rate("learning rate", self.learning_rate)?;
        check_rate("momentum", self.momentum)?;
        if let SamplingStrategy::IndexRing { buffer_size: 0 } = self.sampling {
            return Err(TrainError::config("index ring buffer size must be positive"));
        }
        Ok(())
    }

    /// Reads a configuration from a JSON file; missing fields take defaults.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

pub(crate) fn check_rate(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TrainError::config(format!("{name} must be a non-negative number, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_takes_defaults() {
        let config: TrainConfig = serde_json::from_str(r#"{"learning_rate": 0.1, "batch_size": 4}"#).unwrap();
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.momentum, 0.01);
        assert_eq!(config.sampling, SamplingStrategy::Prioritized);
        assert!(config.fix_flat_spot);
    }

    #[test]
    fn negative_or_nan_rates_are_rejected() {
        assert!(TrainConfig::new(-0.1, 0.0).validate().is_err());
        assert!(TrainConfig::new(0.1, f64::NAN).validate().is_err());
        assert!(TrainConfig::new(0.3, 0.01).validate().is_ok());
    }
}
