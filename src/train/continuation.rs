use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};

/// Snapshot of a paused trainer: enough to resume with the same momentum and
/// iteration count on the same network.
///
/// `example_errors` holds the stochastic trainer's last error per example
/// (`None` where the example was not drawn yet); it is empty for batch
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingContinuation {
    pub training_type: String,
    pub iteration: usize,
    pub last_delta: Vec<f64>,
    #[serde(default)]
    pub example_errors: Vec<Option<f64>>,
}

impl TrainingContinuation {
    pub fn new(training_type: &str, iteration: usize, last_delta: Vec<f64>) -> TrainingContinuation {
        TrainingContinuation {
            training_type: training_type.to_string(),
            iteration,
            last_delta,
            example_errors: Vec::new(),
        }
    }

    pub fn with_example_errors(mut self, example_errors: Vec<Option<f64>>) -> TrainingContinuation {
        self.example_errors = example_errors;
        self
    }

    /// Checks the snapshot belongs to `training_type` and a network with
    /// `weight_count` weights.
    pub fn validate(&self, training_type: &str, weight_count: usize) -> Result<()> {
        if self.training_type != training_type {
            return Err(TrainError::InvalidResumeState(format!(
                "state was saved by '{}', cannot resume '{training_type}'",
                self.training_type
            )));
        }
        if self.last_delta.len() != weight_count {
            return Err(TrainError::InvalidResumeState(format!(
                "state holds {} deltas but the network has {weight_count} weights",
                self.last_delta.len()
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<TrainingContinuation> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<TrainingContinuation> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_foreign_training_type() {
        let state = TrainingContinuation::new("batch", 3, vec![0.0; 4]);
        assert!(matches!(
            state.validate("stochastic", 4),
            Err(TrainError::InvalidResumeState(_))
        ));
    }

    #[test]
    fn rejects_wrong_length() {
        let state = TrainingContinuation::new("batch", 3, vec![0.0; 4]);
        assert!(state.validate("batch", 5).is_err());
        assert!(state.validate("batch", 4).is_ok());
    }

    #[test]
    fn survives_json() {
        let state = TrainingContinuation::new("stochastic", 12, vec![0.25, -1.5])
            .with_example_errors(vec![Some(0.5), None]);
        let back = TrainingContinuation::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn batch_json_without_example_errors_still_loads() {
        let back = TrainingContinuation::from_json(
            r#"{"training_type":"batch","iteration":2,"last_delta":[0.0]}"#
        ).unwrap();
        assert!(back.example_errors.is_empty());
    }
}
