use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};

fn default_significance() -> f64 {
    1.0
}

/// One training example: an input vector, its target and a weight for how
/// much the example counts towards the gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPair {
    pub input: Vec<f64>,
    pub ideal: Vec<f64>,
    #[serde(default = "default_significance")]
    pub significance: f64,
}

impl TrainingPair {
    pub fn new(input: Vec<f64>, ideal: Vec<f64>) -> TrainingPair {
        TrainingPair { input, ideal, significance: 1.0 }
    }

    pub fn with_significance(mut self, significance: f64) -> TrainingPair {
        self.significance = significance;
        self
    }
}

/// Indexed, read-only collection of training examples shared by all workers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSet {
    pairs: Vec<TrainingPair>,
}

impl TrainingSet {
    pub fn new(pairs: Vec<TrainingPair>) -> TrainingSet {
        TrainingSet { pairs }
    }

    /// Zips parallel input/target vectors into a training set.
    pub fn from_vectors(inputs: &[Vec<f64>], ideals: &[Vec<f64>]) -> Result<TrainingSet> {
        if inputs.len() != ideals.len() {
            return Err(TrainError::config(format!(
                "{} inputs but {} ideal vectors",
                inputs.len(),
                ideals.len()
            )));
        }

        let pairs = inputs.iter().zip(ideals.iter())
            .map(|(input, ideal)| TrainingPair::new(input.clone(), ideal.clone()))
            .collect();
        Ok(TrainingSet { pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrainingPair> {
        self.pairs.get(index)
    }

    pub fn push(&mut self, pair: TrainingPair) {
        self.pairs.push(pair);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingPair> {
        self.pairs.iter()
    }
}
