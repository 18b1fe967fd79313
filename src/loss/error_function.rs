use serde::{Serialize, Deserialize};

use crate::loss::linear::LinearError;
use crate::loss::square::SquareError;

/// Selects how the raw output error signal is derived from ideal and actual
/// outputs before it is scaled by the activation derivative.
///
/// - `Linear` — ideal - actual
/// - `Square` — (ideal - actual)·|ideal - actual|
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFunction {
    #[default]
    Linear,
    Square,
}

impl ErrorFunction {
    pub fn calculate(&self, ideal: &[f64], actual: &[f64], error: &mut [f64]) {
        match self {
            ErrorFunction::Linear => LinearError::calculate(ideal, actual, error),
            ErrorFunction::Square => SquareError::calculate(ideal, actual, error),
        }
    }
}
