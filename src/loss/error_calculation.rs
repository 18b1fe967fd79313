use serde::{Serialize, Deserialize};

/// How an `ErrorCalculation` condenses its accumulated squared error.
///
/// - `Mse` — mean squared error over every output value seen
/// - `Rms` — square root of the MSE
/// - `Sse` — half the sum of squared errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    #[default]
    Mse,
    Rms,
    Sse,
}

/// Running squared-error accumulator over processed examples.
#[derive(Debug, Clone, Default)]
pub struct ErrorCalculation {
    mode: ErrorMode,
    global_error: f64,
    set_size: usize,
}

impl ErrorCalculation {
    pub fn new(mode: ErrorMode) -> ErrorCalculation {
        ErrorCalculation { mode, global_error: 0.0, set_size: 0 }
    }

    /// Adds one example; each output's miss is scaled by `significance`.
    pub fn update(&mut self, actual: &[f64], ideal: &[f64], significance: f64) {
        for (a, i) in actual.iter().zip(ideal.iter()) {
            let delta = (i - a) * significance;
            self.global_error += delta * delta;
        }
        self.set_size += ideal.len();
    }

    /// Condensed error for everything seen since the last reset; `0.0` when
    /// nothing was seen.
    pub fn calculate(&self) -> f64 {
        if self.set_size == 0 {
            return 0.0;
        }
        match self.mode {
            ErrorMode::Mse => self.global_error / self.set_size as f64,
            ErrorMode::Rms => (self.global_error / self.set_size as f64).sqrt(),
            ErrorMode::Sse => self.global_error / 2.0,
        }
    }

    pub fn reset(&mut self) {
        self.global_error = 0.0;
        self.set_size = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_averages_over_output_values() {
        let mut calc = ErrorCalculation::new(ErrorMode::Mse);
        calc.update(&[0.0, 1.0], &[1.0, 1.0], 1.0);
        calc.update(&[0.0, 0.0], &[0.0, 2.0], 1.0);
        assert!((calc.calculate() - 5.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn modes_share_the_accumulator() {
        let mut rms = ErrorCalculation::new(ErrorMode::Rms);
        let mut sse = ErrorCalculation::new(ErrorMode::Sse);
        for calc in [&mut rms, &mut sse] {
            calc.update(&[0.0], &[2.0], 1.0);
        }
        assert!((rms.calculate() - 2.0).abs() < 1e-12);
        assert!((sse.calculate() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reset_and_empty_report_zero() {
        let mut calc = ErrorCalculation::new(ErrorMode::Mse);
        assert_eq!(calc.calculate(), 0.0);
        calc.update(&[1.0], &[0.0], 0.5);
        assert!((calc.calculate() - 0.25).abs() < 1e-12);
        calc.reset();
        assert_eq!(calc.calculate(), 0.0);
    }
}
