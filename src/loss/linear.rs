pub struct LinearError;

impl LinearError {
    /// Per-output error signal: ideal - actual
    pub fn calculate(ideal: &[f64], actual: &[f64], error: &mut [f64]) {
        for ((e, i), a) in error.iter_mut().zip(ideal.iter()).zip(actual.iter()) {
            *e = i - a;
        }
    }
}
