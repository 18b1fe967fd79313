/// Sign-preserving squared error. Large misses dominate the gradient while
/// near-correct outputs barely move the weights.
pub struct SquareError;

impl SquareError {
    /// Per-output error signal: e·|e| with e = ideal - actual
    pub fn calculate(ideal: &[f64], actual: &[f64], error: &mut [f64]) {
        for ((e, i), a) in error.iter_mut().zip(ideal.iter()).zip(actual.iter()) {
            let linear = i - a;
            *e = linear * linear.abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_sign_of_the_miss() {
        let mut error = [0.0; 2];
        SquareError::calculate(&[1.0, 0.0], &[0.5, 2.0], &mut error);
        assert_eq!(error, [0.25, -4.0]);
    }
}
