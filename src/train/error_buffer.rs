use crate::error::{Result, TrainError};

/// Fixed-window moving average over the most recent error samples.
#[derive(Debug, Clone)]
pub struct MovingAverageBuffer {
    values: Vec<f64>,
    next: usize,
    count: usize,
    sum: f64,
}

impl MovingAverageBuffer {
    pub fn new(capacity: usize) -> Result<MovingAverageBuffer> {
        if capacity == 0 {
            return Err(TrainError::config("error buffer capacity must be positive"));
        }
        Ok(MovingAverageBuffer { values: vec![0.0; capacity], next: 0, count: 0, sum: 0.0 })
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Stores `value` over the oldest sample once full and returns the new
    /// average.
    pub fn add_error(&mut self, value: f64) -> f64 {
        if self.count == self.values.len() {
            self.sum -= self.values[self.next];
        } else {
            self.count += 1;
        }

        self.values[self.next] = value;
        self.sum += value;
        self.next = (self.next + 1) % self.values.len();

        self.average_error()
    }

    /// Average of the held samples; `0.0` before the first sample.
    pub fn average_error(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }
}

/// Last known error of every example, used to replay badly-fit examples more
/// often.
#[derive(Debug, Clone)]
pub struct PrioritizedErrorBuffer {
    values: Vec<f64>,
    written: Vec<bool>,
    written_count: usize,
    next_unwritten: usize,
    sum: f64,
}

impl PrioritizedErrorBuffer {
    pub fn new(capacity: usize) -> Result<PrioritizedErrorBuffer> {
        if capacity == 0 {
            return Err(TrainError::config("error buffer capacity must be positive"));
        }
        Ok(PrioritizedErrorBuffer {
            values: vec![0.0; capacity],
            written: vec![false; capacity],
            written_count: 0,
            next_unwritten: 0,
            sum: 0.0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Whether every example has reported an error at least once.
    pub fn is_full(&self) -> bool {
        self.written_count == self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.written.get(index)
            .and_then(|&w| w.then(|| self.values[index]))
    }

    /// Stored error per example, `None` where nothing was written yet.
    pub fn snapshot(&self) -> Vec<Option<f64>> {
        (0..self.values.len()).map(|i| self.get(i)).collect()
    }

    /// Rebuilds a buffer from `snapshot()` output.
    pub fn from_snapshot(values: &[Option<f64>]) -> Result<PrioritizedErrorBuffer> {
        let mut buffer = PrioritizedErrorBuffer::new(values.len())?;
        for (index, value) in values.iter().enumerate() {
            if let Some(value) = *value {
                buffer.add_error(value, index);
            }
        }
        Ok(buffer)
    }

    /// Replaces the error stored for `index` and returns the average over all
    /// examples written so far.
    ///
    /// # Panics
    /// Panics if `index >= capacity()`.
    pub fn add_error(&mut self, value: f64, index: usize) -> f64 {
        assert!(index < self.values.len(), "index {index} outside error buffer of {}", self.values.len());

        if self.written[index] {
            self.sum -= self.values[index];
        } else {
            self.written[index] = true;
            self.written_count += 1;
        }

        self.values[index] = value;
        self.sum += value;

        self.average_error()
    }

    /// Average of the stored errors; `0.0` before the first write.
    pub fn average_error(&self) -> f64 {
        if self.written_count == 0 {
            return 0.0;
        }
        self.sum / self.written_count as f64
    }

    /// Roulette selection for `u` in `[0, 1)`.
    ///
    /// Until every slot was written this returns the lowest unwritten index, so
    /// each example is seen once before selection turns weighted. Afterwards an
    /// index is chosen with probability proportional to its stored error.
    pub fn index_roulette(&mut self, u: f64) -> usize {
        if !self.is_full() {
            while self.written[self.next_unwritten] {
                self.next_unwritten += 1;
            }
            return self.next_unwritten;
        }

        let threshold = self.sum * u;
        let mut acc = 0.0;
        for (i, v) in self.values.iter().enumerate() {
            acc += v;
            if acc >= threshold {
                return i;
            }
        }

        // Rounding left the running total just short of the threshold.
        ((u * self.values.len() as f64) as usize).min(self.values.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn moving_average_below_capacity_is_plain_mean() {
        let mut buf = MovingAverageBuffer::new(5).unwrap();
        let values = [1.0, 2.0, 6.0];
        let mut last = 0.0;
        for v in values {
            last = buf.add_error(v);
        }
        assert_eq!(last, 3.0);
        assert_eq!(buf.average_error(), 3.0);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn moving_average_evicts_oldest() {
        let mut buf = MovingAverageBuffer::new(3).unwrap();
        for v in [100.0, 1.0, 2.0, 3.0] {
            buf.add_error(v);
        }
        assert_eq!(buf.len(), 3);
        assert!((buf.average_error() - 2.0).abs() < 1e-12);

        buf.add_error(10.0);
        assert!((buf.average_error() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(MovingAverageBuffer::new(0).is_err());
        assert!(PrioritizedErrorBuffer::new(0).is_err());
    }

    #[test]
    fn prioritized_add_replaces_previous_value() {
        let mut buf = PrioritizedErrorBuffer::new(4).unwrap();
        assert_eq!(buf.add_error(2.0, 1), 2.0);
        assert_eq!(buf.add_error(4.0, 3), 3.0);
        assert_eq!(buf.add_error(1.0, 1), 2.5);
        assert_eq!(buf.get(1), Some(1.0));
        assert_eq!(buf.get(0), None);
    }

    #[test]
    fn roulette_fills_linearly_before_weighting() {
        let mut buf = PrioritizedErrorBuffer::new(3).unwrap();
        for expected in 0..3 {
            let index = buf.index_roulette(0.99);
            assert_eq!(index, expected);
            buf.add_error(1.0, index);
        }
        assert!(buf.is_full());
    }

    #[test]
    fn roulette_skips_slots_written_out_of_order() {
        let mut buf = PrioritizedErrorBuffer::new(3).unwrap();
        buf.add_error(1.0, 0);
        buf.add_error(1.0, 1);
        assert_eq!(buf.index_roulette(0.0), 2);
    }

    #[test]
    fn snapshot_restores_selection_state() {
        let mut buf = PrioritizedErrorBuffer::new(4).unwrap();
        buf.add_error(0.5, 0);
        buf.add_error(2.0, 2);

        let snapshot = buf.snapshot();
        assert_eq!(snapshot, vec![Some(0.5), None, Some(2.0), None]);

        let mut restored = PrioritizedErrorBuffer::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored.average_error(), buf.average_error());
        assert_eq!(restored.index_roulette(0.3), 1);
        restored.add_error(1.0, 1);
        assert_eq!(restored.index_roulette(0.3), 3);
    }

    #[test]
    fn roulette_is_uniform_for_equal_errors() {
        let n = 8;
        let mut buf = PrioritizedErrorBuffer::new(n).unwrap();
        for i in 0..n {
            buf.add_error(1.0, i);
        }

        let mut rng = StdRng::seed_from_u64(7);
        let trials = 80_000;
        let mut hits = vec![0usize; n];
        for _ in 0..trials {
            hits[buf.index_roulette(rng.gen::<f64>())] += 1;
        }

        let expected = trials as f64 / n as f64;
        for h in hits {
            assert!((h as f64 - expected).abs() < expected * 0.05, "hits {h}, expected ~{expected}");
        }
    }

    #[test]
    fn roulette_favours_high_error_examples() {
        let n = 10;
        let mut buf = PrioritizedErrorBuffer::new(n).unwrap();
        for i in 0..n {
            buf.add_error(if i == 4 { 91.0 } else { 1.0 }, i);
        }

        let mut rng = StdRng::seed_from_u64(11);
        let trials = 20_000;
        let hot = (0..trials)
            .filter(|_| buf.index_roulette(rng.gen::<f64>()) == 4)
            .count();

        // 91 / 100 of the mass sits on index 4.
        assert!(hot as f64 > trials as f64 * 0.85, "index 4 chosen {hot} times");
    }

    #[test]
    fn roulette_falls_back_when_rounding_misses() {
        let mut buf = PrioritizedErrorBuffer::new(4).unwrap();
        for i in 0..4 {
            buf.add_error(0.1, i);
        }
        // Drift the running sum above the stored values.
        buf.sum += 1e-9;
        assert_eq!(buf.index_roulette(0.999_999_999_9), 3);
    }
}
