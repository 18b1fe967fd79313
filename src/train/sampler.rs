use rand::rngs::OsRng;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::train::error_buffer::PrioritizedErrorBuffer;

/// How the stochastic trainer picks the next example.
///
/// - `Prioritized` — roulette over each example's last error (every example
///   is visited once first)
/// - `Uniform`     — uniform draw from the trainer's seeded generator
/// - `IndexRing`   — indexes drawn from a ring of OS-random values, refilled
///   every `buffer_size` draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SamplingStrategy {
    #[default]
    Prioritized,
    Uniform,
    IndexRing { buffer_size: usize },
}

/// Fixed-size ring of random indexes seeded from the operating system.
#[derive(Debug, Clone)]
pub struct IndexRing {
    max_index: usize,
    indices: Vec<u32>,
    cursor: usize,
}

impl IndexRing {
    pub fn new(max_index: usize, buffer_size: usize) -> Result<IndexRing> {
        if max_index == 0 || buffer_size == 0 {
            return Err(TrainError::config("index ring needs a positive range and buffer size"));
        }
        let mut ring = IndexRing { max_index, indices: vec![0; buffer_size], cursor: 0 };
        ring.repopulate();
        Ok(ring)
    }

    pub fn next_index(&mut self) -> usize {
        if self.cursor == self.indices.len() {
            self.repopulate();
            self.cursor = 0;
        }

        let index = self.indices[self.cursor] as usize % self.max_index;
        self.cursor += 1;
        index
    }

    fn repopulate(&mut self) {
        let mut os = OsRng;
        os.fill(&mut self.indices[..]);
    }
}

/// Runtime state behind a `SamplingStrategy`.
#[derive(Debug, Clone)]
pub(crate) enum Sampler {
    Roulette,
    Uniform { len: usize },
    Ring(IndexRing),
}

impl Sampler {
    pub(crate) fn new(strategy: SamplingStrategy, dataset_len: usize) -> Result<Sampler> {
        Ok(match strategy {
            SamplingStrategy::Prioritized => Sampler::Roulette,
            SamplingStrategy::Uniform => Sampler::Uniform { len: dataset_len },
            SamplingStrategy::IndexRing { buffer_size } => Sampler::Ring(IndexRing::new(dataset_len, buffer_size)?),
        })
    }

    /// Picks an example given a uniform draw `u` in `[0, 1)`.
    pub(crate) fn next_index(&mut self, u: f64, errors: &mut PrioritizedErrorBuffer) -> usize {
        match self {
            Sampler::Roulette => errors.index_roulette(u),
            Sampler::Uniform { len } => ((u * *len as f64) as usize).min(*len - 1),
            Sampler::Ring(ring) => ring.next_index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_stays_in_range_across_refills() {
        let mut ring = IndexRing::new(7, 16).unwrap();
        for _ in 0..100 {
            assert!(ring.next_index() < 7);
        }
    }

    #[test]
    fn uniform_maps_draw_onto_dataset() {
        let mut errors = PrioritizedErrorBuffer::new(4).unwrap();
        let mut sampler = Sampler::new(SamplingStrategy::Uniform, 4).unwrap();
        assert_eq!(sampler.next_index(0.0, &mut errors), 0);
        assert_eq!(sampler.next_index(0.5, &mut errors), 2);
        assert_eq!(sampler.next_index(0.999, &mut errors), 3);
    }

    #[test]
    fn strategy_round_trips_through_json() {
        let json = serde_json::to_string(&SamplingStrategy::IndexRing { buffer_size: 4096 }).unwrap();
        assert_eq!(json, r#"{"kind":"index_ring","buffer_size":4096}"#);
        let back: SamplingStrategy = serde_json::from_str(r#"{"kind":"prioritized"}"#).unwrap();
        assert_eq!(back, SamplingStrategy::Prioritized);
    }
}
