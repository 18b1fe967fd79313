use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use log::info;

use crate::error::Result;
use crate::train::iteration_stats::IterationStats;
use crate::train::trainer::Train;

/// Stopping rules and observers for `train_loop`.
///
/// # Fields
/// - `max_iterations` — upper bound on iterations run by this call
/// - `target_error`   — stop once an iteration reports an error at or below it
/// - `progress_tx`    — one `IterationStats` per iteration; a dropped receiver
///                      ends the loop
/// - `stop_flag`      — set from another thread to stop after the current
///                      iteration
#[derive(Debug, Default)]
pub struct LoopOptions {
    pub max_iterations: usize,
    pub target_error: Option<f64>,
    pub progress_tx: Option<mpsc::Sender<IterationStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl LoopOptions {
    pub fn new(max_iterations: usize) -> Self {
        LoopOptions { max_iterations, ..LoopOptions::default() }
    }

    pub fn with_target_error(mut self, target_error: f64) -> Self {
        self.target_error = Some(target_error);
        self
    }

    pub fn with_progress(mut self, progress_tx: mpsc::Sender<IterationStats>) -> Self {
        self.progress_tx = Some(progress_tx);
        self
    }

    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(stop_flag);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Runs `trainer` until one of the `options` rules ends the loop and returns
/// the error of the last completed iteration (`trainer.error()` when no
/// iteration ran).
///
/// A failed iteration ends the loop with its error.
pub fn train_loop<T: Train + ?Sized>(trainer: &mut T, options: &LoopOptions) -> Result<f64> {
    let mut last_error = trainer.error();

    for _ in 0..options.max_iterations {
        if options.stop_requested() {
            break;
        }

        let t_start = Instant::now();
        last_error = trainer.iteration()?;
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        if let Some(ref tx) = options.progress_tx {
            let stats = IterationStats { iteration: trainer.iteration_number(), error: last_error, elapsed_ms };
            if tx.send(stats).is_err() {
                break;
            }
        }

        if options.target_error.is_some_and(|target| last_error <= target) {
            info!(
                "{} training reached target error after iteration {}",
                trainer.training_type(),
                trainer.iteration_number()
            );
            break;
        }
    }

    Ok(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::continuation::TrainingContinuation;

    /// Trainer whose error halves every iteration.
    struct Halving {
        error: f64,
        iteration: usize,
    }

    impl Train for Halving {
        fn training_type(&self) -> &'static str {
            "halving"
        }

        fn iteration(&mut self) -> Result<f64> {
            self.error /= 2.0;
            self.iteration += 1;
            Ok(self.error)
        }

        fn error(&self) -> f64 {
            self.error
        }

        fn iteration_number(&self) -> usize {
            self.iteration
        }

        fn set_iteration_number(&mut self, iteration: usize) {
            self.iteration = iteration;
        }

        fn pause(&self) -> TrainingContinuation {
            TrainingContinuation::new("halving", self.iteration, Vec::new())
        }

        fn resume(&mut self, state: TrainingContinuation) -> Result<()> {
            state.validate("halving", 0)?;
            self.iteration = state.iteration;
            Ok(())
        }

        fn is_valid_resume(&self, state: &TrainingContinuation) -> bool {
            state.validate("halving", 0).is_ok()
        }
    }

    #[test]
    fn stops_at_target_error() {
        let mut trainer = Halving { error: 1.0, iteration: 0 };
        let error = train_loop(&mut trainer, &LoopOptions::new(100).with_target_error(0.1)).unwrap();
        assert_eq!(trainer.iteration, 4);
        assert_eq!(error, 0.0625);
    }

    #[test]
    fn stop_flag_prevents_further_iterations() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut trainer = Halving { error: 1.0, iteration: 0 };
        let error = train_loop(&mut trainer, &LoopOptions::new(10).with_stop_flag(flag)).unwrap();
        assert_eq!(trainer.iteration, 0);
        assert_eq!(error, 1.0);
    }

    #[test]
    fn sends_one_record_per_iteration() {
        let (tx, rx) = mpsc::channel();
        let mut trainer = Halving { error: 8.0, iteration: 0 };
        train_loop(&mut trainer, &LoopOptions::new(3).with_progress(tx)).unwrap();

        let stats: Vec<IterationStats> = rx.try_iter().collect();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[2].iteration, 3);
        assert_eq!(stats[2].error, 1.0);
    }
}
