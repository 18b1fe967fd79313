use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::data::dataset::TrainingSet;
use crate::engine::worker::{GradientPass, GradientReport, GradientWorker};
use crate::engine::workload::determine_workload;
use crate::error::Result;
use crate::loss::error_calculation::ErrorMode;
use crate::network::network::FlatNetwork;

/// Gradient workers, one per workload range, plus the threads that run them.
pub struct WorkerPool {
    thread_count: usize,
    workers: Vec<GradientWorker>,
    pool: ThreadPool,
}

impl WorkerPool {
    /// Partitions the training set for `thread_count` threads (`0` = auto)
    /// and gives every range its own worker and thread.
    pub fn new(
        network: &FlatNetwork,
        training: &TrainingSet,
        thread_count: usize,
        mode: ErrorMode,
    ) -> Result<WorkerPool> {
        let ranges = determine_workload(thread_count, training.len())?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(ranges.len())
            .thread_name(|i| format!("flatprop-worker-{i}"))
            .build()?;

        let workers = ranges.into_iter()
            .enumerate()
            .map(|(id, range)| GradientWorker::new(id, network, range, mode))
            .collect();

        Ok(WorkerPool { thread_count, workers, pool })
    }

    /// The thread count this pool was requested with.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn workers(&self) -> &[GradientWorker] {
        &self.workers
    }

    /// The worker that handles sequential (mini-batch) passes.
    pub fn first_mut(&mut self) -> &mut GradientWorker {
        &mut self.workers[0]
    }

    /// Runs every worker over its range in parallel and blocks until all of
    /// them finish. Reports come back in worker order.
    pub fn run_all(&mut self, pass: &GradientPass<'_>, training: &TrainingSet) -> Vec<Result<GradientReport>> {
        let workers = &mut self.workers;
        self.pool.install(|| {
            workers.par_iter_mut()
                .map(|worker| worker.run(pass, training))
                .collect()
        })
    }

    /// Clears the context carried into the first worker's range.
    pub fn clear_leading_context(&mut self, network: &FlatNetwork) {
        self.workers[0].scratch_mut().clear_context(network);
    }

    /// Hands each worker's final layer outputs to the next worker, in worker
    /// order, and the last worker's outputs to the canonical network.
    ///
    /// Copies run back to front so every worker receives its predecessor's
    /// outputs from this pass, not ones already relayed.
    pub fn relay_context(&mut self, network: &mut FlatNetwork) {
        if let Some(last) = self.workers.last() {
            network.layer_output_mut().copy_from_slice(&last.scratch().layer_output);
        }

        for i in (1..self.workers.len()).rev() {
            let (done, rest) = self.workers.split_at_mut(i);
            let src = &done[i - 1].scratch().layer_output;
            rest[0].scratch_mut().layer_output.copy_from_slice(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::data::dataset::TrainingPair;
    use crate::loss::error_function::ErrorFunction;
    use crate::network::spec::{LayerSpec, NetworkSpec};

    fn setup() -> (FlatNetwork, TrainingSet) {
        let mut net = NetworkSpec::new("1-2-1", vec![
            LayerSpec::new(1, ActivationFunction::Identity),
            LayerSpec::new(2, ActivationFunction::Sigmoid),
            LayerSpec::new(1, ActivationFunction::Identity),
        ])
        .build()
        .unwrap();
        for (i, w) in net.weights.iter_mut().enumerate() {
            *w = 0.1 * (i as f64 + 1.0);
        }

        let pairs = (0..9)
            .map(|i| TrainingPair::new(vec![i as f64 / 9.0], vec![1.0 - i as f64 / 9.0]))
            .collect();
        (net, TrainingSet::new(pairs))
    }

    #[test]
    fn parallel_reports_sum_to_single_worker_gradient() {
        let (net, set) = setup();
        let flat_spot = vec![0.0; net.layers().len()];
        let pass = GradientPass { network: &net, flat_spot: &flat_spot, error_function: ErrorFunction::Linear };

        let mut single = WorkerPool::new(&net, &set, 1, ErrorMode::Mse).unwrap();
        let mut parallel = WorkerPool::new(&net, &set, 4, ErrorMode::Mse).unwrap();
        assert_eq!(parallel.len(), 4);

        let expected = single.run_all(&pass, &set).pop().unwrap().unwrap().gradients;

        let mut merged = vec![0.0; net.weight_count()];
        for (i, report) in parallel.run_all(&pass, &set).into_iter().enumerate() {
            let report = report.unwrap();
            assert_eq!(report.worker, i);
            report.add_to(&mut merged);
        }

        for (a, b) in expected.iter().zip(merged.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn relay_copies_outputs_in_worker_order() {
        let (mut net, set) = setup();
        let mut pool = WorkerPool::new(&net, &set, 3, ErrorMode::Mse).unwrap();
        for (i, worker) in pool.workers.iter_mut().enumerate() {
            worker.scratch_mut().layer_output.fill(i as f64 + 1.0);
        }

        pool.relay_context(&mut net);

        assert!(pool.workers()[1].scratch().layer_output.iter().all(|&v| v == 1.0));
        assert!(pool.workers()[2].scratch().layer_output.iter().all(|&v| v == 2.0));
        assert!(net.layer_output().iter().all(|&v| v == 3.0));
    }
}
