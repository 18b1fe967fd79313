use std::ops::RangeInclusive;

use log::debug;

use crate::error::{Result, TrainError};

/// Closed interval `[low, high]` of example indices handled by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadRange {
    pub low: usize,
    pub high: usize,
}

impl WorkloadRange {
    pub fn new(low: usize, high: usize) -> WorkloadRange {
        WorkloadRange { low, high }
    }

    pub fn len(&self) -> usize {
        self.high - self.low + 1
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.low..=self.high
    }
}

/// Number of parallel execution units available to this process.
pub fn available_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Splits `dataset_size` examples into contiguous ranges for `thread_count`
/// workers (`0` = one per available execution unit).
///
/// Never produces more ranges than examples; range sizes differ by at most one,
/// with the larger ranges first.
pub fn determine_workload(thread_count: usize, dataset_size: usize) -> Result<Vec<WorkloadRange>> {
    if dataset_size == 0 {
        return Err(TrainError::config("cannot partition an empty training set"));
    }

    let threads = match thread_count {
        0 => available_threads(),
        n => n,
    }
    .min(dataset_size);

    let base = dataset_size / threads;
    let remainder = dataset_size % threads;

    let mut ranges = Vec::with_capacity(threads);
    let mut low = 0;
    for i in 0..threads {
        let size = base + usize::from(i < remainder);
        ranges.push(WorkloadRange::new(low, low + size - 1));
        low += size;
    }

    debug!("partitioned {dataset_size} examples into {} ranges", ranges.len());
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_partition(thread_count: usize, dataset_size: usize) {
        let ranges = determine_workload(thread_count, dataset_size).unwrap();

        assert!(!ranges.is_empty());
        assert_eq!(ranges[0].low, 0);
        assert_eq!(ranges.last().unwrap().high, dataset_size - 1);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].high + 1, pair[1].low, "ranges must be ordered and touching");
        }

        let min = ranges.iter().map(WorkloadRange::len).min().unwrap();
        let max = ranges.iter().map(WorkloadRange::len).max().unwrap();
        assert!(max - min <= 1, "{thread_count} threads / {dataset_size}: sizes {min}..{max}");
        assert_eq!(ranges.iter().map(WorkloadRange::len).sum::<usize>(), dataset_size);
    }

    #[test]
    fn partitions_cover_the_dataset_exactly_once() {
        for dataset_size in 1..=40 {
            for thread_count in 0..=12 {
                check_partition(thread_count, dataset_size);
            }
        }
        check_partition(7, 10_003);
    }

    #[test]
    fn never_more_ranges_than_examples() {
        let ranges = determine_workload(8, 3).unwrap();
        assert_eq!(ranges.len(), 3);
        assert!(ranges.iter().all(|r| r.len() == 1));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(determine_workload(3, 11).unwrap(), determine_workload(3, 11).unwrap());
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert!(matches!(
            determine_workload(2, 0),
            Err(TrainError::InvalidConfiguration(_))
        ));
    }
}
