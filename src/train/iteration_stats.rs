use serde::{Serialize, Deserialize};

/// Progress record sent by `train_loop` after every completed iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// 1-based, continuing from a resumed snapshot.
    pub iteration: usize,
    pub error: f64,
    /// Wall-clock duration of this iteration in milliseconds.
    pub elapsed_ms: u64,
}
