pub mod workload;
pub mod scratch;
pub mod worker;
pub mod pool;

pub use workload::{determine_workload, WorkloadRange};
pub use scratch::Scratch;
pub use worker::{GradientPass, GradientReport, GradientWorker};
pub use pool::WorkerPool;
