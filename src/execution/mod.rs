pub mod registry;
pub mod threads;
pub mod worker_pool;

pub use registry::{ObservablePool, PoolCounters, WorkerPoolRegistry};
pub use threads::{enumerator_for, ProcessThreads, TrackedWorkers, WorkerEnumerator};
pub use worker_pool::{PoolSettings, TaskHandle, WorkerPool};
