use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::{counter, gauge};

use crate::errors::PoolReadError;
use crate::execution::{ObservablePool, TrackedWorkers, WorkerEnumerator, WorkerPoolRegistry};
use crate::models::PoolStatus;

/// Builds point-in-time [`PoolStatus`] reports for every registered pool.
///
/// Read-only: never submits work to or reconfigures a pool.
#[derive(Clone)]
pub struct PoolMonitor {
    registry: WorkerPoolRegistry,
    enumerator: Arc<dyn WorkerEnumerator>,
}

impl PoolMonitor {
    pub fn new(registry: WorkerPoolRegistry, enumerator: Arc<dyn WorkerEnumerator>) -> Self {
        Self { registry, enumerator }
    }

    /// Monitor backed by the pools' own worker tables.
    pub fn tracked(registry: WorkerPoolRegistry) -> Self {
        Self::new(registry, Arc::new(TrackedWorkers))
    }

    /// Status of every pool keyed by pool name. A pool that cannot be read
    /// is left out; the others are still reported.
    pub fn snapshot(&self) -> BTreeMap<String, PoolStatus> {
        let mut statuses = BTreeMap::new();

        for (name, pool) in self.registry.list_pools() {
            match self.read_pool(pool.as_ref()) {
                Ok(status) => {
                    record_gauges(&status);
                    statuses.insert(name, status);
                }
                Err(e) => {
                    counter!("pool_read_failures_total", "pool" => name.clone()).increment(1);
                    tracing::warn!(pool = %name, error = %e, "Pool status unavailable, omitting from snapshot");
                }
            }
        }

        statuses
    }

    /// Take a snapshot and log one event per pool.
    pub fn log_snapshot(&self) -> BTreeMap<String, PoolStatus> {
        let snapshot = self.snapshot();
        for status in snapshot.values() {
            let threads: Vec<String> = status
                .threads
                .iter()
                .map(|t| format!("{}:{}", t.name, t.state))
                .collect();
            tracing::info!(
                pool = %status.name,
                size = status.current_size,
                core = status.core_size,
                max = status.max_size,
                active = status.active_workers,
                queued = status.queued_tasks,
                queue_capacity = status.queue_capacity,
                completed = status.completed_tasks,
                threads = %threads.join(","),
                "Worker pool status"
            );
        }
        snapshot
    }

    fn read_pool(&self, pool: &dyn ObservablePool) -> Result<PoolStatus, PoolReadError> {
        let settings = pool.settings();
        let counters = pool.counters()?;

        let threads = if settings.effective_prefix().is_some() {
            self.enumerator.enumerate_workers(pool)?
        } else {
            Vec::new()
        };

        Ok(PoolStatus {
            name: settings.name.clone(),
            thread_name_prefix: settings.thread_name_prefix.clone(),
            core_size: settings.core_size,
            max_size: settings.max_size,
            queue_capacity: settings.queue_capacity,
            current_size: counters.current_size,
            active_workers: counters.active_workers,
            queued_tasks: counters.queued_tasks,
            completed_tasks: counters.completed_tasks,
            threads,
        })
    }
}

fn record_gauges(status: &PoolStatus) {
    let pool = status.name.clone();
    gauge!("pool_current_size", "pool" => pool.clone()).set(status.current_size as f64);
    gauge!("pool_active_workers", "pool" => pool.clone()).set(status.active_workers as f64);
    gauge!("pool_queued_tasks", "pool" => pool.clone()).set(status.queued_tasks as f64);
    gauge!("pool_completed_tasks", "pool" => pool).set(status.completed_tasks as f64);
}
