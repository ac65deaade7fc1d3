use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::errors::{PoolError, PoolReadError};
use crate::models::ThreadState;

use super::worker_pool::PoolSettings;

/// Live counters of a pool, read without a common lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCounters {
    pub current_size: usize,
    pub active_workers: usize,
    pub queued_tasks: usize,
    pub completed_tasks: u64,
}

/// Read-only view of a bounded worker pool, as stored in the registry.
pub trait ObservablePool: Send + Sync {
    fn settings(&self) -> &PoolSettings;

    fn counters(&self) -> Result<PoolCounters, PoolReadError>;

    /// Named workers the pool currently owns. Unnamed workers are not listed.
    fn tracked_workers(&self) -> Vec<ThreadState>;
}

static GLOBAL: OnceLock<WorkerPoolRegistry> = OnceLock::new();

/// Append-only map of every bounded worker pool, keyed by pool name.
///
/// Written once per pool at construction, read by the pool monitor.
/// There is no removal path: a registered pool lives as long as the registry.
#[derive(Clone, Default)]
pub struct WorkerPoolRegistry {
    pools: Arc<RwLock<HashMap<String, Arc<dyn ObservablePool>>>>,
}

impl WorkerPoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use and never torn down.
    pub fn global() -> &'static WorkerPoolRegistry {
        GLOBAL.get_or_init(WorkerPoolRegistry::new)
    }

    pub fn register(&self, pool: Arc<dyn ObservablePool>) -> Result<(), PoolError> {
        let name = pool.settings().name.clone();
        let mut pools = self.pools.write();
        if pools.contains_key(&name) {
            return Err(PoolError::DuplicateName(name));
        }
        pools.insert(name, pool);
        Ok(())
    }

    pub fn list_pools(&self) -> HashMap<String, Arc<dyn ObservablePool>> {
        self.pools.read().clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ObservablePool>> {
        self.pools.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.pools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.read().is_empty()
    }
}

impl std::fmt::Debug for WorkerPoolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.pools.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("WorkerPoolRegistry").field("pools", &names).finish()
    }
}
