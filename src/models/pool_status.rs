use serde::Serialize;
use std::fmt;

/// Lifecycle of a worker thread at the moment it was observed.
///
/// Pool-tracked workers only ever report `Starting`, `Idle` or `Running`.
/// OS-level introspection maps kernel scheduler states onto the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerLifecycle {
    Starting,
    Idle,
    Running,
    Sleeping,
    Blocked,
    Stopped,
    Terminated,
    Unknown,
}

impl WorkerLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerLifecycle::Starting => "STARTING",
            WorkerLifecycle::Idle => "IDLE",
            WorkerLifecycle::Running => "RUNNING",
            WorkerLifecycle::Sleeping => "SLEEPING",
            WorkerLifecycle::Blocked => "BLOCKED",
            WorkerLifecycle::Stopped => "STOPPED",
            WorkerLifecycle::Terminated => "TERMINATED",
            WorkerLifecycle::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for WorkerLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadState {
    pub id: u64,
    pub name: String,
    pub state: WorkerLifecycle,
}

/// Point-in-time status of one bounded worker pool.
///
/// The counters are read one after another without a common lock, so
/// they may be slightly inconsistent with each other under load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub name: String,
    pub thread_name_prefix: Option<String>,
    // Configuration
    pub core_size: usize,
    pub max_size: usize,
    pub queue_capacity: usize,
    // Live counters
    pub current_size: usize,
    pub active_workers: usize,
    pub queued_tasks: usize,
    pub completed_tasks: u64,
    pub threads: Vec<ThreadState>,
}

impl PoolStatus {
    /// No worker busy and nothing waiting. An idle pool is not an error.
    pub fn is_idle(&self) -> bool {
        self.active_workers == 0 && self.queued_tasks == 0
    }
}
