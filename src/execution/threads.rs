use std::sync::Arc;

use crate::config::ThreadIntrospection;
use crate::errors::PoolReadError;
use crate::models::{ThreadState, WorkerLifecycle};

use super::registry::ObservablePool;

/// Lists the worker threads that belong to a pool.
///
/// Callers only invoke this for pools with a non-blank thread name prefix.
pub trait WorkerEnumerator: Send + Sync {
    fn enumerate_workers(&self, pool: &dyn ObservablePool) -> Result<Vec<ThreadState>, PoolReadError>;
}

pub fn enumerator_for(mode: ThreadIntrospection) -> Arc<dyn WorkerEnumerator> {
    match mode {
        ThreadIntrospection::Tracked => Arc::new(TrackedWorkers),
        ThreadIntrospection::Procfs => Arc::new(ProcessThreads::new()),
    }
}

/// Uses the pool's own live-worker table. Works on every platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedWorkers;

impl WorkerEnumerator for TrackedWorkers {
    fn enumerate_workers(&self, pool: &dyn ObservablePool) -> Result<Vec<ThreadState>, PoolReadError> {
        let Some(prefix) = pool.settings().effective_prefix() else {
            return Ok(Vec::new());
        };
        let mut workers: Vec<ThreadState> = pool
            .tracked_workers()
            .into_iter()
            .filter(|w| w.name.starts_with(prefix))
            .collect();
        workers.sort_by_key(|w| w.id);
        Ok(workers)
    }
}

/// Scans every OS thread of this process and keeps the ones whose name
/// starts with the pool's prefix. Ids are kernel thread ids.
#[derive(Debug, Clone)]
pub struct ProcessThreads {
    task_dir: std::path::PathBuf,
}

impl Default for ProcessThreads {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessThreads {
    pub fn new() -> Self {
        Self {
            task_dir: "/proc/self/task".into(),
        }
    }
}

/// Linux truncates thread names to 15 bytes.
#[cfg(target_os = "linux")]
const MAX_THREAD_NAME_LEN: usize = 15;

#[cfg(target_os = "linux")]
impl WorkerEnumerator for ProcessThreads {
    fn enumerate_workers(&self, pool: &dyn ObservablePool) -> Result<Vec<ThreadState>, PoolReadError> {
        use std::io::ErrorKind;

        let pool_name = &pool.settings().name;
        let Some(prefix) = pool.settings().effective_prefix() else {
            return Ok(Vec::new());
        };
        let prefix = &prefix.as_bytes()[..prefix.len().min(MAX_THREAD_NAME_LEN)];

        let introspection = |source: std::io::Error| PoolReadError::Introspection {
            pool: pool_name.clone(),
            source,
        };

        let mut threads = Vec::new();
        for entry in std::fs::read_dir(&self.task_dir).map_err(introspection)? {
            let entry = entry.map_err(introspection)?;
            let Some(tid) = entry.file_name().to_str().and_then(|s| s.parse::<u64>().ok()) else {
                continue;
            };

            // A thread can exit between listing and reading; skip it.
            let comm = match std::fs::read_to_string(entry.path().join("comm")) {
                Ok(c) => c,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(introspection(e)),
            };
            let name = comm.trim_end_matches('\n');
            if !name.as_bytes().starts_with(prefix) {
                continue;
            }

            let state = match std::fs::read_to_string(entry.path().join("stat")) {
                Ok(stat) => parse_stat_state(&stat),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(introspection(e)),
            };

            threads.push(ThreadState {
                id: tid,
                name: name.to_string(),
                state,
            });
        }

        threads.sort_by_key(|t| t.id);
        Ok(threads)
    }
}

#[cfg(not(target_os = "linux"))]
impl WorkerEnumerator for ProcessThreads {
    fn enumerate_workers(&self, pool: &dyn ObservablePool) -> Result<Vec<ThreadState>, PoolReadError> {
        if pool.settings().effective_prefix().is_none() {
            return Ok(Vec::new());
        }
        Err(PoolReadError::Unavailable {
            pool: pool.settings().name.clone(),
            reason: format!(
                "process thread introspection needs {}, which this platform does not provide",
                self.task_dir.display()
            ),
        })
    }
}

/// The state letter is the first field after the parenthesised command name,
/// which may itself contain spaces and parentheses.
fn parse_stat_state(stat: &str) -> WorkerLifecycle {
    stat.rfind(')')
        .and_then(|idx| stat[idx + 1..].trim_start().chars().next())
        .map(kernel_state)
        .unwrap_or(WorkerLifecycle::Unknown)
}

fn kernel_state(code: char) -> WorkerLifecycle {
    match code {
        'R' => WorkerLifecycle::Running,
        'S' => WorkerLifecycle::Sleeping,
        'I' => WorkerLifecycle::Idle,
        'D' => WorkerLifecycle::Blocked,
        'T' | 't' => WorkerLifecycle::Stopped,
        'Z' | 'X' | 'x' => WorkerLifecycle::Terminated,
        _ => WorkerLifecycle::Unknown,
    }
}
