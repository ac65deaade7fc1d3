mod common;

use std::sync::Arc;

use trade_dashboard::errors::PoolReadError;
use trade_dashboard::execution::{
    ObservablePool, PoolCounters, PoolSettings, ProcessThreads, WorkerPool, WorkerPoolRegistry,
};
use trade_dashboard::models::{ThreadState, WorkerLifecycle};
use trade_dashboard::services::PoolMonitor;

use common::{gate, wait_until};

/// Fixed counters and worker table, for asserting the report shape exactly.
struct FrozenPool {
    settings: PoolSettings,
    counters: PoolCounters,
    workers: Vec<ThreadState>,
}

impl ObservablePool for FrozenPool {
    fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    fn counters(&self) -> Result<PoolCounters, PoolReadError> {
        Ok(self.counters)
    }

    fn tracked_workers(&self) -> Vec<ThreadState> {
        self.workers.clone()
    }
}

fn thread(id: u64, name: &str, state: WorkerLifecycle) -> ThreadState {
    ThreadState {
        id,
        name: name.into(),
        state,
    }
}

#[test]
fn test_busy_pool_report_matches_counters() {
    let registry = WorkerPoolRegistry::new();
    registry
        .register(Arc::new(FrozenPool {
            settings: PoolSettings::new("databaseTaskExecutor", 10, 50, 100).with_thread_name_prefix("db-io-"),
            counters: PoolCounters {
                current_size: 2,
                active_workers: 2,
                queued_tasks: 3,
                completed_tasks: 41,
            },
            workers: vec![
                thread(2, "db-io-2", WorkerLifecycle::Running),
                thread(1, "db-io-1", WorkerLifecycle::Running),
                thread(3, "other-1", WorkerLifecycle::Running),
            ],
        }))
        .unwrap();

    let snapshot = PoolMonitor::tracked(registry).snapshot();
    let status = &snapshot["databaseTaskExecutor"];

    assert_eq!(status.thread_name_prefix.as_deref(), Some("db-io-"));
    assert_eq!(status.core_size, 10);
    assert_eq!(status.max_size, 50);
    assert_eq!(status.queue_capacity, 100);
    assert_eq!(status.current_size, 2);
    assert_eq!(status.active_workers, 2);
    assert_eq!(status.queued_tasks, 3);
    assert_eq!(status.completed_tasks, 41);
    assert!(!status.is_idle());

    let names: Vec<&str> = status.threads.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["db-io-1", "db-io-2"]);
}

#[test]
fn test_live_pool_with_backlog() {
    let registry = WorkerPoolRegistry::new();
    let pool = WorkerPool::new(
        PoolSettings::new("backlog", 2, 2, 100).with_thread_name_prefix("bl-io-"),
        &registry,
    )
    .unwrap();

    let mut releases = Vec::new();
    for _ in 0..5 {
        let (release, task) = gate();
        releases.push(release);
        pool.submit(task).unwrap();
    }
    wait_until(|| pool.active_count() == 2);

    let monitor = PoolMonitor::tracked(registry);
    let snapshot = monitor.log_snapshot();
    let status = &snapshot["backlog"];
    assert_eq!(status.current_size, 2);
    assert_eq!(status.active_workers, 2);
    assert_eq!(status.queued_tasks, 3);
    assert_eq!(status.threads.len(), 2);
    assert!(status.threads.iter().all(|t| t.state == WorkerLifecycle::Running));
    assert!(status.threads.iter().all(|t| t.name.starts_with("bl-io-")));

    drop(releases);
    wait_until(|| pool.completed_count() == 5);

    let drained = monitor.snapshot();
    assert_eq!(drained["backlog"].active_workers, 0);
    assert_eq!(drained["backlog"].queued_tasks, 0);
    assert_eq!(drained["backlog"].completed_tasks, 5);
}

#[test]
fn test_every_registered_pool_is_reported() {
    let registry = WorkerPoolRegistry::new();
    WorkerPool::new(PoolSettings::new("first", 1, 1, 1).with_thread_name_prefix("f-"), &registry).unwrap();
    WorkerPool::new(PoolSettings::new("second", 1, 1, 1), &registry).unwrap();

    let snapshot = PoolMonitor::tracked(registry.clone()).snapshot();
    assert_eq!(snapshot.len(), registry.len());
    assert!(snapshot.contains_key("first"));
    assert!(snapshot.contains_key("second"));
    assert!(snapshot["second"].threads.is_empty());
}

#[test]
fn test_blank_prefix_pool_lists_no_threads() {
    let registry = WorkerPoolRegistry::new();
    let pool = WorkerPool::new(
        PoolSettings::new("blank", 1, 1, 1).with_thread_name_prefix("   "),
        &registry,
    )
    .unwrap();

    let (release, task) = gate();
    let _handle = pool.submit(task).unwrap();
    wait_until(|| pool.active_count() == 1);

    let snapshot = PoolMonitor::tracked(registry).snapshot();
    assert_eq!(snapshot["blank"].active_workers, 1);
    assert!(snapshot["blank"].threads.is_empty());

    drop(release);
}

#[test]
fn test_global_registry_sees_pools_built_against_it() {
    let registry = WorkerPoolRegistry::global();
    WorkerPool::new(PoolSettings::new("global-probe", 1, 1, 1), registry).unwrap();

    assert!(registry.get("global-probe").is_some());
    let again = WorkerPool::new(PoolSettings::new("global-probe", 1, 1, 1), registry);
    assert!(again.is_err());
}

#[cfg(target_os = "linux")]
#[test]
fn test_procfs_monitor_lists_os_threads() {
    let registry = WorkerPoolRegistry::new();
    let pool = WorkerPool::new(
        PoolSettings::new("procfs", 2, 2, 10).with_thread_name_prefix("pmon-proc-"),
        &registry,
    )
    .unwrap();

    let mut releases = Vec::new();
    for _ in 0..2 {
        let (release, task) = gate();
        releases.push(release);
        pool.submit(task).unwrap();
    }
    wait_until(|| pool.active_count() == 2);

    let monitor = PoolMonitor::new(registry, Arc::new(ProcessThreads::new()));
    let snapshot = monitor.snapshot();
    let status = &snapshot["procfs"];

    assert_eq!(status.threads.len(), 2);
    assert!(status.threads.iter().all(|t| t.name.starts_with("pmon-proc-")));
    assert!(status.threads.iter().all(|t| t.state != WorkerLifecycle::Terminated));

    drop(releases);
    wait_until(|| pool.completed_count() == 2);
}
