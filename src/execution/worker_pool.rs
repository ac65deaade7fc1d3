use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::Duration;

use metrics::counter;
use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;

use crate::errors::{PoolError, PoolReadError};
use crate::models::{ThreadState, WorkerLifecycle};

use super::registry::{ObservablePool, PoolCounters, WorkerPoolRegistry};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Sizing and naming for a bounded worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Registry key. Must be unique per registry.
    pub name: String,
    /// Worker threads are named `<prefix><n>`. `None` or blank leaves them unnamed.
    pub thread_name_prefix: Option<String>,
    pub core_size: usize,
    pub max_size: usize,
    pub queue_capacity: usize,
    /// Idle time after which workers above `core_size` exit.
    pub keep_alive: Duration,
}

impl PoolSettings {
    pub fn new(name: impl Into<String>, core_size: usize, max_size: usize, queue_capacity: usize) -> Self {
        Self {
            name: name.into(),
            thread_name_prefix: None,
            core_size,
            max_size,
            queue_capacity,
            keep_alive: Duration::from_secs(60),
        }
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = Some(prefix.into());
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// The prefix, if it is set and not blank.
    pub fn effective_prefix(&self) -> Option<&str> {
        self.thread_name_prefix
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.name.trim().is_empty() {
            return Err(PoolError::InvalidSettings("pool name must not be blank".into()));
        }
        if self.max_size == 0 {
            return Err(PoolError::InvalidSettings(format!(
                "pool '{}': max_size must be at least 1",
                self.name
            )));
        }
        if self.core_size > self.max_size {
            return Err(PoolError::InvalidSettings(format!(
                "pool '{}': core_size {} exceeds max_size {}",
                self.name, self.core_size, self.max_size
            )));
        }
        Ok(())
    }
}

struct WorkerSlot {
    name: Option<String>,
    state: WorkerLifecycle,
}

struct PoolState {
    queue: VecDeque<Job>,
    workers: BTreeMap<u64, WorkerSlot>,
    /// Workers parked in `next_job`.
    waiting: usize,
    shutdown: bool,
}

struct Shared {
    settings: PoolSettings,
    state: Mutex<PoolState>,
    available: Condvar,
    active: AtomicUsize,
    completed: AtomicU64,
    next_worker_id: AtomicU64,
}

/// A fixed-capacity set of OS worker threads in front of a bounded queue.
///
/// Submission follows the classic executor policy: start a worker while
/// below `core_size`, then queue, then grow up to `max_size`, then reject.
/// Results come back through [`TaskHandle`], so async callers never block
/// a runtime thread while the work runs.
pub struct WorkerPool {
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Build the pool and register it. Workers are started lazily on submit.
    pub fn new(settings: PoolSettings, registry: &WorkerPoolRegistry) -> Result<Arc<Self>, PoolError> {
        settings.validate()?;

        let pool = Arc::new(Self {
            shared: Arc::new(Shared {
                settings,
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    workers: BTreeMap::new(),
                    waiting: 0,
                    shutdown: false,
                }),
                available: Condvar::new(),
                active: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
                next_worker_id: AtomicU64::new(1),
            }),
        });

        registry.register(pool.clone())?;

        let s = &pool.shared.settings;
        counter!("pool_rejections_total", "pool" => s.name.clone()).absolute(0);
        tracing::info!(
            pool = %s.name,
            prefix = s.effective_prefix().unwrap_or(""),
            core = s.core_size,
            max = s.max_size,
            queue = s.queue_capacity,
            "Worker pool created"
        );

        Ok(pool)
    }

    pub fn name(&self) -> &str {
        &self.shared.settings.name
    }

    /// Hand `task` to the pool. Fails synchronously when the pool is saturated
    /// or shut down; otherwise the returned handle resolves with the task's value.
    pub fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let pool_name = self.shared.settings.name.clone();
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
                tracing::error!(
                    pool = %pool_name,
                    panic = panic_message(payload.as_ref()),
                    "Task panicked on worker"
                );
            });
            // The caller may have stopped waiting; the work still counts as done.
            let _ = tx.send(outcome);
        });

        self.enqueue(job)?;

        Ok(TaskHandle {
            pool: self.shared.settings.name.clone(),
            rx,
        })
    }

    fn enqueue(&self, job: Job) -> Result<(), PoolError> {
        let settings = &self.shared.settings;
        let mut state = self.shared.state.lock();

        if state.shutdown {
            return Err(PoolError::ShutDown {
                pool: settings.name.clone(),
            });
        }

        if state.workers.len() < settings.core_size {
            return self.spawn_worker(&mut state, Some(job));
        }

        // A parked worker takes the job straight away, even with a zero-capacity queue.
        if state.queue.len() < settings.queue_capacity || state.queue.len() < state.waiting {
            state.queue.push_back(job);
            // With no core workers, or after every worker timed out, nobody
            // would ever pick the job up.
            if state.workers.is_empty() {
                if let Err(e) = self.spawn_worker(&mut state, None) {
                    state.queue.pop_back();
                    return Err(e);
                }
                return Ok(());
            }
            drop(state);
            self.shared.available.notify_one();
            return Ok(());
        }

        if state.workers.len() < settings.max_size {
            return self.spawn_worker(&mut state, Some(job));
        }

        drop(state);
        counter!("pool_rejections_total", "pool" => settings.name.clone()).increment(1);
        tracing::warn!(
            pool = %settings.name,
            max = settings.max_size,
            queue = settings.queue_capacity,
            "Worker pool saturated, rejecting task"
        );
        Err(PoolError::Rejected {
            pool: settings.name.clone(),
            queue_capacity: settings.queue_capacity,
        })
    }

    /// Called with the state lock held so the worker count check and the
    /// slot insertion are one step.
    fn spawn_worker(&self, state: &mut PoolState, first_job: Option<Job>) -> Result<(), PoolError> {
        let id = self.shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let name = self
            .shared
            .settings
            .effective_prefix()
            .map(|prefix| format!("{prefix}{id}"));

        let mut builder = thread::Builder::new();
        if let Some(n) = &name {
            builder = builder.name(n.clone());
        }

        state.workers.insert(
            id,
            WorkerSlot {
                name: name.clone(),
                state: WorkerLifecycle::Starting,
            },
        );

        let shared = Arc::clone(&self.shared);
        if let Err(e) = builder.spawn(move || run_worker(shared, id, first_job)) {
            state.workers.remove(&id);
            return Err(PoolError::Spawn(e));
        }

        tracing::debug!(
            pool = %self.shared.settings.name,
            worker_id = id,
            worker = name.as_deref().unwrap_or(""),
            size = state.workers.len(),
            "Worker started"
        );
        Ok(())
    }

    /// Stop accepting work. Queued tasks still run; workers exit once the queue drains.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
        }
        self.shared.available.notify_all();
        tracing::info!(pool = %self.shared.settings.name, "Worker pool shutting down");
    }

    pub fn current_size(&self) -> usize {
        self.shared.state.lock().workers.len()
    }

    pub fn active_count(&self) -> usize {
        self.shared.active.load(Ordering::Acquire)
    }

    pub fn queued_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Workers currently waiting for a task.
    pub fn idle_count(&self) -> usize {
        self.shared.state.lock().waiting
    }

    pub fn completed_count(&self) -> u64 {
        self.shared.completed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("settings", &self.shared.settings)
            .field("current_size", &self.current_size())
            .field("active", &self.active_count())
            .finish()
    }
}

impl ObservablePool for WorkerPool {
    fn settings(&self) -> &PoolSettings {
        &self.shared.settings
    }

    fn counters(&self) -> Result<PoolCounters, PoolReadError> {
        Ok(PoolCounters {
            current_size: self.current_size(),
            active_workers: self.active_count(),
            queued_tasks: self.queued_count(),
            completed_tasks: self.completed_count(),
        })
    }

    fn tracked_workers(&self) -> Vec<ThreadState> {
        let state = self.shared.state.lock();
        state
            .workers
            .iter()
            .filter_map(|(id, slot)| {
                slot.name.as_ref().map(|name| ThreadState {
                    id: *id,
                    name: name.clone(),
                    state: slot.state,
                })
            })
            .collect()
    }
}

fn run_worker(shared: Arc<Shared>, id: u64, first_job: Option<Job>) {
    let mut next = first_job;

    while let Some(job) = next.take().or_else(|| shared.next_job(id)) {
        shared.set_state(id, WorkerLifecycle::Running);
        shared.active.fetch_add(1, Ordering::AcqRel);

        job();

        shared.active.fetch_sub(1, Ordering::AcqRel);
        shared.completed.fetch_add(1, Ordering::AcqRel);
    }

    tracing::debug!(pool = %shared.settings.name, worker_id = id, "Worker exited");
}

impl Shared {
    fn set_state(&self, id: u64, lifecycle: WorkerLifecycle) {
        if let Some(slot) = self.state.lock().workers.get_mut(&id) {
            slot.state = lifecycle;
        }
    }

    /// Block until a job is available. Returns `None` when the worker should
    /// exit, in which case its slot has already been removed.
    fn next_job(&self, id: u64) -> Option<Job> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.queue.pop_front() {
                return Some(job);
            }
            if state.shutdown {
                state.workers.remove(&id);
                return None;
            }
            if let Some(slot) = state.workers.get_mut(&id) {
                slot.state = WorkerLifecycle::Idle;
            }

            state.waiting += 1;
            let timed_out = if state.workers.len() > self.settings.core_size {
                self.available
                    .wait_for(&mut state, self.settings.keep_alive)
                    .timed_out()
            } else {
                self.available.wait(&mut state);
                false
            };
            state.waiting -= 1;

            if timed_out && state.queue.is_empty() && state.workers.len() > self.settings.core_size {
                state.workers.remove(&id);
                return None;
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Completion of a task submitted to a [`WorkerPool`].
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    pool: String,
    rx: oneshot::Receiver<Result<T, ()>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(()))) => Poll::Ready(Err(PoolError::TaskPanicked {
                pool: self.pool.clone(),
            })),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::Disconnected {
                pool: self.pool.clone(),
            })),
        }
    }
}
