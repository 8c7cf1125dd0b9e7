//! Named execution contexts: bounded and elastic worker pools.

use crate::scheduler::worker::{
    elastic_task_loop, fixed_task_loop, spawn_worker_thread, ElasticRoster, Task, TaskQueue,
};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const EXECUTION_CONTEXT_TAG: &str = "ExecutionContext:";
const EXECUTION_CONTEXT_FN_BOUNDED_TAG: &str = "bounded():";
const EXECUTION_CONTEXT_FN_ELASTIC_TAG: &str = "elastic():";
const EXECUTION_CONTEXT_FN_SCHEDULE_TAG: &str = "schedule():";

/// Ceiling multiplier for elastic pools, applied to available parallelism.
const ELASTIC_CEILING_PER_CORE: usize = 10;

enum ContextKind {
    Bounded {
        size: usize,
    },
    Elastic {
        idle_timeout: Duration,
        ceiling: usize,
        roster: Arc<ElasticRoster>,
    },
}

struct ContextInner {
    name: String,
    task_sender: UnboundedSender<Task>,
    // Held so elastic pools can hand the queue to late-spawned workers; also
    // keeps the receiver alive across windows where no worker exists.
    queue: TaskQueue,
    kind: ContextKind,
}

/// A named pool of worker threads that blocking tasks are scheduled onto.
///
/// Contexts are cheap to clone; all clones share one pool. Adapters borrow a
/// context and schedule work, never own or terminate it: dropping the last
/// handle closes the queue, after which workers drain outstanding tasks and
/// exit. Tasks move Queued -> Running -> Completed/Failed; the context never
/// retries a task.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl ExecutionContext {
    /// Creates a pool with a fixed number of workers. Tasks submitted beyond
    /// capacity queue FIFO until a worker frees. `size` is clamped to at
    /// least one worker.
    pub fn bounded(name: &str, size: usize) -> Self {
        let size = size.max(1);
        let (task_sender, task_receiver) = mpsc::unbounded_channel();
        let queue: TaskQueue = Arc::new(Mutex::new(task_receiver));

        debug!(
            "{}:{} creating bounded pool '{}' with {} workers",
            EXECUTION_CONTEXT_TAG, EXECUTION_CONTEXT_FN_BOUNDED_TAG, name, size
        );

        for _ in 0..size {
            let lane = Uuid::new_v4().as_hyphenated().to_string();
            let pool_name = name.to_string();
            let queue = queue.clone();
            spawn_worker_thread(format!("{name}-worker"), move || {
                fixed_task_loop(pool_name, lane, queue)
            });
        }

        Self {
            inner: Arc::new(ContextInner {
                name: name.to_string(),
                task_sender,
                queue,
                kind: ContextKind::Bounded { size },
            }),
        }
    }

    /// Creates a pool that starts with zero workers, grows by one worker per
    /// scheduled task while none is idle (up to a ceiling of ten times the
    /// available parallelism), and reclaims workers idle longer than
    /// `idle_timeout`.
    pub fn elastic(name: &str, idle_timeout: Duration) -> Self {
        let ceiling = std::thread::available_parallelism()
            .map(|cores| cores.get() * ELASTIC_CEILING_PER_CORE)
            .unwrap_or(ELASTIC_CEILING_PER_CORE)
            .max(1);
        let (task_sender, task_receiver) = mpsc::unbounded_channel();
        let queue: TaskQueue = Arc::new(Mutex::new(task_receiver));

        debug!(
            "{}:{} creating elastic pool '{}' with idle timeout {:?}, ceiling {}",
            EXECUTION_CONTEXT_TAG, EXECUTION_CONTEXT_FN_ELASTIC_TAG, name, idle_timeout, ceiling
        );

        Self {
            inner: Arc::new(ContextInner {
                name: name.to_string(),
                task_sender,
                queue,
                kind: ContextKind::Elastic {
                    idle_timeout,
                    ceiling,
                    roster: Arc::new(ElasticRoster::new()),
                },
            }),
        }
    }

    /// Submits a task for execution on this pool. Safe for concurrent
    /// callers; dispatch across the pool is FIFO in submission order.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.task_sender.send(Box::new(task)).is_err() {
            // Unreachable while the handle is alive; the receiver outlives us.
            warn!(
                "{}:{}:{} task dropped, pool queue is gone",
                self.inner.name, EXECUTION_CONTEXT_TAG, EXECUTION_CONTEXT_FN_SCHEDULE_TAG
            );
            return;
        }

        if let ContextKind::Elastic {
            idle_timeout,
            ceiling,
            roster,
        } = &self.inner.kind
        {
            self.grow_if_starved(*idle_timeout, *ceiling, roster);
        }
    }

    /// Current worker count: the fixed size for bounded pools, the live
    /// roster for elastic ones.
    pub fn worker_count(&self) -> usize {
        match &self.inner.kind {
            ContextKind::Bounded { size } => *size,
            ContextKind::Elastic { roster, .. } => roster.workers.load(Ordering::SeqCst),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    fn grow_if_starved(
        &self,
        idle_timeout: Duration,
        ceiling: usize,
        roster: &Arc<ElasticRoster>,
    ) {
        loop {
            if roster.idle.load(Ordering::SeqCst) > 0 {
                return;
            }

            let current = roster.workers.load(Ordering::SeqCst);
            if current >= ceiling {
                debug!(
                    "{}:{}:{} at ceiling {}, task stays queued",
                    self.inner.name,
                    EXECUTION_CONTEXT_TAG,
                    EXECUTION_CONTEXT_FN_SCHEDULE_TAG,
                    ceiling
                );
                return;
            }

            // A lost CAS means the roster moved underneath us. It may have
            // been a worker reclaiming itself rather than a concurrent
            // caller growing the pool, so re-read the roster instead of
            // assuming the queued task is covered.
            if roster
                .workers
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }

        let lane = Uuid::new_v4().as_hyphenated().to_string();
        let pool_name = self.inner.name.clone();
        let queue = self.inner.queue.clone();
        let roster = roster.clone();
        spawn_worker_thread(format!("{}-worker", self.inner.name), move || {
            elastic_task_loop(pool_name, lane, queue, idle_timeout, roster)
        });
    }
}

impl Debug for ExecutionContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("name", &self.inner.name)
            .field("workers", &self.worker_count())
            .finish_non_exhaustive()
    }
}
