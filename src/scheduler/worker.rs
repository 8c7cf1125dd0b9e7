//! Runtime helpers for spawning pool worker threads and their task loops.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::Builder;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tracing::{debug, trace};

const POOL_WORKER_TAG: &str = "PoolWorker:";
const POOL_WORKER_FN_TASK_LOOP_TAG: &str = "task_loop():";

pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// Shared FIFO queue of pending tasks.
///
/// The receiver sits behind an async `Mutex`: exactly one worker at a time
/// waits on `recv`, which keeps hand-off strictly FIFO across workers. The
/// lock is released before the task runs, so other workers pick up queued
/// tasks while this one is busy.
pub(crate) type TaskQueue = Arc<Mutex<UnboundedReceiver<Task>>>;

/// Occupancy counters for an elastic pool's worker roster.
pub(crate) struct ElasticRoster {
    pub(crate) idle: AtomicUsize,
    pub(crate) workers: AtomicUsize,
}

impl ElasticRoster {
    pub(crate) fn new() -> Self {
        Self {
            idle: AtomicUsize::new(0),
            workers: AtomicUsize::new(0),
        }
    }
}

/// Spawns a dedicated worker thread that drives `run_loop` to completion on
/// a current-thread tokio runtime. Worker threads are detached; they exit
/// when their loop breaks.
pub(crate) fn spawn_worker_thread<F, Fut>(thread_name: String, run_loop: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    thread::Builder::new()
        .name(thread_name)
        .spawn(move || {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create Tokio runtime");

            runtime.block_on(run_loop());
        })
        .expect("Failed to spawn pool worker thread");
}

/// Task loop for a bounded pool worker: lives until the owning context is
/// dropped and the queue drains.
pub(crate) async fn fixed_task_loop(pool_name: String, lane: String, queue: TaskQueue) {
    trace!(
        "{}:{}:{} worker {} up",
        pool_name,
        POOL_WORKER_TAG,
        POOL_WORKER_FN_TASK_LOOP_TAG,
        lane
    );

    loop {
        let next = { queue.lock().await.recv().await };
        let Some(task) = next else {
            break;
        };
        trace!(
            "{}:{}:{} worker {} running task",
            pool_name,
            POOL_WORKER_TAG,
            POOL_WORKER_FN_TASK_LOOP_TAG,
            lane
        );
        task();
    }

    debug!(
        "{}:{}:{} worker {} queue closed, exiting",
        pool_name, POOL_WORKER_TAG, POOL_WORKER_FN_TASK_LOOP_TAG, lane
    );
}

/// Task loop for an elastic pool worker: exits once it has sat idle longer
/// than `idle_timeout`, handing its roster slot back.
pub(crate) async fn elastic_task_loop(
    pool_name: String,
    lane: String,
    queue: TaskQueue,
    idle_timeout: Duration,
    roster: Arc<ElasticRoster>,
) {
    trace!(
        "{}:{}:{} worker {} up",
        pool_name,
        POOL_WORKER_TAG,
        POOL_WORKER_FN_TASK_LOOP_TAG,
        lane
    );

    loop {
        roster.idle.fetch_add(1, Ordering::SeqCst);
        let waited =
            tokio::time::timeout(idle_timeout, async { queue.lock().await.recv().await }).await;
        roster.idle.fetch_sub(1, Ordering::SeqCst);

        match waited {
            Ok(Some(task)) => {
                trace!(
                    "{}:{}:{} worker {} running task",
                    pool_name,
                    POOL_WORKER_TAG,
                    POOL_WORKER_FN_TASK_LOOP_TAG,
                    lane
                );
                task();
            }
            Ok(None) => {
                debug!(
                    "{}:{}:{} worker {} queue closed, exiting",
                    pool_name, POOL_WORKER_TAG, POOL_WORKER_FN_TASK_LOOP_TAG, lane
                );
                roster.workers.fetch_sub(1, Ordering::SeqCst);
                return;
            }
            Err(_) => {
                // A task may have been queued against this worker's idle slot
                // in the window between the timeout elapsing and the idle
                // decrement above. Hand the roster slot back first, then take
                // a parting look at the queue: any task found here is run on
                // this worker, and any task sent after the look lands on a
                // roster whose worker count already reads zero.
                roster.workers.fetch_sub(1, Ordering::SeqCst);
                if let Some(task) = steal_parked_task(&queue) {
                    roster.workers.fetch_add(1, Ordering::SeqCst);
                    trace!(
                        "{}:{}:{} worker {} picked up task parked at the reclaim boundary",
                        pool_name,
                        POOL_WORKER_TAG,
                        POOL_WORKER_FN_TASK_LOOP_TAG,
                        lane
                    );
                    task();
                    continue;
                }
                debug!(
                    "{}:{}:{} worker {} idle past {:?}, reclaiming",
                    pool_name, POOL_WORKER_TAG, POOL_WORKER_FN_TASK_LOOP_TAG, lane, idle_timeout
                );
                return;
            }
        }
    }
}

/// Non-blocking queue check for a worker on its way out. A failed `try_lock`
/// means another live worker holds the queue and will see the task itself.
fn steal_parked_task(queue: &TaskQueue) -> Option<Task> {
    let mut parked = queue.try_lock().ok()?;
    parked.try_recv().ok()
}
