//! Sink drain adapter: persists a stream through a blocking "save" call.

use crate::error::IoFailure;
use crate::repository::BlockingSink;
use crate::scheduler::ExecutionContext;
use futures::{Stream, StreamExt};
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, trace};
use uuid::Uuid;

const SINK_DRAIN_TAG: &str = "SinkDrain:";
const SINK_DRAIN_FN_DRAIN_TAG: &str = "drain_to_blocking_sink():";

/// Drains `stream` into a blocking sink, one element at a time, on `pool`.
///
/// Each element is handed to `save` on a pool worker; the next element is
/// not requested from the stream until the current save has returned, which
/// makes the drain itself the backpressure point. The returned future
/// resolves `Ok(())` only after the stream completed and every save
/// succeeded. The first failing save stops consumption and becomes the
/// result; a stream error propagates the same way, without attempting
/// further saves. Dropping the future cancels the drain: the in-flight save
/// finishes on its worker but no more elements are requested.
pub async fn drain_to_blocking_sink<St, S>(
    stream: St,
    sink: Arc<S>,
    pool: &ExecutionContext,
) -> Result<(), IoFailure>
where
    St: Stream<Item = Result<S::Item, IoFailure>>,
    S: BlockingSink + 'static,
{
    let drain = Uuid::new_v4().as_hyphenated().to_string();
    debug!(
        "{}:{} drain {} started on '{}'",
        SINK_DRAIN_TAG,
        SINK_DRAIN_FN_DRAIN_TAG,
        drain,
        pool.name()
    );

    let mut stream = pin!(stream);
    let mut persisted: usize = 0;

    while let Some(next) = stream.next().await {
        let record = next?;

        let (done_sender, done_receiver) = oneshot::channel();
        let task_sink = Arc::clone(&sink);
        pool.schedule(move || {
            let _ = done_sender.send(task_sink.save(record));
        });

        match done_receiver.await {
            Ok(saved) => saved?,
            // The pool dropped the task without running it; surface that as
            // the drain's failure rather than completing a short count.
            Err(_) => {
                return Err(IoFailure::new(format!(
                    "persist task abandoned after {persisted} saved"
                )))
            }
        }
        persisted += 1;
        trace!(
            "{}:{} drain {} persisted element {}",
            SINK_DRAIN_TAG,
            SINK_DRAIN_FN_DRAIN_TAG,
            drain,
            persisted
        );
    }

    debug!(
        "{}:{} drain {} complete after {} elements",
        SINK_DRAIN_TAG, SINK_DRAIN_FN_DRAIN_TAG, drain, persisted
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::drain_to_blocking_sink;
    use crate::error::IoFailure;
    use crate::record::Record;
    use crate::repository::BlockingSink;
    use crate::scheduler::ExecutionContext;
    use futures::{stream, StreamExt};
    use std::sync::{Arc, Mutex};
    use std::thread::ThreadId;
    use std::time::Duration;

    struct RecordingSink {
        saved: Mutex<Vec<Record>>,
        save_threads: Mutex<Vec<ThreadId>>,
        fail_on_id: Option<String>,
    }

    impl RecordingSink {
        fn accepting() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                save_threads: Mutex::new(Vec::new()),
                fail_on_id: None,
            }
        }

        fn failing_on(id: &str) -> Self {
            Self {
                fail_on_id: Some(id.to_string()),
                ..Self::accepting()
            }
        }

        fn saved(&self) -> Vec<Record> {
            self.saved.lock().expect("saved lock").clone()
        }

        fn save_call_count(&self) -> usize {
            self.save_threads.lock().expect("threads lock").len()
        }
    }

    impl BlockingSink for RecordingSink {
        type Item = Record;

        fn save(&self, record: Record) -> Result<(), IoFailure> {
            self.save_threads
                .lock()
                .expect("threads lock")
                .push(std::thread::current().id());
            if self.fail_on_id.as_deref() == Some(record.id()) {
                return Err(IoFailure::new(format!("disk full saving {}", record.id())));
            }
            self.saved.lock().expect("saved lock").push(record);
            Ok(())
        }
    }

    fn ok_stream(records: Vec<Record>) -> impl futures::Stream<Item = Result<Record, IoFailure>> {
        stream::iter(records.into_iter().map(Ok))
    }

    fn three_records() -> Vec<Record> {
        vec![
            Record::new("u1", "A", "a"),
            Record::new("u2", "B", "b"),
            Record::new("u3", "C", "c"),
        ]
    }

    #[tokio::test]
    async fn persists_every_element_in_stream_order() {
        let pool = ExecutionContext::bounded("drain-order", 2);
        let sink = Arc::new(RecordingSink::accepting());

        drain_to_blocking_sink(ok_stream(three_records()), sink.clone(), &pool)
            .await
            .expect("drain completes");

        assert_eq!(sink.saved(), three_records());
        assert_eq!(sink.save_call_count(), 3);
    }

    #[tokio::test]
    async fn empty_stream_completes_without_saves() {
        let pool = ExecutionContext::bounded("drain-empty", 1);
        let sink = Arc::new(RecordingSink::accepting());

        drain_to_blocking_sink(ok_stream(Vec::new()), sink.clone(), &pool)
            .await
            .expect("drain completes");

        assert_eq!(sink.save_call_count(), 0);
    }

    #[tokio::test]
    async fn failing_save_stops_consumption_and_carries_failure() {
        let pool = ExecutionContext::bounded("drain-fail", 1);
        let sink = Arc::new(RecordingSink::failing_on("u2"));

        let result = drain_to_blocking_sink(ok_stream(three_records()), sink.clone(), &pool).await;

        assert_eq!(result, Err(IoFailure::new("disk full saving u2")));
        // u1 and u2 were attempted, u3 never was.
        assert_eq!(sink.save_call_count(), 2);
        assert_eq!(sink.saved(), vec![Record::new("u1", "A", "a")]);
    }

    #[tokio::test]
    async fn stream_error_propagates_without_further_saves() {
        let pool = ExecutionContext::bounded("drain-upstream", 1);
        let sink = Arc::new(RecordingSink::accepting());
        let failure = IoFailure::new("source went away");

        let upstream = stream::iter(vec![
            Ok(Record::new("u1", "A", "a")),
            Err(failure.clone()),
            Ok(Record::new("u3", "C", "c")),
        ]);

        let result = drain_to_blocking_sink(upstream, sink.clone(), &pool).await;

        assert_eq!(result, Err(failure));
        assert_eq!(sink.saved(), vec![Record::new("u1", "A", "a")]);
        assert_eq!(sink.save_call_count(), 1);
    }

    #[tokio::test]
    async fn drain_completes_over_elastic_pool_with_short_idle_timeout() {
        // The one-in-flight drain pattern leaves the pool idle between
        // elements; with gaps longer than the idle timeout each save lands
        // right at the worker-reclaim boundary and must still run, or the
        // completion signal would never resolve.
        let pool = ExecutionContext::elastic("drain-elastic", Duration::from_millis(2));
        let sink = Arc::new(RecordingSink::accepting());

        let upstream = stream::iter(three_records().into_iter().map(Ok)).then(|next| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            next
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            drain_to_blocking_sink(upstream, sink.clone(), &pool),
        )
        .await
        .expect("drain resolved");

        assert_eq!(result, Ok(()));
        assert_eq!(sink.saved(), three_records());
    }

    #[tokio::test]
    async fn saves_run_off_the_producing_thread() {
        let pool = ExecutionContext::bounded("drain-isolation", 1);
        let sink = Arc::new(RecordingSink::accepting());
        let caller = std::thread::current().id();

        drain_to_blocking_sink(ok_stream(three_records()), sink.clone(), &pool)
            .await
            .expect("drain completes");

        let save_threads = sink.save_threads.lock().expect("threads lock").clone();
        assert_eq!(save_threads.len(), 3);
        assert!(save_threads.iter().all(|id| *id != caller));
    }
}
