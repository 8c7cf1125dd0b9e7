//! Deferred source adapter: a cold stream over a blocking "read all" call.

use crate::error::IoFailure;
use crate::repository::BlockingSource;
use crate::scheduler::ExecutionContext;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, trace};
use uuid::Uuid;

const DEFERRED_READ_ALL_TAG: &str = "DeferredReadAll:";
const DEFERRED_READ_ALL_FN_SUBSCRIBE_TAG: &str = "subscribe():";

/// Wraps a blocking source so its `read_all` runs on `pool`, deferred until
/// the returned stream is first polled.
///
/// The stream is cold and single-subscription: constructing it performs no
/// work, and every call to `wrap_blocking_source` issues its own independent
/// blocking read once observed. Records are emitted in the order the read
/// produced them, followed by completion; a failed read terminates the
/// stream with exactly one error and no preceding records.
pub fn wrap_blocking_source<S>(source: Arc<S>, pool: &ExecutionContext) -> DeferredReadAll<S>
where
    S: BlockingSource + 'static,
{
    DeferredReadAll {
        state: SubscriptionState::Unpolled {
            source,
            pool: pool.clone(),
        },
    }
}

enum SubscriptionState<S: BlockingSource> {
    Unpolled {
        source: Arc<S>,
        pool: ExecutionContext,
    },
    Draining {
        receiver: UnboundedReceiver<Result<S::Item, IoFailure>>,
    },
    Terminated,
}

/// Cold stream over one subscription to a wrapped [`BlockingSource`].
///
/// See [`wrap_blocking_source`].
pub struct DeferredReadAll<S: BlockingSource> {
    state: SubscriptionState<S>,
}

impl<S> DeferredReadAll<S>
where
    S: BlockingSource + 'static,
{
    /// Schedules the blocking read as a single pool task. One task slot per
    /// subscription; if the subscriber goes away mid-emission the read still
    /// runs to completion on its worker and the remainder is discarded.
    fn subscribe(
        source: Arc<S>,
        pool: &ExecutionContext,
    ) -> UnboundedReceiver<Result<S::Item, IoFailure>> {
        let (record_sender, record_receiver) = mpsc::unbounded_channel();
        let subscription = Uuid::new_v4().as_hyphenated().to_string();

        debug!(
            "{}:{} subscription {} scheduling blocking read on '{}'",
            DEFERRED_READ_ALL_TAG,
            DEFERRED_READ_ALL_FN_SUBSCRIBE_TAG,
            subscription,
            pool.name()
        );

        pool.schedule(move || match source.read_all() {
            Ok(records) => {
                for record in records {
                    if record_sender.send(Ok(record)).is_err() {
                        trace!(
                            "{}:{} subscription {} subscriber gone, discarding rest",
                            DEFERRED_READ_ALL_TAG,
                            DEFERRED_READ_ALL_FN_SUBSCRIBE_TAG,
                            subscription
                        );
                        return;
                    }
                }
            }
            Err(failure) => {
                let _ = record_sender.send(Err(failure));
            }
        });

        record_receiver
    }
}

impl<S> Stream for DeferredReadAll<S>
where
    S: BlockingSource + 'static,
{
    type Item = Result<S::Item, IoFailure>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                SubscriptionState::Unpolled { .. } => {
                    let SubscriptionState::Unpolled { source, pool } =
                        std::mem::replace(&mut this.state, SubscriptionState::Terminated)
                    else {
                        unreachable!("state checked above");
                    };
                    let receiver = Self::subscribe(source, &pool);
                    this.state = SubscriptionState::Draining { receiver };
                }
                SubscriptionState::Draining { receiver } => {
                    return match receiver.poll_recv(cx) {
                        Poll::Ready(Some(Ok(record))) => Poll::Ready(Some(Ok(record))),
                        Poll::Ready(Some(Err(failure))) => {
                            this.state = SubscriptionState::Terminated;
                            Poll::Ready(Some(Err(failure)))
                        }
                        Poll::Ready(None) => {
                            this.state = SubscriptionState::Terminated;
                            Poll::Ready(None)
                        }
                        Poll::Pending => Poll::Pending,
                    };
                }
                SubscriptionState::Terminated => return Poll::Ready(None),
            }
        }
    }
}
