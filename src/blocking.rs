//! Async-to-blocking conversion helpers for imperative call sites.
//!
//! These are trivial leaf utilities, intended for test harnesses and code
//! that has not migrated to async yet. They park the calling thread, so they
//! must never be used from inside an async task or a pool worker.

use futures::executor::block_on;
use futures::{Future, Stream, StreamExt};

/// Blocks the calling thread until `future` resolves and returns its output.
pub fn block_for_value<F: Future>(future: F) -> F::Output {
    block_on(future)
}

/// Blocks the calling thread until `stream` completes, collecting every
/// element in emission order.
pub fn block_for_all<St: Stream>(stream: St) -> Vec<St::Item> {
    block_on(stream.collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::{block_for_all, block_for_value};
    use crate::record::Record;
    use futures::stream;

    #[test]
    fn block_for_value_returns_future_output() {
        let record = block_for_value(async { Record::new("u1", "A", "a") });
        assert_eq!(record, Record::new("u1", "A", "a"));
    }

    #[test]
    fn block_for_all_collects_in_emission_order() {
        let records = vec![Record::new("u1", "A", "a"), Record::new("u2", "B", "b")];
        let collected = block_for_all(stream::iter(records.clone()));
        assert_eq!(collected, records);
    }
}
