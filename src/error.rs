//! Domain error surfaced as the terminal state of streams and drains.

use thiserror::Error;

/// Failure of a blocking repository call.
///
/// This is the only domain error kind: a failed `read_all` terminates the
/// wrapped stream with it, a failed `save` resolves the drain's completion
/// signal to it. The core never swallows, retries or remaps it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("blocking call failed: {0}")]
pub struct IoFailure(String);

impl IoFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
