//! Capability contracts implemented by blocking repository collaborators.

use crate::error::IoFailure;

/// Blocking enumeration capability.
///
/// `read_all` occupies the calling thread until the full ordered sequence is
/// produced or an error occurs. The contract is all-or-nothing: no partial
/// results. Implementations are shared across pool workers via `Arc`, hence
/// the `Send + Sync` supertraits; their own thread-safety beyond that is the
/// collaborator's responsibility.
pub trait BlockingSource: Send + Sync {
    type Item: Send + 'static;

    fn read_all(&self) -> Result<Vec<Self::Item>, IoFailure>;
}

/// Blocking persistence capability.
///
/// `save` occupies the calling thread until the item is durably accepted or
/// the call fails. No return value beyond success/failure.
pub trait BlockingSink: Send + Sync {
    type Item: Send + 'static;

    fn save(&self, item: Self::Item) -> Result<(), IoFailure>;
}
