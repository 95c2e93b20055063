//! Error types for the frequency index.

use thiserror::Error;

/// Fatal failure of [`FrequencyIndex::record`](crate::FrequencyIndex::record)
/// or of index construction.
///
/// Either variant leaves the index consistent (no entry is half-linked), but
/// callers are expected to discard it: a run that hit one of these has no
/// trustworthy result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("failed to allocate {what}")]
    AllocationFailure { what: &'static str },
    #[error("slot table capacity overflow (requested more than {requested} slots)")]
    CapacityOverflow { requested: usize },
}

/// A violated structural invariant, reported by
/// [`FrequencyIndex::check_invariants`](crate::FrequencyIndex::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violated: {0}")]
pub struct InvariantError(String);

impl InvariantError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
