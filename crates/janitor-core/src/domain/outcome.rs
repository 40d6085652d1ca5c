//! Cleanup outcome and the release target it maps to.

use super::ResourceState;

/// Result of running cleanup on one resource.
///
/// The worker does not retry; the outcome only decides which state the
/// resource is released into. A failed resource goes back to `dirty` and
/// is picked up again by a later cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    Cleaned,
    Failed(String),
}

impl CleanOutcome {
    pub fn is_cleaned(&self) -> bool {
        matches!(self, CleanOutcome::Cleaned)
    }

    /// State the resource is released into.
    pub fn release_target(&self) -> ResourceState {
        match self {
            CleanOutcome::Cleaned => ResourceState::Free,
            CleanOutcome::Failed(_) => ResourceState::Dirty,
        }
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for CleanOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => CleanOutcome::Cleaned,
            Err(e) => CleanOutcome::Failed(e.to_string()),
        }
    }
}
