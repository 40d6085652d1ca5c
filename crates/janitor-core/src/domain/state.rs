//! Resource state machine as seen by the janitor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource state (closed set shared with the lease authority).
///
/// State transitions driven by the janitor:
/// - Dirty -> Cleaning (acquire)
/// - Cleaning -> Free (cleanup succeeded, release)
/// - Cleaning -> Dirty (cleanup failed, release)
///
/// `Cleaning` is only ever an acquire destination. It is never a release
/// target, so a resource cannot be parked there by the janitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// Returned by a user, waiting for cleanup.
    Dirty,

    /// Leased by the janitor, cleanup in progress.
    Cleaning,

    /// Clean and available to users.
    Free,
}

impl ResourceState {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceState::Dirty => "dirty",
            ResourceState::Cleaning => "cleaning",
            ResourceState::Free => "free",
        }
    }

    /// Can a worker release a resource into this state?
    pub fn is_release_target(self) -> bool {
        matches!(self, ResourceState::Free | ResourceState::Dirty)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
