//! CleanupExecutor port - cleanup 処理の抽象化

use async_trait::async_trait;

use crate::domain::ResourceName;
use crate::error::CleanupError;

/// Runs the cleanup operation for one resource.
///
/// Must be idempotent: a failed resource returns to dirty and gets cleaned
/// again in a later cycle. Implementations should stop their work when the
/// returned future is dropped, since the worker drops it on timeout.
#[async_trait]
pub trait CleanupExecutor: Send + Sync {
    async fn clean(&self, name: &ResourceName) -> Result<(), CleanupError>;
}
