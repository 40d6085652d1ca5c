//! DryRunCleanup - 何も実行しない cleanup
//!
//! Logs the command that would run and reports success, so a dry run walks
//! the whole pipeline without touching real resources.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ResourceName;
use crate::error::CleanupError;
use crate::ports::CleanupExecutor;

#[derive(Debug, Clone, Default)]
pub struct DryRunCleanup;

impl DryRunCleanup {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CleanupExecutor for DryRunCleanup {
    async fn clean(&self, name: &ResourceName) -> Result<(), CleanupError> {
        info!(resource = %name, "dry run: skipping cleanup");
        Ok(())
    }
}
