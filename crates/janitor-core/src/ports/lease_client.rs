//! LeaseClient port - lease authority の抽象化
//!
//! The janitor only needs two operations from the authority. Both must be
//! atomic on the authority side: acquire hands a given resource to exactly
//! one caller, which is what keeps two workers off the same resource.

use async_trait::async_trait;

use crate::domain::{ResourceName, ResourceState, ResourceType};
use crate::error::LeaseError;

#[async_trait]
pub trait LeaseClient: Send + Sync {
    /// Move one resource of `rtype` from `from` to `to` and return its name.
    ///
    /// `Ok(None)` means nothing matched (exhaustion, not a fault).
    async fn acquire(
        &self,
        rtype: &ResourceType,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<Option<ResourceName>, LeaseError>;

    /// Move the named resource to `to`.
    async fn release(&self, name: &ResourceName, to: ResourceState) -> Result<(), LeaseError>;
}
