//! InMemoryLeaseAuthority - 開発・テスト用の lease authority
//!
//! Same contract as the HTTP authority: acquire picks the first unowned
//! resource of the requested type and state, release is only accepted from
//! the owner that acquired.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{Resource, ResourceName, ResourceState, ResourceType};
use crate::error::LeaseError;
use crate::observability::StateCounts;
use crate::ports::LeaseClient;

/// In-memory resource table.
///
/// The `Vec` keeps insertion order so acquire order is deterministic.
#[derive(Clone, Default)]
pub struct InMemoryLeaseAuthority {
    resources: Arc<Mutex<Vec<Resource>>>,
}

impl InMemoryLeaseAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self {
            resources: Arc::new(Mutex::new(resources.into_iter().collect())),
        }
    }

    /// Seed `names` as dirty resources of `rtype`.
    pub fn with_dirty<I, S>(rtype: &ResourceType, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_resources(
            names
                .into_iter()
                .map(|n| Resource::new(n, rtype.clone(), ResourceState::Dirty)),
        )
    }

    pub async fn add(&self, resource: Resource) {
        self.resources.lock().await.push(resource);
    }

    /// A client that acquires and releases as `owner`.
    pub fn client(&self, owner: impl Into<String>) -> InMemoryLeaseClient {
        InMemoryLeaseClient {
            authority: self.clone(),
            owner: owner.into(),
        }
    }

    pub async fn get(&self, name: &ResourceName) -> Option<Resource> {
        let resources = self.resources.lock().await;
        resources.iter().find(|r| &r.name == name).cloned()
    }

    pub async fn counts_by_state(&self) -> StateCounts {
        let resources = self.resources.lock().await;
        let mut counts = StateCounts::default();
        for r in resources.iter() {
            match r.state {
                ResourceState::Dirty => counts.dirty += 1,
                ResourceState::Cleaning => counts.cleaning += 1,
                ResourceState::Free => counts.free += 1,
            }
        }
        counts
    }

    async fn acquire_as(
        &self,
        owner: &str,
        rtype: &ResourceType,
        from: ResourceState,
        to: ResourceState,
    ) -> Option<ResourceName> {
        let mut resources = self.resources.lock().await;
        let res = resources
            .iter_mut()
            .find(|r| &r.rtype == rtype && r.state == from && !r.is_leased())?;
        res.state = to;
        res.owner = owner.to_string();
        res.last_update = Utc::now();
        Some(res.name.clone())
    }

    async fn release_as(
        &self,
        owner: &str,
        name: &ResourceName,
        to: ResourceState,
    ) -> Result<(), LeaseError> {
        let mut resources = self.resources.lock().await;
        let Some(res) = resources.iter_mut().find(|r| &r.name == name) else {
            return Err(LeaseError::UnknownResource(name.clone()));
        };
        if res.owner != owner {
            return Err(LeaseError::OwnerMismatch {
                name: name.clone(),
                expected: owner.to_string(),
                actual: res.is_leased().then(|| res.owner.clone()),
            });
        }
        res.state = to;
        res.owner.clear();
        res.last_update = Utc::now();
        Ok(())
    }
}

/// [`LeaseClient`] bound to one owner of an [`InMemoryLeaseAuthority`].
#[derive(Clone)]
pub struct InMemoryLeaseClient {
    authority: InMemoryLeaseAuthority,
    owner: String,
}

#[async_trait]
impl LeaseClient for InMemoryLeaseClient {
    async fn acquire(
        &self,
        rtype: &ResourceType,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<Option<ResourceName>, LeaseError> {
        Ok(self.authority.acquire_as(&self.owner, rtype, from, to).await)
    }

    async fn release(&self, name: &ResourceName, to: ResourceState) -> Result<(), LeaseError> {
        self.authority.release_as(&self.owner, name, to).await
    }
}
