//! HttpLeaseClient - HTTP lease authority client
//!
//! Protocol (query-string parameters, empty request body):
//! - `POST /acquire?type=&state=&dest=&owner=` → 200 + resource JSON, 404 when
//!   nothing matches
//! - `POST /release?name=&dest=&owner=` → 200
//!
//! Only `name` is read from the acquire response. Once the authority answers
//! 200 the lease is committed, so the name must not be lost to a field the
//! janitor does not need.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{ResourceName, ResourceState, ResourceType};
use crate::error::LeaseError;
use crate::ports::LeaseClient;

/// The part of the acquire response the janitor relies on.
#[derive(Deserialize)]
struct Leased {
    name: ResourceName,
}

pub struct HttpLeaseClient {
    base_url: String,
    owner: String,
    http: reqwest::Client,
}

impl HttpLeaseClient {
    /// `timeout` bounds each request end to end.
    pub fn new(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LeaseError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            owner: owner.into(),
            http,
        })
    }

    async fn error_from(resp: reqwest::Response) -> LeaseError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        LeaseError::Status {
            status,
            body: body.trim().to_string(),
        }
    }
}

#[async_trait]
impl LeaseClient for HttpLeaseClient {
    async fn acquire(
        &self,
        rtype: &ResourceType,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<Option<ResourceName>, LeaseError> {
        let resp = self
            .http
            .post(format!("{}/acquire", self.base_url))
            .query(&[
                ("type", rtype.as_str()),
                ("state", from.as_str()),
                ("dest", to.as_str()),
                ("owner", self.owner.as_str()),
            ])
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let body = resp.bytes().await?;
                let leased: Leased = serde_json::from_slice(&body)?;
                debug!(resource = %leased.name, "acquired");
                Ok(Some(leased.name))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::error_from(resp).await),
        }
    }

    async fn release(&self, name: &ResourceName, to: ResourceState) -> Result<(), LeaseError> {
        let resp = self
            .http
            .post(format!("{}/release", self.base_url))
            .query(&[
                ("name", name.as_str()),
                ("dest", to.as_str()),
                ("owner", self.owner.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(Self::error_from(resp).await)
        }
    }
}
