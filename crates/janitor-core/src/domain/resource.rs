use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ResourceState;

/// Opaque resource name handed out by the lease authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Resource kind, e.g. `project`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    pub const PROJECT: &'static str = "project";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        Self::new(Self::PROJECT)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A resource as the lease authority records it.
///
/// Field names follow the authority's JSON (`type`, `lastupdate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: ResourceName,
    #[serde(rename = "type")]
    pub rtype: ResourceType,
    pub state: ResourceState,
    /// Empty when nobody holds the lease.
    #[serde(default)]
    pub owner: String,
    #[serde(rename = "lastupdate")]
    pub last_update: DateTime<Utc>,
}

impl Resource {
    pub fn new(name: impl Into<String>, rtype: ResourceType, state: ResourceState) -> Self {
        Self {
            name: ResourceName::new(name),
            rtype,
            state,
            owner: String::new(),
            last_update: Utc::now(),
        }
    }

    pub fn is_leased(&self) -> bool {
        !self.owner.is_empty()
    }
}

/// dispatcher → worker の“運搬用”データ。
///
/// Created when the dispatcher acquires a resource, consumed by the worker
/// that releases it. Not `Clone`, so each lease is released exactly once.
#[derive(Debug)]
pub struct LeaseTicket {
    name: ResourceName,
    cycle: u64,
}

impl LeaseTicket {
    pub fn new(name: ResourceName, cycle: u64) -> Self {
        Self { name, cycle }
    }

    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// Cycle the resource was acquired in.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn into_name(self) -> ResourceName {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_authority_json() {
        let json = r#"{
            "name": "proj-7",
            "type": "project",
            "state": "cleaning",
            "owner": "Janitor",
            "lastupdate": "2017-08-01T12:00:00Z"
        }"#;
        let res: Resource = serde_json::from_str(json).unwrap();

        assert_eq!(res.name.as_str(), "proj-7");
        assert_eq!(res.rtype, ResourceType::default());
        assert_eq!(res.state, ResourceState::Cleaning);
        assert!(res.is_leased());
    }

    #[test]
    fn missing_owner_means_unleased() {
        let json = r#"{"name":"p","type":"project","state":"dirty","lastupdate":"2017-08-01T12:00:00Z"}"#;
        let res: Resource = serde_json::from_str(json).unwrap();
        assert!(!res.is_leased());
    }

    #[test]
    fn unknown_state_is_rejected() {
        let json = r#"{"name":"p","type":"project","state":"busy","lastupdate":"2017-08-01T12:00:00Z"}"#;
        assert!(serde_json::from_str::<Resource>(json).is_err());
    }
}
