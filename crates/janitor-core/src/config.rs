//! Janitor configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is a valid
//! config. Durations use humantime syntax (`30s`, `1m`, `1h`).
//!
//! ```toml
//! pool_size = 10
//! buffer_size = 1
//! cycle_interval = "1m"
//! resource_type = "project"
//!
//! [timeouts]
//! acquire = "30s"
//! cleanup = "1h"
//! release = "30s"
//!
//! [backoff]
//! base_delay = "1m"
//! multiplier = 2.0
//! max_delay = "10m"
//!
//! [lease]
//! url = "http://boskos"
//! owner = "Janitor"
//!
//! [cleanup]
//! program = "../../jenkins/janitor.py"
//! hour = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{BackoffPolicy, WorkerSettings};
use crate::domain::ResourceType;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JanitorConfig {
    /// Number of workers (concurrent cleanups).
    pub pool_size: usize,

    /// Channel capacity: acquired resources waiting for a worker.
    pub buffer_size: usize,

    /// Pause between healthy cycles.
    #[serde(with = "humantime_serde")]
    pub cycle_interval: Duration,

    pub resource_type: ResourceType,

    pub timeouts: Timeouts,

    /// Pause after faulted cycles.
    pub backoff: BackoffPolicy,

    pub lease: LeaseSettings,

    pub cleanup: CleanupSettings,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            buffer_size: 1,
            cycle_interval: Duration::from_secs(60),
            resource_type: ResourceType::default(),
            timeouts: Timeouts::default(),
            backoff: BackoffPolicy::default(),
            lease: LeaseSettings::default(),
            cleanup: CleanupSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub acquire: Duration,
    #[serde(with = "humantime_serde")]
    pub cleanup: Duration,
    #[serde(with = "humantime_serde")]
    pub release: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            acquire: Duration::from_secs(30),
            cleanup: Duration::from_secs(60 * 60),
            release: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeaseSettings {
    pub url: String,
    pub owner: String,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self {
            url: "http://boskos".to_string(),
            owner: "Janitor".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanupSettings {
    pub program: PathBuf,
    /// Placed before `--project=<name> --hour=<hour>`.
    pub args: Vec<String>,
    pub hour: u32,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("../../jenkins/janitor.py"),
            args: Vec::new(),
            hour: 0,
        }
    }
}

impl JanitorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject configs the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be positive".into()));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be positive".into()));
        }
        if self.resource_type.as_str().is_empty() {
            return Err(ConfigError::Invalid("resource_type must not be empty".into()));
        }
        for (name, t) in [
            ("timeouts.acquire", self.timeouts.acquire),
            ("timeouts.cleanup", self.timeouts.cleanup),
            ("timeouts.release", self.timeouts.release),
        ] {
            if t.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        if self.backoff.multiplier.is_nan() || self.backoff.multiplier < 1.0 {
            return Err(ConfigError::Invalid("backoff.multiplier must be >= 1".into()));
        }
        if self.backoff.max_delay < self.backoff.base_delay {
            return Err(ConfigError::Invalid(
                "backoff.max_delay must not be shorter than backoff.base_delay".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.backoff.jitter) {
            return Err(ConfigError::Invalid("backoff.jitter must be in [0, 1)".into()));
        }
        if self.lease.owner.is_empty() {
            return Err(ConfigError::Invalid("lease.owner must not be empty".into()));
        }
        Ok(())
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            cleanup_timeout: self.timeouts.cleanup,
            release_timeout: self.timeouts.release,
        }
    }
}
