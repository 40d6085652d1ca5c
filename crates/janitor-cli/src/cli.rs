//! Command-line flags. Flags override values from the config file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use janitor_core::config::JanitorConfig;
use janitor_core::error::ConfigError;

#[derive(Debug, Parser)]
#[command(name = "janitor", about = "Cleans dirty leased resources and returns them to the pool")]
pub struct Args {
    /// TOML config file.
    #[arg(long, env = "JANITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Lease authority base URL.
    #[arg(long, env = "BOSKOS_URL")]
    pub boskos_url: Option<String>,

    /// Owner name presented to the lease authority.
    #[arg(long)]
    pub owner: Option<String>,

    /// Number of concurrent cleanups.
    #[arg(long)]
    pub pool_size: Option<usize>,

    /// Acquired resources allowed to wait for a worker.
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Pause between cycles, e.g. `1m`.
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Cleanup program, run as `<program> --project=<name> --hour=<hour>`.
    #[arg(long)]
    pub janitor_path: Option<PathBuf>,

    #[arg(long)]
    pub hour: Option<u32>,

    /// Run one cycle, wait for it to drain, print stats and exit.
    #[arg(long)]
    pub once: bool,

    /// Use an in-memory authority seeded with these dirty resources instead
    /// of the HTTP one, and skip the cleanup program. Implies `--once`.
    #[arg(long, value_delimiter = ',')]
    pub dry_run: Option<Vec<String>>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    pub fn run_once(&self) -> bool {
        self.once || self.dry_run.is_some()
    }

    /// Config file (or defaults) with flag overrides applied, validated.
    pub fn resolve_config(&self) -> Result<JanitorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => JanitorConfig::load(path)?,
            None => JanitorConfig::default(),
        };

        if let Some(url) = &self.boskos_url {
            config.lease.url = url.clone();
        }
        if let Some(owner) = &self.owner {
            config.lease.owner = owner.clone();
        }
        if let Some(n) = self.pool_size {
            config.pool_size = n;
        }
        if let Some(n) = self.buffer_size {
            config.buffer_size = n;
        }
        if let Some(interval) = self.interval {
            config.cycle_interval = interval;
        }
        if let Some(path) = &self.janitor_path {
            config.cleanup.program = path.clone();
        }
        if let Some(hour) = self.hour {
            config.cleanup.hour = hour;
        }

        config.validate()?;
        Ok(config)
    }
}
