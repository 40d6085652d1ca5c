//! Janitor - パイプライン全体の組み立て
//!
//! channel (capacity = buffer_size), WorkerPool (pool_size workers) and
//! CycleScheduler are wired from one [`JanitorConfig`]. Sizes are passed in,
//! never global, so independent pipelines can run side by side.
//!
//! Must be started from inside a tokio runtime.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{CycleScheduler, Dispatcher, WorkerPool};
use crate::config::JanitorConfig;
use crate::domain::{CycleReport, LeaseTicket};
use crate::error::ConfigError;
use crate::observability::{JanitorStats, StatsSnapshot};
use crate::ports::{CleanupExecutor, LeaseClient};

/// Running janitor handle.
/// - `request_shutdown()` で新しい acquire を止める
/// - `shutdown_and_join()` で scheduler と全 worker の終了を待つ
pub struct Janitor {
    shutdown_tx: watch::Sender<bool>,
    scheduler: JoinHandle<()>,
    pool: WorkerPool,
    stats: Arc<JanitorStats>,
}

struct Wiring {
    scheduler: CycleScheduler,
    tx: mpsc::Sender<LeaseTicket>,
    pool: WorkerPool,
    stats: Arc<JanitorStats>,
}

fn wire(
    config: &JanitorConfig,
    lease: Arc<dyn LeaseClient>,
    cleanup: Arc<dyn CleanupExecutor>,
) -> Result<Wiring, ConfigError> {
    config.validate()?;

    let stats = Arc::new(JanitorStats::new());
    let (tx, rx) = mpsc::channel(config.buffer_size);
    let pool = WorkerPool::spawn(
        config.pool_size,
        rx,
        Arc::clone(&lease),
        cleanup,
        config.worker_settings(),
        Arc::clone(&stats),
    );
    let dispatcher = Dispatcher::new(
        lease,
        config.resource_type.clone(),
        config.timeouts.acquire,
        config.timeouts.release,
        Arc::clone(&stats),
    );
    let scheduler = CycleScheduler::new(
        dispatcher,
        config.cycle_interval,
        config.backoff.clone(),
        Arc::clone(&stats),
    );

    Ok(Wiring {
        scheduler,
        tx,
        pool,
        stats,
    })
}

impl Janitor {
    /// Spawn the worker pool and the cycle scheduler. The first cycle starts
    /// immediately.
    pub fn start(
        config: &JanitorConfig,
        lease: Arc<dyn LeaseClient>,
        cleanup: Arc<dyn CleanupExecutor>,
    ) -> Result<Self, ConfigError> {
        let Wiring {
            scheduler,
            tx,
            pool,
            stats,
        } = wire(config, lease, cleanup)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            pool_size = config.pool_size,
            buffer_size = config.buffer_size,
            rtype = %config.resource_type,
            interval = ?config.cycle_interval,
            "janitor started"
        );
        let scheduler = tokio::spawn(scheduler.run(tx, shutdown_rx));

        Ok(Self {
            shutdown_tx,
            scheduler,
            pool,
            stats,
        })
    }

    /// Run exactly one cycle and wait until every resource it acquired has
    /// been released.
    pub async fn run_once(
        config: &JanitorConfig,
        lease: Arc<dyn LeaseClient>,
        cleanup: Arc<dyn CleanupExecutor>,
    ) -> Result<(CycleReport, StatsSnapshot), ConfigError> {
        let Wiring {
            scheduler,
            tx,
            pool,
            stats,
        } = wire(config, lease, cleanup)?;
        // keep the sender alive for the whole cycle; dropping it means "stop"
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let report = scheduler.run_once(1, &tx, &mut shutdown_rx).await;
        drop(tx);
        pool.join().await;

        Ok((report, stats.snapshot()))
    }

    /// Stop acquiring. Resources already handed to workers are still
    /// cleaned and released.
    pub fn request_shutdown(&self) {
        // ignore send error: the scheduler may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the scheduler and all workers.
    pub async fn shutdown_and_join(self) -> StatsSnapshot {
        self.request_shutdown();
        if let Err(e) = self.scheduler.await {
            error!(error = %e, "scheduler task ended abnormally");
        }
        self.pool.join().await;

        let stats = self.stats.snapshot();
        info!(?stats, "janitor stopped");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResourceName, ResourceType};
    use crate::error::CleanupError;
    use crate::impls::InMemoryLeaseAuthority;
    use async_trait::async_trait;
    use std::time::Duration;

    struct AlwaysClean;

    #[async_trait]
    impl CleanupExecutor for AlwaysClean {
        async fn clean(&self, _name: &ResourceName) -> Result<(), CleanupError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn start_rejects_invalid_config() {
        let config = JanitorConfig {
            pool_size: 0,
            ..JanitorConfig::default()
        };
        let authority = InMemoryLeaseAuthority::new();
        let res = Janitor::start(
            &config,
            Arc::new(authority.client("janitor")),
            Arc::new(AlwaysClean),
        );
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn started_janitor_cleans_everything_and_stops() {
        let authority =
            InMemoryLeaseAuthority::with_dirty(&ResourceType::default(), ["p1", "p2", "p3", "p4"]);
        let config = JanitorConfig {
            pool_size: 2,
            buffer_size: 1,
            cycle_interval: Duration::from_secs(3600),
            ..JanitorConfig::default()
        };

        let janitor = Janitor::start(
            &config,
            Arc::new(authority.client("janitor")),
            Arc::new(AlwaysClean),
        )
        .unwrap();

        // wait until the first cycle has released everything
        tokio::time::timeout(Duration::from_secs(5), async {
            while authority.counts_by_state().await.free < 4 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let stats = janitor.shutdown_and_join().await;
        assert_eq!(stats.acquired, 4);
        assert_eq!(stats.released_free, 4);
        assert_eq!(stats.in_flight, 0);
    }
}
