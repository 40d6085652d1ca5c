//! Dispatcher - acquire ループ
//!
//! # フロー
//! 1. channel の空きを予約（満杯なら待つ = backpressure）
//! 2. LeaseClient::acquire(type, dirty, cleaning)
//! 3. 取れたら予約枠で ticket を送る、空なら cycle 終了、エラーなら cycle 終了
//!
//! A name is handed to the pool at most once per cycle. If the authority
//! gives back a name already acquired in this cycle (cleanup failed and it
//! was released dirty), the resource is returned to `dirty` untouched and
//! the cycle ends; it is retried next cycle.
//!
//! The slot is reserved *before* acquiring, so the dispatcher never holds a
//! leased resource while it waits for capacity. Shutdown during that wait
//! therefore cannot strand a resource in `cleaning`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::domain::{
    CycleReport, CycleStop, LeaseTicket, ResourceName, ResourceState, ResourceType,
};
use crate::error::LeaseError;
use crate::observability::JanitorStats;
use crate::ports::LeaseClient;

pub struct Dispatcher {
    lease: Arc<dyn LeaseClient>,
    resource_type: ResourceType,
    acquire_timeout: Duration,
    release_timeout: Duration,
    stats: Arc<JanitorStats>,
}

impl Dispatcher {
    pub fn new(
        lease: Arc<dyn LeaseClient>,
        resource_type: ResourceType,
        acquire_timeout: Duration,
        release_timeout: Duration,
        stats: Arc<JanitorStats>,
    ) -> Self {
        Self {
            lease,
            resource_type,
            acquire_timeout,
            release_timeout,
            stats,
        }
    }

    /// Acquire every dirty resource currently available and hand each one to
    /// the worker pool through `tx`.
    ///
    /// Returns on the first empty acquire, the first repeated name, the first
    /// acquire error, or shutdown. Never retries within a cycle.
    pub async fn run_cycle(
        &self,
        cycle: u64,
        tx: &mpsc::Sender<LeaseTicket>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> CycleReport {
        let mut acquired = 0;
        let mut seen: HashSet<ResourceName> = HashSet::new();
        let stop = loop {
            if *shutdown_rx.borrow() {
                break CycleStop::Shutdown;
            }

            // 満杯なら worker が取り出すまでここで待つ
            let permit = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        // sender dropped: nobody can stop us later, treat as stop now
                        break CycleStop::Shutdown;
                    }
                    continue;
                }
                permit = tx.reserve() => permit,
            };
            let Ok(permit) = permit else {
                // receiver gone: the pool has stopped
                break CycleStop::Shutdown;
            };

            let acquired_name = match tokio::time::timeout(
                self.acquire_timeout,
                self.lease.acquire(
                    &self.resource_type,
                    ResourceState::Dirty,
                    ResourceState::Cleaning,
                ),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(LeaseError::Timeout {
                    op: "acquire",
                    after: self.acquire_timeout,
                }),
            };

            match acquired_name {
                Ok(Some(name)) if seen.contains(&name) => {
                    drop(permit);
                    self.return_dirty(cycle, &name).await;
                    break CycleStop::Exhausted;
                }
                Ok(Some(name)) => {
                    info!(cycle, resource = %name, "acquired");
                    seen.insert(name.clone());
                    self.stats.record_acquired();
                    acquired += 1;
                    permit.send(LeaseTicket::new(name, cycle));
                }
                Ok(None) => {
                    debug!(cycle, rtype = %self.resource_type, "no dirty resources left");
                    break CycleStop::Exhausted;
                }
                Err(e) => {
                    error!(cycle, error = %e, "acquire failed");
                    break CycleStop::Faulted(e);
                }
            }
        };

        CycleReport {
            cycle,
            acquired,
            stop,
        }
    }

    /// Give a repeated name straight back without cleaning it.
    async fn return_dirty(&self, cycle: u64, name: &ResourceName) {
        debug!(cycle, resource = %name, "already handled this cycle, returning it dirty");
        let released = tokio::time::timeout(
            self.release_timeout,
            self.lease.release(name, ResourceState::Dirty),
        )
        .await;
        match released {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(cycle, resource = %name, error = %e, "returning repeated resource failed");
            }
            Err(_) => {
                error!(
                    cycle,
                    resource = %name,
                    after = ?self.release_timeout,
                    "returning repeated resource timed out"
                );
            }
        }
    }
}
