//! CycleScheduler - dispatch cycle を一定間隔で繰り返す
//!
//! healthy cycle の後は `interval`、faulted cycle の後は backoff。
//! The wait races the shutdown signal, so a stop request never has to sit
//! out a full interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use super::{BackoffPolicy, Dispatcher};
use crate::domain::{CycleReport, LeaseTicket};
use crate::observability::JanitorStats;

pub struct CycleScheduler {
    dispatcher: Dispatcher,
    interval: Duration,
    backoff: BackoffPolicy,
    stats: Arc<JanitorStats>,
}

impl CycleScheduler {
    pub fn new(
        dispatcher: Dispatcher,
        interval: Duration,
        backoff: BackoffPolicy,
        stats: Arc<JanitorStats>,
    ) -> Self {
        Self {
            dispatcher,
            interval,
            backoff,
            stats,
        }
    }

    /// Run a single dispatch cycle.
    pub async fn run_once(
        &self,
        cycle: u64,
        tx: &mpsc::Sender<LeaseTicket>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> CycleReport {
        let report = self.dispatcher.run_cycle(cycle, tx, shutdown_rx).await;
        self.stats.record_cycle(report.is_faulted());
        report
    }

    /// Wait after a cycle: the interval when healthy, backoff when faulted.
    ///
    /// `faults` is the number of consecutive faulted cycles so far.
    pub fn delay_after(&self, report: &CycleReport, faults: u32) -> Duration {
        if report.is_faulted() {
            self.backoff.next_delay(faults)
        } else {
            self.interval
        }
    }

    /// Cycle until shutdown. Consumes `tx`; dropping it on return lets the
    /// worker pool drain and stop.
    pub async fn run(self, tx: mpsc::Sender<LeaseTicket>, mut shutdown_rx: watch::Receiver<bool>) {
        let mut cycle = 0;
        let mut faults = 0u32;

        loop {
            cycle += 1;
            let report = self.run_once(cycle, &tx, &mut shutdown_rx).await;
            if report.is_shutdown() {
                break;
            }

            faults = if report.is_faulted() {
                faults.saturating_add(1)
            } else {
                0
            };
            let wait = self.delay_after(&report, faults);
            if faults > 0 {
                warn!(cycle, faults, next_in = ?wait, "cycle faulted, backing off");
            } else {
                info!(cycle, acquired = report.acquired, next_in = ?wait, "cycle finished");
            }

            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!(cycles = cycle, "scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CycleStop, ResourceType};
    use crate::error::LeaseError;
    use crate::impls::InMemoryLeaseAuthority;

    fn scheduler(authority: &InMemoryLeaseAuthority, interval: Duration) -> CycleScheduler {
        let stats = Arc::new(JanitorStats::new());
        let dispatcher = Dispatcher::new(
            Arc::new(authority.client("janitor")),
            ResourceType::default(),
            Duration::from_secs(5),
            Duration::from_secs(5),
            Arc::clone(&stats),
        );
        CycleScheduler::new(
            dispatcher,
            interval,
            BackoffPolicy {
                base_delay: Duration::from_secs(7),
                multiplier: 2.0,
                max_delay: Duration::from_secs(60),
                jitter: 0.0,
            },
            stats,
        )
    }

    fn report(stop: CycleStop) -> CycleReport {
        CycleReport {
            cycle: 1,
            acquired: 0,
            stop,
        }
    }

    #[test]
    fn healthy_cycle_waits_interval_faulted_backs_off() {
        let s = scheduler(&InMemoryLeaseAuthority::new(), Duration::from_secs(60));

        assert_eq!(
            s.delay_after(&report(CycleStop::Exhausted), 0),
            Duration::from_secs(60)
        );
        let faulted = report(CycleStop::Faulted(LeaseError::Status {
            status: 503,
            body: String::new(),
        }));
        assert_eq!(s.delay_after(&faulted, 1), Duration::from_secs(7));
        assert_eq!(s.delay_after(&faulted, 2), Duration::from_secs(14));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_and_drops_sender() {
        let authority = InMemoryLeaseAuthority::with_dirty(&ResourceType::default(), ["p1"]);
        let s = scheduler(&authority, Duration::from_secs(3600));
        let stats = Arc::clone(&s.stats);
        let (tx, mut rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let run = tokio::spawn(s.run(tx, shutdown_rx));

        // first cycle runs immediately, then the scheduler sleeps an hour
        let ticket = rx.recv().await.unwrap();
        assert_eq!(ticket.name().as_str(), "p1");

        shutdown_tx.send(true).unwrap();
        run.await.unwrap();

        // sender dropped with the scheduler
        assert!(rx.recv().await.is_none());
        assert_eq!(stats.snapshot().cycles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn next_cycle_picks_up_new_dirty_resources() {
        let authority = InMemoryLeaseAuthority::new();
        let s = scheduler(&authority, Duration::from_secs(60));
        let (tx, mut rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let run = tokio::spawn(s.run(tx, shutdown_rx));

        authority
            .add(crate::domain::Resource::new(
                "late",
                ResourceType::default(),
                crate::domain::ResourceState::Dirty,
            ))
            .await;

        // paused clock auto-advances through the 60s interval
        let ticket = rx.recv().await.unwrap();
        assert_eq!(ticket.name().as_str(), "late");
        assert!(ticket.cycle() >= 1);

        shutdown_tx.send(true).unwrap();
        run.await.unwrap();
    }
}
