//! WorkerPool - cleanup → release ループ
//!
//! # フロー（1 worker あたり）
//! 1. channel から ticket を1件受け取る（空なら待つ）
//! 2. target = free
//! 3. CleanupExecutor::clean()（失敗・timeout なら target = dirty）
//! 4. LeaseClient::release(name, target)（失敗しても retry しない）
//! 5. 1 に戻る
//!
//! Workers stop once every sender is dropped and the channel is drained, so
//! tickets already handed over are still released during shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::{CleanOutcome, LeaseTicket, ResourceState};
use crate::error::{CleanupError, LeaseError};
use crate::observability::JanitorStats;
use crate::ports::{CleanupExecutor, LeaseClient};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub cleanup_timeout: Duration,
    pub release_timeout: Duration,
}

/// Fixed-size pool of long-lived workers sharing one receiver.
pub struct WorkerPool {
    joins: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `n` workers draining `rx`.
    pub fn spawn(
        n: usize,
        rx: mpsc::Receiver<LeaseTicket>,
        lease: Arc<dyn LeaseClient>,
        cleanup: Arc<dyn CleanupExecutor>,
        settings: WorkerSettings,
        stats: Arc<JanitorStats>,
    ) -> Self {
        // 受信側は1つなので worker 間で Mutex 共有する（recv 待ちは常に1 worker だけ）
        let rx = Arc::new(Mutex::new(rx));

        let joins = (0..n)
            .map(|id| {
                let worker = Worker {
                    id,
                    lease: Arc::clone(&lease),
                    cleanup: Arc::clone(&cleanup),
                    settings: settings.clone(),
                    stats: Arc::clone(&stats),
                };
                let rx = Arc::clone(&rx);
                tokio::spawn(worker.run(rx))
            })
            .collect();

        Self { joins }
    }

    pub fn size(&self) -> usize {
        self.joins.len()
    }

    /// Wait for every worker to exit (channel closed and drained).
    pub async fn join(self) {
        for j in self.joins {
            if let Err(e) = j.await {
                error!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

struct Worker {
    id: usize,
    lease: Arc<dyn LeaseClient>,
    cleanup: Arc<dyn CleanupExecutor>,
    settings: WorkerSettings,
    stats: Arc<JanitorStats>,
}

impl Worker {
    async fn run(self, rx: Arc<Mutex<mpsc::Receiver<LeaseTicket>>>) {
        loop {
            // lock は recv の間だけ。処理中は他の worker が受け取れる
            let ticket = rx.lock().await.recv().await;
            let Some(ticket) = ticket else {
                debug!(worker = self.id, "channel closed, worker stopping");
                break;
            };
            self.process(ticket).await;
        }
    }

    /// Clean one resource and release it. Returns the release target.
    async fn process(&self, ticket: LeaseTicket) -> ResourceState {
        let cycle = ticket.cycle();
        let name = ticket.into_name();

        let result = match tokio::time::timeout(
            self.settings.cleanup_timeout,
            self.cleanup.clean(&name),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CleanupError::Timeout(self.settings.cleanup_timeout)),
        };
        let outcome = CleanOutcome::from(result);
        if let CleanOutcome::Failed(reason) = &outcome {
            error!(worker = self.id, cycle, resource = %name, error = %reason, "cleanup failed");
        }
        self.stats.record_cleanup(outcome.is_cleaned());

        let target = outcome.release_target();
        debug_assert!(target.is_release_target());
        let released = match tokio::time::timeout(
            self.settings.release_timeout,
            self.lease.release(&name, target),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LeaseError::Timeout {
                op: "release",
                after: self.settings.release_timeout,
            }),
        };

        match released {
            Ok(()) => {
                info!(worker = self.id, cycle, resource = %name, target = %target, "released");
                self.stats.record_release(true, outcome.is_cleaned());
            }
            Err(e) => {
                // no retry: the authority keeps whatever it last committed
                error!(
                    worker = self.id,
                    cycle,
                    resource = %name,
                    target = %target,
                    error = %e,
                    "release failed"
                );
                self.stats.record_release(false, outcome.is_cleaned());
            }
        }
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResourceName, ResourceType};
    use crate::impls::InMemoryLeaseAuthority;
    use async_trait::async_trait;

    struct Cleaner {
        fail: Vec<&'static str>,
        delay: Duration,
    }

    #[async_trait]
    impl CleanupExecutor for Cleaner {
        async fn clean(&self, name: &ResourceName) -> Result<(), CleanupError> {
            tokio::time::sleep(self.delay).await;
            if self.fail.iter().any(|f| *f == name.as_str()) {
                Err(CleanupError::Other(format!("{name} is stuck")))
            } else {
                Ok(())
            }
        }
    }

    fn settings() -> WorkerSettings {
        WorkerSettings {
            cleanup_timeout: Duration::from_secs(5),
            release_timeout: Duration::from_secs(5),
        }
    }

    async fn leased(authority: &InMemoryLeaseAuthority, owner: &str) -> LeaseTicket {
        let name = authority
            .client(owner)
            .acquire(
                &ResourceType::default(),
                ResourceState::Dirty,
                ResourceState::Cleaning,
            )
            .await
            .unwrap()
            .unwrap();
        LeaseTicket::new(name, 1)
    }

    fn worker(
        authority: &InMemoryLeaseAuthority,
        cleaner: Cleaner,
        settings: WorkerSettings,
    ) -> (Worker, Arc<JanitorStats>) {
        let stats = Arc::new(JanitorStats::new());
        let worker = Worker {
            id: 0,
            lease: Arc::new(authority.client("janitor")),
            cleanup: Arc::new(cleaner),
            settings,
            stats: Arc::clone(&stats),
        };
        (worker, stats)
    }

    #[tokio::test]
    async fn successful_cleanup_releases_free() {
        let authority = InMemoryLeaseAuthority::with_dirty(&ResourceType::default(), ["p1"]);
        let (w, stats) = worker(
            &authority,
            Cleaner {
                fail: vec![],
                delay: Duration::ZERO,
            },
            settings(),
        );

        let target = w.process(leased(&authority, "janitor").await).await;

        assert_eq!(target, ResourceState::Free);
        assert_eq!(authority.counts_by_state().await.free, 1);
        assert_eq!(stats.snapshot().released_free, 1);
    }

    #[tokio::test]
    async fn failed_cleanup_releases_dirty() {
        let authority = InMemoryLeaseAuthority::with_dirty(&ResourceType::default(), ["p1"]);
        let (w, stats) = worker(
            &authority,
            Cleaner {
                fail: vec!["p1"],
                delay: Duration::ZERO,
            },
            settings(),
        );

        let target = w.process(leased(&authority, "janitor").await).await;

        assert_eq!(target, ResourceState::Dirty);
        let p1 = authority.get(&ResourceName::new("p1")).await.unwrap();
        assert_eq!(p1.state, ResourceState::Dirty);
        assert!(!p1.is_leased());
        let snap = stats.snapshot();
        assert_eq!(snap.cleanup_failures, 1);
        assert_eq!(snap.released_dirty, 1);
    }

    #[tokio::test]
    async fn cleanup_timeout_releases_dirty() {
        let authority = InMemoryLeaseAuthority::with_dirty(&ResourceType::default(), ["p1"]);
        let (w, _stats) = worker(
            &authority,
            Cleaner {
                fail: vec![],
                delay: Duration::from_secs(60),
            },
            WorkerSettings {
                cleanup_timeout: Duration::from_millis(20),
                ..settings()
            },
        );

        let target = w.process(leased(&authority, "janitor").await).await;

        assert_eq!(target, ResourceState::Dirty);
        assert_eq!(authority.counts_by_state().await.dirty, 1);
    }

    #[tokio::test]
    async fn release_failure_is_counted_not_retried() {
        let authority = InMemoryLeaseAuthority::with_dirty(&ResourceType::default(), ["p1"]);
        let (w, stats) = worker(
            &authority,
            Cleaner {
                fail: vec![],
                delay: Duration::ZERO,
            },
            settings(),
        );

        // leased by someone else: the authority rejects our release
        let ticket = leased(&authority, "other").await;
        w.process(ticket).await;

        let snap = stats.snapshot();
        assert_eq!(snap.release_failures, 1);
        assert_eq!(snap.released(), 0);
        let p1 = authority.get(&ResourceName::new("p1")).await.unwrap();
        assert_eq!(p1.state, ResourceState::Cleaning);
    }

    #[tokio::test]
    async fn pool_drains_channel_then_exits() {
        let authority =
            InMemoryLeaseAuthority::with_dirty(&ResourceType::default(), ["p1", "p2", "p3"]);
        let (tx, rx) = mpsc::channel(4);
        for _ in 0..3 {
            tx.send(leased(&authority, "janitor").await).await.unwrap();
        }
        drop(tx);

        let pool = WorkerPool::spawn(
            2,
            rx,
            Arc::new(authority.client("janitor")),
            Arc::new(Cleaner {
                fail: vec!["p2"],
                delay: Duration::from_millis(5),
            }),
            settings(),
            Arc::new(JanitorStats::new()),
        );
        assert_eq!(pool.size(), 2);
        pool.join().await;

        let counts = authority.counts_by_state().await;
        assert_eq!(counts.free, 2);
        assert_eq!(counts.dirty, 1);
        assert_eq!(counts.cleaning, 0);
    }
}
