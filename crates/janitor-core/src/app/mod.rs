//! App - アプリケーション層
//!
//! ports を組み合わせて reclamation pipeline を実装します。
//!
//! # 主要コンポーネント
//! - **Dispatcher**: acquire ループ（backpressure 付き）
//! - **WorkerPool**: cleanup → release を行う固定数の worker
//! - **CycleScheduler**: cycle の繰り返しと backoff
//! - **Janitor**: 上記の組み立てと shutdown

pub mod backoff;
pub mod dispatcher;
pub mod janitor;
pub mod scheduler;
pub mod worker_pool;

// 主要な型を再エクスポート
pub use self::backoff::BackoffPolicy;
pub use self::dispatcher::Dispatcher;
pub use self::janitor::Janitor;
pub use self::scheduler::CycleScheduler;
pub use self::worker_pool::{WorkerPool, WorkerSettings};
