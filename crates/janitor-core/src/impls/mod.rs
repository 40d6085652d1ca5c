//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpLeaseClient**: 本番用の lease authority client
//! - **InMemoryLeaseAuthority**: 開発・テスト用の lease authority
//! - **CommandCleanup**: 外部プログラムによる cleanup
//! - **DryRunCleanup**: 何もしない cleanup（dry run 用）

pub mod command_cleanup;
pub mod dry_run_cleanup;
pub mod http_lease;
pub mod inmem_lease;

pub use self::command_cleanup::CommandCleanup;
pub use self::dry_run_cleanup::DryRunCleanup;
pub use self::http_lease::HttpLeaseClient;
pub use self::inmem_lease::{InMemoryLeaseAuthority, InMemoryLeaseClient};
