//! janitor-core
//!
//! Bounded-concurrency reclamation of leased resources: pull dirty
//! resources from a lease authority, clean each one, release it as free or
//! dirty.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（resource, state, outcome, cycle）
//! - **ports**: 抽象化レイヤー（LeaseClient, CleanupExecutor）
//! - **impls**: 実装（HttpLeaseClient, InMemoryLeaseAuthority, CommandCleanup）
//! - **app**: パイプライン（Dispatcher, WorkerPool, CycleScheduler, Janitor）
//! - **config**: 設定（TOML）
//! - **observability**: カウンタと status view
//! - **error**: エラー型

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::Janitor;
pub use config::JanitorConfig;
pub use error::JanitorError;
