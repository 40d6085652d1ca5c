//! Ports - 外部システムとの境界
//!
//! Each trait is the seam to something the janitor does not own: the lease
//! authority and the cleanup operation. Implementations live in `impls`.

pub mod cleanup;
pub mod lease_client;

pub use self::cleanup::CleanupExecutor;
pub use self::lease_client::LeaseClient;
