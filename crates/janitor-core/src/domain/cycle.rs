use crate::error::LeaseError;

/// Why a cycle's acquire loop stopped.
#[derive(Debug)]
pub enum CycleStop {
    /// The authority had no more dirty resources. Normal end of cycle.
    Exhausted,

    /// Acquire failed (or timed out). Not retried within the cycle.
    Faulted(LeaseError),

    /// Shutdown was requested while the dispatcher was waiting.
    Shutdown,
}

/// Summary of one dispatch pass.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle: u64,
    /// Resources successfully acquired and handed to the worker pool.
    pub acquired: usize,
    pub stop: CycleStop,
}

impl CycleReport {
    pub fn is_faulted(&self) -> bool {
        matches!(self.stop, CycleStop::Faulted(_))
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self.stop, CycleStop::Shutdown)
    }
}
