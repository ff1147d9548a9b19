use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for registry activity
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Total acquire calls
    pub acquires: AtomicU64,
    /// Facades created by acquire
    pub facades_created: AtomicU64,
    /// Facades retired by release or release_all
    pub facades_released: AtomicU64,
}

impl RegistryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn snapshot(&self, buckets: usize, facades: usize) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            buckets,
            facades,
            acquires: self.acquires.load(Ordering::Relaxed),
            facades_created: self.facades_created.load(Ordering::Relaxed),
            facades_released: self.facades_released.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of the registry table and its counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStatsSnapshot {
    /// Device buckets, including empty ones
    pub buckets: usize,
    /// Facades currently registered
    pub facades: usize,
    pub acquires: u64,
    pub facades_created: u64,
    pub facades_released: u64,
}
