//! Node statistics counters.
//!
//! Shared, lock-free counters the eviction engine reports into. The host's
//! stats subsystem owns an [`EvictStats`] and periodically snapshots it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for eviction activity.
///
/// Shared across joggers; updates are `Relaxed` since the counters are
/// monotonic and only ever read as point-in-time snapshots.
#[derive(Debug, Default)]
pub struct EvictStats {
    /// Objects evicted by the LRU heap drain.
    evict_count: AtomicU64,
    /// Bytes freed by the LRU heap drain.
    evict_size: AtomicU64,
}

impl EvictStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` objects totalling `bytes` evicted.
    pub fn add_evicted(&self, count: u64, bytes: u64) {
        self.evict_count.fetch_add(count, Ordering::Relaxed);
        self.evict_size.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Snapshot the current values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            evict_count: self.evict_count.load(Ordering::Relaxed),
            evict_size: self.evict_size.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EvictStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Objects evicted.
    pub evict_count: u64,
    /// Bytes freed.
    pub evict_size: u64,
}

impl StatsSnapshot {
    /// Difference between two snapshots (`self - other`), for rates.
    pub fn diff(&self, other: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            evict_count: self.evict_count.saturating_sub(other.evict_count),
            evict_size: self.evict_size.saturating_sub(other.evict_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_snapshot() {
        let stats = EvictStats::new();
        stats.add_evicted(3, 3 * 1024);
        stats.add_evicted(1, 512);

        let snap = stats.snapshot();
        assert_eq!(snap.evict_count, 4);
        assert_eq!(snap.evict_size, 3 * 1024 + 512);
    }

    #[test]
    fn test_diff() {
        let stats = EvictStats::new();
        stats.add_evicted(10, 100);
        let before = stats.snapshot();
        stats.add_evicted(5, 50);
        let delta = stats.snapshot().diff(&before);
        assert_eq!(delta.evict_count, 5);
        assert_eq!(delta.evict_size, 50);
    }
}
