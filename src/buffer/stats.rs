//! Buffer pool statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracked by the buffer pool.
///
/// All fields are atomic so concurrent transactions can bump them without
/// locks. `Ordering::Relaxed` everywhere: the counters are independent and
/// only need atomicity, not cross-counter ordering.
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Requests served from a resident page.
    pub cache_hits: AtomicU64,

    /// Requests that had to load from the store.
    pub cache_misses: AtomicU64,

    /// Pages evicted to make room.
    pub evictions: AtomicU64,

    /// Pages read from the store.
    pub pages_read: AtomicU64,

    /// Pages written to the store.
    pub pages_written: AtomicU64,

    /// Lock requests that timed out and aborted their transaction.
    pub lock_timeouts: AtomicU64,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache hit rate in [0.0, 1.0].
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// A non-atomic copy for display and comparison.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
            lock_timeouts: self.lock_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of [`PoolStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
    pub lock_timeouts: u64,
}

impl StatsSnapshot {
    /// Cache hit rate in [0.0, 1.0].
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, timeouts: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.lock_timeouts,
            self.hit_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_start_at_zero() {
        let stats = PoolStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.cache_hits, 0);
        assert_eq!(snap.cache_misses, 0);
        assert_eq!(snap.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = PoolStats::new();
        stats.cache_hits.fetch_add(7, Ordering::Relaxed);
        stats.cache_misses.fetch_add(3, Ordering::Relaxed);
        assert_eq!(stats.hit_rate(), 0.7);
    }

    #[test]
    fn test_stats_display() {
        let stats = PoolStats::new();
        stats.cache_hits.fetch_add(80, Ordering::Relaxed);
        stats.cache_misses.fetch_add(20, Ordering::Relaxed);

        let display = format!("{}", stats.snapshot());
        assert!(display.contains("hits: 80"));
        assert!(display.contains("80.00%"));
    }
}
