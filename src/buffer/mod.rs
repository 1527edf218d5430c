//! The buffer pool - a bounded, no-steal page cache.
//!
//! # Components
//! - [`BufferPool`] - the bounded cache with LRU eviction and lock admission
//! - [`PoolStats`] - performance counters

mod pool;
mod stats;

pub use pool::BufferPool;
pub use stats::{PoolStats, StatsSnapshot};
