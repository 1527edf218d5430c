//! Configuration constants for latchdb.

use std::time::Duration;

/// Size of a page in bytes (4KB).
///
/// The unit of cache accounting, eviction, and disk I/O. This value is a
/// process-wide constant shared with every [`PageStore`] implementation.
///
/// [`PageStore`]: crate::storage::PageStore
pub const PAGE_SIZE: usize = 4096;

/// Default buffer pool capacity in pages.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Number of shared slots in a page's lock budget.
///
/// Up to this many transactions can read a page in parallel. An exclusive
/// lock reserves the entire budget, so a writer excludes all readers.
pub const MAX_SHARED_SLOTS: usize = 50;

/// How long a lock request waits before aborting the requesting transaction.
///
/// This is the deadlock-avoidance knob: a request that cannot be granted
/// within this window fails with `TransactionAborted` instead of queuing
/// indefinitely. Under heavy contention it can abort transactions that are
/// not part of any real cycle.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);
