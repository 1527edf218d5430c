//! latchdb - a no-steal buffer pool with page-level transactional locking.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          latchdb                              │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────────┐   │
//! │  │         TransactionCoordinator (txn/)                  │   │
//! │  │   commit: WAL force → write-through → refresh image    │   │
//! │  │   abort:  restore before-image, in cache only          │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! │                             ↓                                 │
//! │  ┌───────────────────────────────────────────────────────┐   │
//! │  │              BufferPool (buffer/)                      │   │
//! │  │   bounded residency map + LRU recency order            │   │
//! │  │   no-steal eviction: dirty pages are never victims     │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! │                ↓                          ↓                   │
//! │  ┌──────────────────────────┐  ┌────────────────────────┐    │
//! │  │   LockManager (locking/) │  │  PageStore (storage/)  │    │
//! │  │   PageLatch + LockGraph  │  │  DiskManager, Page     │    │
//! │  │   timeout ⇒ abort        │  │  file-per-table I/O    │    │
//! │  └──────────────────────────┘  └────────────────────────┘    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageKey, TxnId, Error, config)
//! - [`buffer`] - The bounded no-steal page cache
//! - [`locking`] - Lock graph, per-page latches, lock manager
//! - [`storage`] - Page store contract, disk manager, page image
//! - [`txn`] - Commit/abort coordination
//! - [`recovery`] - WAL ordering contract
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use latchdb::{
//!     BufferPool, DiskManager, LockMode, NoopWal, PageStore, TransactionCoordinator, TxnId,
//! };
//!
//! let store = Arc::new(DiskManager::open("db").unwrap());
//! let key = store.allocate_page(0).unwrap();
//!
//! let pool = Arc::new(BufferPool::new(50, store));
//! let txns = TransactionCoordinator::new(Arc::clone(&pool), Arc::new(NoopWal));
//!
//! let tid = TxnId::fresh();
//! let page = pool.get_page(Some(tid), key, LockMode::Exclusive).unwrap();
//! {
//!     let mut page = page.write();
//!     page.as_mut_slice()[0] = 0xAB;
//!     page.mark_dirty(tid);
//! }
//! txns.complete(tid, true).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod locking;
pub mod recovery;
pub mod storage;
pub mod txn;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, PageKey, Result, TxnId};

pub use buffer::{BufferPool, PoolStats, StatsSnapshot};
pub use locking::{LockGraph, LockManager, LockMode, PageLatch};
pub use recovery::{NoopWal, WalSink};
pub use storage::{DiskManager, Page, PageStore};
pub use txn::TransactionCoordinator;
