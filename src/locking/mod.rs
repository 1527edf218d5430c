//! Page-level transactional locking.
//!
//! - [`LockGraph`] - bipartite transaction ↔ page bookkeeping
//! - [`PageLatch`] - per-page counting budget (N readers, 1 writer)
//! - [`LockManager`] - admission control with upgrade and timeout-based
//!   deadlock avoidance

mod graph;
mod latch;
mod manager;

pub use graph::{LockGraph, LockMode};
pub use latch::PageLatch;
pub use manager::LockManager;
