//! Transaction completion.
//!
//! - [`TransactionCoordinator`] - drives commit (WAL-ordered write-through,
//!   before-image refresh) and abort (before-image restore), then releases
//!   the transaction's locks

mod coordinator;

pub use coordinator::TransactionCoordinator;
