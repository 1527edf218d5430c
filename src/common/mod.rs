//! Common types and utilities shared across latchdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants
//! - Error types
//! - Identifiers (PageKey, TxnId)

pub mod config;
pub mod error;
mod page_key;
mod txn_id;

pub use error::{Error, Result};
pub use page_key::PageKey;
pub use txn_id::TxnId;
