//! Error types for latchdb.

use thiserror::Error;

use crate::common::{PageKey, TxnId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in latchdb.
///
/// Having a single error type keeps propagation uniform: lock and eviction
/// failures are returned to the operation initiator, I/O failures bubble up
/// uninterpreted. Nothing in the core retries or swallows an error.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the backing page store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in the backing store.
    #[error("page {0} not found")]
    PageNotFound(PageKey),

    /// A lock could not be granted within the timeout.
    ///
    /// Non-fatal: the caller must route the requesting transaction to
    /// `complete(tid, commit = false)` and may retry with a fresh one.
    #[error("transaction {0} aborted: lock wait timed out")]
    TransactionAborted(TxnId),

    /// The eviction scan found no page it may evict.
    ///
    /// Every resident page is either dirty or locked by an in-flight
    /// transaction, so under the no-steal policy the pool cannot satisfy
    /// the request until some transaction completes.
    #[error("buffer pool exhausted: every resident page is dirty or locked")]
    CacheExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(PageKey::new(1, 42));
        assert_eq!(format!("{}", err), "page Page(1:42) not found");

        let err = Error::CacheExhausted;
        assert_eq!(
            format!("{}", err),
            "buffer pool exhausted: every resident page is dirty or locked"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }
}
