//! Write-ahead log ordering contract.
//!
//! Durability of the log itself is a collaborator's problem; the core only
//! honors the ordering: on commit, the update record must be logged *and
//! forced* before the page write to the store proceeds. Writing the page
//! first breaks crash recoverability.

use crate::common::config::PAGE_SIZE;
use crate::common::{Result, TxnId};

/// Sink for page-update log records.
///
/// The coordinator calls `log_write` with the page's before- and
/// after-images, then `force`, and only then writes the page through to the
/// store. Implementations decide what durability means.
pub trait WalSink: Send + Sync {
    /// Append an update record for one page.
    fn log_write(
        &self,
        tid: TxnId,
        before: &[u8; PAGE_SIZE],
        after: &[u8; PAGE_SIZE],
    ) -> Result<()>;

    /// Make every appended record durable.
    fn force(&self) -> Result<()>;
}

/// A sink that discards everything. For callers that run without recovery.
#[derive(Debug, Default)]
pub struct NoopWal;

impl WalSink for NoopWal {
    fn log_write(&self, _tid: TxnId, _before: &[u8; PAGE_SIZE], _after: &[u8; PAGE_SIZE]) -> Result<()> {
        Ok(())
    }

    fn force(&self) -> Result<()> {
        Ok(())
    }
}
