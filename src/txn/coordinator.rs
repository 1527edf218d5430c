//! Transaction commit/abort coordination.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::buffer::BufferPool;
use crate::common::{PageKey, Result, TxnId};
use crate::recovery::WalSink;
use crate::storage::Page;

/// Drives a transaction to its terminal state.
///
/// Per transaction the core sees exactly one state change: ACTIVE →
/// COMPLETE, entered through [`complete`] with either `commit = true` or
/// `false`. A completed transaction's id must never be used again.
///
/// The coordinator receives its collaborators explicitly — the pool it
/// shares with every other caller and the WAL sink — rather than reaching
/// for process-wide singletons, so lifetime and wiring are visible at the
/// construction site.
///
/// [`complete`]: TransactionCoordinator::complete
pub struct TransactionCoordinator {
    pool: Arc<BufferPool>,
    wal: Arc<dyn WalSink>,
}

impl TransactionCoordinator {
    pub fn new(pool: Arc<BufferPool>, wal: Arc<dyn WalSink>) -> Self {
        Self { pool, wal }
    }

    /// Commit or abort `tid`, then release all of its locks.
    ///
    /// Commit writes each exclusively-held dirty page through the store
    /// (log record forced first), clears its dirty marker and refreshes its
    /// before-image to the committed content. Abort restores each such page
    /// from its before-image, purely in cache. Pages held only shared need
    /// no work in either case.
    ///
    /// # Errors
    /// A failed log or store write aborts the commit mid-flight *without*
    /// releasing locks or clearing dirty markers, so the caller can retry
    /// the commit or abort instead.
    pub fn complete(&self, tid: TxnId, commit: bool) -> Result<()> {
        for key in self.pool.locks().pages_held_by(tid) {
            let Some(page) = self.written_page_of(tid, key) else {
                continue;
            };
            let mut page = page.write();
            if page.dirtied_by() != Some(tid) {
                continue;
            }

            if commit {
                self.write_through(tid, key, &mut page)?;
                page.refresh_before_image();
            } else {
                page.restore_before_image();
            }
        }

        self.pool.locks().release_all(tid);
        debug!(%tid, commit, "transaction complete");
        Ok(())
    }

    /// Write `tid`'s exclusively-held dirty pages through the store, for a
    /// partial durability point such as a checkpoint.
    ///
    /// The dirty markers stay set: the transaction is still in flight, and
    /// a later abort must still be able to restore the before-images. The
    /// forced log records make the flushed content recoverable either way.
    pub fn flush_pages_of(&self, tid: TxnId) -> Result<()> {
        for key in self.pool.locks().pages_held_by(tid) {
            let Some(page) = self.written_page_of(tid, key) else {
                continue;
            };
            let page = page.read();
            if page.dirtied_by() != Some(tid) {
                continue;
            }

            self.wal.log_write(tid, page.before_image(), page.data())?;
            self.wal.force()?;
            self.pool.store().write_page(key, page.data())?;
        }
        Ok(())
    }

    /// The resident page for `key`, provided `tid` holds it exclusively.
    /// Shared-only pages carry no writes and need no commit/abort work.
    fn written_page_of(&self, tid: TxnId, key: PageKey) -> Option<Arc<RwLock<Page>>> {
        if !self.pool.locks().holds_exclusive(tid, key) {
            return None;
        }
        self.pool.resident(key)
    }

    /// Log-before-data: the record must be durable before the page write.
    /// `dirtied_by` is cleared only once the store write succeeded.
    fn write_through(&self, tid: TxnId, key: PageKey, page: &mut Page) -> Result<()> {
        self.wal.log_write(tid, page.before_image(), page.data())?;
        self.wal.force()?;
        self.pool.store().write_page(key, page.data())?;
        page.clear_dirty();
        Ok(())
    }
}
