//! The backing-store contract consumed by the buffer pool.

use crate::common::config::PAGE_SIZE;
use crate::common::{PageKey, Result};

/// Durable page storage, consumed (not implemented) by the cache core.
///
/// All pages are exactly [`PAGE_SIZE`] bytes. Writes have idempotent
/// overwrite semantics. Allocation of a page with free tuple capacity is the
/// caller layer's concern; the store only hands out fresh pages.
///
/// Implementations must be safe to share behind an `Arc` across the threads
/// driving concurrent transactions.
pub trait PageStore: Send + Sync {
    /// Read one page. Fails with `Error::PageNotFound` for unknown keys.
    fn read_page(&self, key: PageKey) -> Result<Box<[u8; PAGE_SIZE]>>;

    /// Overwrite one page. The page must already exist.
    fn write_page(&self, key: PageKey, data: &[u8; PAGE_SIZE]) -> Result<()>;

    /// Number of pages currently allocated to a table.
    fn num_pages(&self, table_id: u32) -> Result<u32>;

    /// Allocate a fresh zeroed page at the end of a table.
    fn allocate_page(&self, table_id: u32) -> Result<PageKey>;
}
