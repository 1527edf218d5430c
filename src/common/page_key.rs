//! Page identifier type.

use std::fmt;

/// Identifies a page: which table it belongs to and its number within that
/// table's file.
///
/// This is the cache key and the lock key. It is a proper composite value
/// with structural equality and hashing — two keys are the same page iff
/// both components match. Never collapse this to a derived hash value and
/// key maps by that: structurally distinct identities can share a hash, and
/// a silent collision corrupts both the cache and the lock tables.
///
/// # Example
/// ```
/// use latchdb::PageKey;
///
/// let key = PageKey::new(3, 42);
/// assert_eq!(key.table_id(), 3);
/// assert_eq!(key.page_no(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    table_id: u32,
    page_no: u32,
}

impl PageKey {
    /// Create a new PageKey.
    #[inline]
    pub fn new(table_id: u32, page_no: u32) -> Self {
        Self { table_id, page_no }
    }

    /// The table this page belongs to.
    #[inline]
    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    /// The page number within the table's file.
    #[inline]
    pub fn page_no(&self) -> u32 {
        self.page_no
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.table_id, self.page_no)
    }
}
