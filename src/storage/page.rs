//! Page - the in-memory image of one fixed-size disk block.

use std::fmt;

use crate::common::config::PAGE_SIZE;
use crate::common::{PageKey, TxnId};

/// The in-memory image of one disk page.
///
/// A page is exclusively owned by the buffer pool while resident; callers
/// receive it behind an `Arc<RwLock<..>>` and may only mutate it while
/// holding the corresponding exclusive lock from the lock manager.
///
/// # Dirty tracking and the before-image
/// A page carries the id of the transaction that dirtied it (`None` when
/// clean) and a snapshot of its content from the moment it last went
/// clean → dirty. The snapshot is what abort restores. It is captured
/// exactly once per dirtying episode and refreshed only when the writer
/// commits, so repeated writes by the same transaction roll back to the
/// last committed state, not to an intermediate one.
pub struct Page {
    key: PageKey,
    data: Box<[u8; PAGE_SIZE]>,
    before_image: Box<[u8; PAGE_SIZE]>,
    dirtied_by: Option<TxnId>,
}

impl Page {
    /// Wrap freshly loaded content. The before-image starts as a copy of
    /// the loaded bytes.
    pub(crate) fn new(key: PageKey, data: Box<[u8; PAGE_SIZE]>) -> Self {
        let before_image = data.clone();
        Self {
            key,
            data,
            before_image,
            dirtied_by: None,
        }
    }

    /// The page's identity.
    #[inline]
    pub fn key(&self) -> PageKey {
        self.key
    }

    /// Get immutable slice of page content.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }

    /// Get mutable slice of page content.
    ///
    /// The caller must hold the exclusive lock on this page and must call
    /// [`Page::mark_dirty`] after modifying it.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    /// Record that `tid` modified this page.
    ///
    /// On the clean → dirty transition the current content is captured as
    /// the before-image. Marking an already-dirty page again is a no-op
    /// beyond asserting the writer has not changed (only one transaction
    /// can hold the exclusive lock).
    pub fn mark_dirty(&mut self, tid: TxnId) {
        match self.dirtied_by {
            None => {
                self.before_image.copy_from_slice(&self.data[..]);
                self.dirtied_by = Some(tid);
            }
            Some(owner) => {
                debug_assert_eq!(owner, tid, "page dirtied by two transactions at once");
            }
        }
    }

    /// The transaction that dirtied this page, if any.
    #[inline]
    pub fn dirtied_by(&self) -> Option<TxnId> {
        self.dirtied_by
    }

    /// Whether the page holds uncommitted modifications.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }

    /// The snapshot abort would restore.
    #[inline]
    pub fn before_image(&self) -> &[u8; PAGE_SIZE] {
        &self.before_image
    }

    /// Raw content buffer, for writing through to the store.
    #[inline]
    pub(crate) fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    /// Drop the dirty marker after a successful write-through.
    pub(crate) fn clear_dirty(&mut self) {
        self.dirtied_by = None;
    }

    /// Re-snapshot the current content. Called at successful commit of the
    /// dirtying transaction so later episodes roll back to this state.
    pub(crate) fn refresh_before_image(&mut self) {
        self.before_image.copy_from_slice(&self.data[..]);
    }

    /// Throw away uncommitted content, restoring the before-image.
    pub(crate) fn restore_before_image(&mut self) {
        self.data.copy_from_slice(&self.before_image[..]);
        self.dirtied_by = None;
    }
}

// Manual impl: dumping two 4 KiB buffers into every assertion failure
// makes test output unreadable.
impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("key", &self.key)
            .field("dirtied_by", &self.dirtied_by)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed(key: PageKey) -> Page {
        Page::new(key, Box::new([0u8; PAGE_SIZE]))
    }

    #[test]
    fn test_new_page_is_clean() {
        let page = zeroed(PageKey::new(1, 0));
        assert!(!page.is_dirty());
        assert_eq!(page.dirtied_by(), None);
        assert_eq!(page.as_slice(), &page.before_image()[..]);
    }

    #[test]
    fn test_mark_dirty_captures_before_image_once() {
        let mut page = zeroed(PageKey::new(1, 0));
        let tid = TxnId(7);

        page.as_mut_slice()[0] = 0xAB;
        page.mark_dirty(tid);
        assert_eq!(page.before_image()[0], 0);

        // A second write in the same episode must not move the snapshot.
        page.as_mut_slice()[0] = 0xCD;
        page.mark_dirty(tid);
        assert_eq!(page.before_image()[0], 0);
        assert_eq!(page.dirtied_by(), Some(tid));
    }

    #[test]
    fn test_restore_before_image() {
        let mut page = zeroed(PageKey::new(1, 0));
        page.as_mut_slice()[10] = 0xFF;
        page.mark_dirty(TxnId(1));
        page.as_mut_slice()[10] = 0xEE;

        page.restore_before_image();

        assert_eq!(page.as_slice()[10], 0);
        assert!(!page.is_dirty());
    }

    #[test]
    fn test_debug_output_elides_content() {
        let mut page = zeroed(PageKey::new(1, 0));
        page.mark_dirty(TxnId(9));

        let out = format!("{:?}", page);
        assert!(out.contains("TxnId(9)"));
        // The content buffers stay out of the output.
        assert!(out.len() < 120);
    }

    #[test]
    fn test_refresh_before_image_moves_rollback_point() {
        let mut page = zeroed(PageKey::new(1, 0));
        page.as_mut_slice()[0] = 1;
        page.mark_dirty(TxnId(1));
        page.clear_dirty();
        page.refresh_before_image();

        // Next episode rolls back to the committed content, not zero.
        page.as_mut_slice()[0] = 2;
        page.mark_dirty(TxnId(2));
        page.restore_before_image();
        assert_eq!(page.as_slice()[0], 1);
    }
}
