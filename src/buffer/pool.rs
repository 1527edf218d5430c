//! Buffer pool - the bounded no-steal page cache.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::buffer::PoolStats;
use crate::common::config::DEFAULT_LOCK_TIMEOUT;
use crate::common::{Error, PageKey, Result, TxnId};
use crate::locking::{LockManager, LockMode};
use crate::storage::{Page, PageStore};

/// Cache membership state: the residency map and the recency order.
///
/// Invariant: both structures always hold exactly the same key set. The
/// front of `recency` is the most recently used page.
struct CacheState {
    pages: HashMap<PageKey, Arc<RwLock<Page>>>,
    recency: VecDeque<PageKey>,
}

impl CacheState {
    fn check_consistency(&self) {
        debug_assert_eq!(
            self.pages.len(),
            self.recency.len(),
            "residency map and recency order diverged"
        );
    }

    /// Move `key` to the most-recently-used position.
    fn touch(&mut self, key: PageKey) {
        let pos = self
            .recency
            .iter()
            .position(|k| *k == key)
            .expect("touched page not in recency order");
        let _ = self.recency.remove(pos);
        self.recency.push_front(key);
    }
}

/// A bounded mapping from [`PageKey`] to resident pages, backed by a
/// [`PageStore`] for misses.
///
/// # No-steal eviction
/// Eviction scans the recency order from the least-recently-used end and
/// takes the first unpinned page. A page is pinned while it is dirty (its
/// uncommitted content must stay in memory until the writer commits or
/// aborts) or while any transaction holds its lock (a locked page's handle
/// must remain *the* resident page: evicting it would detach the holder
/// from the cache and drop its writes on commit). If one full pass finds
/// only pinned pages, the request fails with `Error::CacheExhausted`.
///
/// # Thread Safety
/// Cache membership (miss load, eviction, recency refresh) is serialized by
/// one coarse mutex over [`CacheState`]; that keeps the residency map and
/// recency order consistent at all times. Lock admission blocks on the
/// per-page latches *outside* that mutex, so a transaction waiting for a
/// lock never stalls unrelated cache traffic.
pub struct BufferPool {
    capacity: usize,
    state: Mutex<CacheState>,
    locks: LockManager,
    store: Arc<dyn PageStore>,
    stats: PoolStats,
}

impl BufferPool {
    /// Create a pool caching up to `capacity` pages, with the default lock
    /// timeout.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, store: Arc<dyn PageStore>) -> Self {
        Self::with_lock_timeout(capacity, store, DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a pool with an explicit lock timeout (tests use short ones).
    pub fn with_lock_timeout(
        capacity: usize,
        store: Arc<dyn PageStore>,
        lock_timeout: Duration,
    ) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            capacity,
            state: Mutex::new(CacheState {
                pages: HashMap::new(),
                recency: VecDeque::new(),
            }),
            locks: LockManager::new(lock_timeout),
            store,
            stats: PoolStats::new(),
        }
    }

    /// Retrieve a page with the requested access mode for a transaction.
    ///
    /// Ensures the page is resident (loading from the store, evicting if
    /// the pool is full), refreshes its recency, then acquires `mode` from
    /// the lock manager. `tid = None` is the recovery path: it touches the
    /// cache but takes no lock.
    ///
    /// # Errors
    /// - `Error::CacheExhausted` if every resident page is dirty or locked
    /// - `Error::TransactionAborted` if the lock wait timed out
    /// - `Error::PageNotFound` / `Error::Io` from the store
    pub fn get_page(
        &self,
        tid: Option<TxnId>,
        key: PageKey,
        mode: LockMode,
    ) -> Result<Arc<RwLock<Page>>> {
        let page = {
            let mut state = self.state.lock();
            if let Some(page) = state.pages.get(&key).cloned() {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                state.touch(key);
                page
            } else {
                self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
                if state.pages.len() >= self.capacity {
                    self.evict_one(&mut state)?;
                }

                // The page must not appear resident if the read fails.
                let data = self.store.read_page(key)?;
                self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

                let page = Arc::new(RwLock::new(Page::new(key, data)));
                state.pages.insert(key, Arc::clone(&page));
                state.recency.push_front(key);
                page
            }
        };

        if let Some(tid) = tid {
            self.locks.acquire(tid, key, mode).inspect_err(|err| {
                if matches!(err, Error::TransactionAborted(_)) {
                    self.stats.lock_timeouts.fetch_add(1, Ordering::Relaxed);
                }
            })?;
        }
        Ok(page)
    }

    /// One bounded eviction pass, least-recently-used first.
    ///
    /// Dirty or locked candidates are requeued at the most-recently-used
    /// end; the first unpinned candidate is dropped. An unpinned page needs
    /// no flush here: under no-steal, anything modified stays dirty until
    /// its writer commits, and commit already wrote it through.
    ///
    /// The lock check is load-bearing even for clean pages. A transaction
    /// that was granted an exclusive lock may not have marked the page
    /// dirty yet; evicting in that window would hand the writer a detached
    /// copy and its committed write would never reach the store.
    fn evict_one(&self, state: &mut CacheState) -> Result<()> {
        state.check_consistency();
        let candidates = state.recency.len();
        for _ in 0..candidates {
            let key = state.recency.pop_back().expect("recency count checked");
            let dirty = state
                .pages
                .get(&key)
                .expect("recency entry without resident page")
                .read()
                .is_dirty();

            if dirty || self.locks.is_held(key) {
                state.recency.push_front(key);
            } else {
                state.pages.remove(&key);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "evicted page");
                state.check_consistency();
                return Ok(());
            }
        }

        warn!("eviction found no victim: every resident page is dirty or locked");
        Err(Error::CacheExhausted)
    }

    /// Unconditionally drop a page from the cache: no flush, no
    /// consistency checks. Only the recovery/log collaborator should call
    /// this, while rolling the page back independently.
    pub fn evict_force(&self, key: PageKey) {
        let mut state = self.state.lock();
        if state.pages.remove(&key).is_some() {
            let pos = state
                .recency
                .iter()
                .position(|k| *k == key)
                .expect("resident page missing from recency order");
            let _ = state.recency.remove(pos);
        }
        state.check_consistency();
    }

    /// Write every dirty resident page to the store.
    ///
    /// Graceful-shutdown helper only. Under no-steal this is unsafe while
    /// transactions are still active: it pushes uncommitted content to
    /// disk. `dirtied_by` is cleared per page only after its write
    /// succeeds.
    pub fn flush_all(&self) -> Result<()> {
        let pages: Vec<Arc<RwLock<Page>>> = {
            let state = self.state.lock();
            state.pages.values().cloned().collect()
        };

        for page in pages {
            let mut page = page.write();
            if page.is_dirty() {
                self.store.write_page(page.key(), page.data())?;
                page.clear_dirty();
                self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Release one lock early, without ending the transaction.
    ///
    /// Risky: dropping a lock before commit forfeits two-phase locking for
    /// that page. Callers that are not strictly reading ahead should end
    /// the transaction instead.
    pub fn release_page(&self, tid: TxnId, key: PageKey) {
        self.locks.release(tid, key);
    }

    /// Whether `tid` holds `mode` (or stronger) on `key`.
    pub fn holds_lock(&self, tid: TxnId, key: PageKey, mode: LockMode) -> bool {
        self.locks.holds_lock(tid, key, mode)
    }

    /// Maximum number of resident pages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of resident pages.
    pub fn resident_count(&self) -> usize {
        self.state.lock().pages.len()
    }

    /// Whether `key` is currently resident.
    pub fn is_resident(&self, key: PageKey) -> bool {
        self.state.lock().pages.contains_key(&key)
    }

    /// Performance counters.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    pub(crate) fn locks(&self) -> &LockManager {
        &self.locks
    }

    pub(crate) fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    /// The resident page for `key`, if any. Takes no lock; the coordinator
    /// uses this while it already owns the transaction's locks.
    pub(crate) fn resident(&self, key: PageKey) -> Option<Arc<RwLock<Page>>> {
        self.state.lock().pages.get(&key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DiskManager;
    use proptest::prelude::*;
    use tempfile::tempdir;

    const T1: TxnId = TxnId(201);
    const T2: TxnId = TxnId(202);

    /// Pool over a store pre-seeded with `pages` pages in table 0, each
    /// page's first byte set to its page number.
    fn create_pool(capacity: usize, pages: u32) -> (BufferPool, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let dm = Arc::new(DiskManager::open(dir.path()).unwrap());
        for i in 0..pages {
            let key = dm.allocate_page(0).unwrap();
            let mut data = Box::new([0u8; crate::common::config::PAGE_SIZE]);
            data[0] = i as u8;
            dm.write_page(key, &data).unwrap();
        }
        let pool = BufferPool::with_lock_timeout(capacity, dm, Duration::from_millis(30));
        (pool, dir)
    }

    fn pk(n: u32) -> PageKey {
        PageKey::new(0, n)
    }

    #[test]
    fn test_miss_loads_from_store() {
        let (pool, _dir) = create_pool(4, 2);

        let page = pool.get_page(Some(T1), pk(1), LockMode::Shared).unwrap();
        assert_eq!(page.read().as_slice()[0], 1);
        assert_eq!(pool.resident_count(), 1);
        assert_eq!(pool.stats().snapshot().cache_misses, 1);
    }

    #[test]
    fn test_hit_skips_store() {
        let (pool, _dir) = create_pool(4, 1);

        pool.get_page(Some(T1), pk(0), LockMode::Shared).unwrap();
        pool.get_page(Some(T1), pk(0), LockMode::Shared).unwrap();

        let snap = pool.stats().snapshot();
        assert_eq!(snap.cache_misses, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.pages_read, 1);
    }

    #[test]
    fn test_within_capacity_no_eviction() {
        let (pool, _dir) = create_pool(3, 3);

        for i in 0..3 {
            pool.get_page(Some(T1), pk(i), LockMode::Shared).unwrap();
        }

        assert_eq!(pool.resident_count(), 3);
        assert_eq!(pool.stats().snapshot().evictions, 0);
        for i in 0..3 {
            assert!(pool.is_resident(pk(i)));
        }
    }

    #[test]
    fn test_lru_eviction_order() {
        // Load A, B with capacity 2 and release both, then C: A is the LRU
        // unpinned page.
        let (pool, _dir) = create_pool(2, 3);

        pool.get_page(Some(T1), pk(0), LockMode::Shared).unwrap();
        pool.get_page(Some(T1), pk(1), LockMode::Shared).unwrap();
        pool.release_page(T1, pk(0));
        pool.release_page(T1, pk(1));
        pool.get_page(Some(T1), pk(2), LockMode::Shared).unwrap();

        assert!(!pool.is_resident(pk(0)));
        assert!(pool.is_resident(pk(1)));
        assert!(pool.is_resident(pk(2)));
        assert_eq!(pool.stats().snapshot().evictions, 1);
    }

    #[test]
    fn test_recency_refresh_protects_page() {
        let (pool, _dir) = create_pool(2, 3);

        pool.get_page(Some(T1), pk(0), LockMode::Shared).unwrap();
        pool.release_page(T1, pk(0));
        pool.get_page(Some(T1), pk(1), LockMode::Shared).unwrap();
        pool.release_page(T1, pk(1));
        // Touch page 0 again: page 1 becomes the LRU.
        pool.get_page(Some(T1), pk(0), LockMode::Shared).unwrap();
        pool.release_page(T1, pk(0));
        pool.get_page(Some(T1), pk(2), LockMode::Shared).unwrap();

        assert!(pool.is_resident(pk(0)));
        assert!(!pool.is_resident(pk(1)));
    }

    #[test]
    fn test_dirty_page_never_evicted() {
        let (pool, _dir) = create_pool(2, 3);

        let page = pool.get_page(Some(T1), pk(0), LockMode::Exclusive).unwrap();
        {
            let mut page = page.write();
            page.as_mut_slice()[0] = 0xFF;
            page.mark_dirty(T1);
        }

        pool.get_page(Some(T2), pk(1), LockMode::Shared).unwrap();
        pool.release_page(T2, pk(1));
        // Page 0 is the LRU but dirty; page 1 must be the victim.
        pool.get_page(Some(T2), pk(2), LockMode::Shared).unwrap();

        assert!(pool.is_resident(pk(0)));
        assert!(!pool.is_resident(pk(1)));
    }

    #[test]
    fn test_locked_clean_page_never_evicted() {
        let (pool, _dir) = create_pool(1, 2);

        // T1 holds the exclusive lock but has not written yet: the page is
        // clean, and still must not be evicted out from under the lock.
        pool.get_page(Some(T1), pk(0), LockMode::Exclusive).unwrap();

        let err = pool.get_page(Some(T2), pk(1), LockMode::Shared).unwrap_err();
        assert!(matches!(err, Error::CacheExhausted));
        assert!(pool.is_resident(pk(0)));
    }

    #[test]
    fn test_cache_exhausted_when_all_dirty() {
        let (pool, _dir) = create_pool(1, 2);

        let page = pool.get_page(Some(T1), pk(0), LockMode::Exclusive).unwrap();
        {
            let mut page = page.write();
            page.as_mut_slice()[0] = 0xAA;
            page.mark_dirty(T1);
        }

        let err = pool.get_page(Some(T2), pk(1), LockMode::Shared).unwrap_err();
        assert!(matches!(err, Error::CacheExhausted));
        // The dirty page survived the failed eviction scan.
        assert!(pool.is_resident(pk(0)));
    }

    #[test]
    fn test_lock_timeout_propagates() {
        let (pool, _dir) = create_pool(2, 1);

        pool.get_page(Some(T1), pk(0), LockMode::Shared).unwrap();
        let err = pool.get_page(Some(T2), pk(0), LockMode::Exclusive).unwrap_err();

        assert!(matches!(err, Error::TransactionAborted(t) if t == T2));
        assert_eq!(pool.stats().snapshot().lock_timeouts, 1);
        assert!(pool.holds_lock(T1, pk(0), LockMode::Shared));
    }

    #[test]
    fn test_recovery_access_takes_no_lock() {
        let (pool, _dir) = create_pool(2, 1);

        pool.get_page(Some(T1), pk(0), LockMode::Exclusive).unwrap();
        // None-tid access succeeds even though T1 holds the page.
        let page = pool.get_page(None, pk(0), LockMode::Shared).unwrap();
        assert_eq!(page.read().as_slice()[0], 0);
    }

    #[test]
    fn test_missing_page_not_cached() {
        let (pool, _dir) = create_pool(2, 1);

        let err = pool.get_page(Some(T1), pk(9), LockMode::Shared).unwrap_err();
        assert!(matches!(err, Error::PageNotFound(_)));
        assert_eq!(pool.resident_count(), 0);
    }

    #[test]
    fn test_evict_force_drops_without_flush() {
        let (pool, _dir) = create_pool(2, 1);

        let page = pool.get_page(Some(T1), pk(0), LockMode::Exclusive).unwrap();
        {
            let mut page = page.write();
            page.as_mut_slice()[0] = 0x77;
            page.mark_dirty(T1);
        }

        pool.evict_force(pk(0));
        assert!(!pool.is_resident(pk(0)));
        // Content on disk is untouched.
        assert_eq!(pool.store().read_page(pk(0)).unwrap()[0], 0);
    }

    #[test]
    fn test_flush_all_writes_dirty_pages() {
        let (pool, _dir) = create_pool(2, 2);

        let page = pool.get_page(Some(T1), pk(0), LockMode::Exclusive).unwrap();
        {
            let mut page = page.write();
            page.as_mut_slice()[0] = 0x55;
            page.mark_dirty(T1);
        }
        pool.get_page(Some(T1), pk(1), LockMode::Shared).unwrap();

        pool.flush_all().unwrap();

        assert_eq!(pool.store().read_page(pk(0)).unwrap()[0], 0x55);
        assert_eq!(pool.stats().snapshot().pages_written, 1);
        assert!(!page.read().is_dirty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Any access sequence over at most `capacity` distinct pages never
        /// evicts, and every touched page stays resident.
        #[test]
        fn prop_no_eviction_within_capacity(accesses in prop::collection::vec(0u32..4, 1..40)) {
            let (pool, _dir) = create_pool(4, 4);

            for page_no in &accesses {
                pool.get_page(Some(T1), pk(*page_no), LockMode::Shared).unwrap();
            }

            prop_assert_eq!(pool.stats().snapshot().evictions, 0);
            for page_no in &accesses {
                prop_assert!(pool.is_resident(pk(*page_no)));
            }
        }
    }
}
