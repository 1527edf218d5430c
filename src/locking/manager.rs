//! Lock manager - per-page admission control.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::{Error, PageKey, Result, TxnId};
use crate::locking::{LockGraph, LockMode, PageLatch};

/// Grants and tracks shared/exclusive page locks for transactions.
///
/// Admission runs on per-page [`PageLatch`]es, bookkeeping lives in a
/// [`LockGraph`]. Graph mutations always happen under the graph mutex and
/// never while blocked on a latch, so a waiting request cannot stall
/// unrelated acquires or releases.
///
/// Deadlocks are not detected; they are avoided by bounding every latch
/// wait. A request that times out fails with `Error::TransactionAborted`
/// and the caller is expected to abort that transaction. The timeout can
/// fire on transactions that are merely slow, not deadlocked — that is the
/// accepted cost of skipping cycle detection.
pub struct LockManager {
    graph: Mutex<LockGraph>,
    latches: Mutex<HashMap<PageKey, Arc<PageLatch>>>,
    timeout: Duration,
}

impl LockManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            graph: Mutex::new(LockGraph::new()),
            latches: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn latch_for(&self, key: PageKey) -> Arc<PageLatch> {
        let mut latches = self.latches.lock();
        Arc::clone(latches.entry(key).or_default())
    }

    /// Acquire `mode` on `key` for `tid`.
    ///
    /// Reentrant: holding the requested mode (or stronger) returns
    /// immediately. A transaction holding the sole shared lock on a page is
    /// upgrade-eligible: its slot is surrendered first, then the full budget
    /// is requested. An upgrade either fully succeeds or times out; there is
    /// no partially-acquired state, though a timed-out upgrade has given up
    /// its shared lock and the transaction must abort.
    pub fn acquire(&self, tid: TxnId, key: PageKey, mode: LockMode) -> Result<()> {
        match mode {
            LockMode::Shared => self.acquire_shared(tid, key),
            LockMode::Exclusive => self.acquire_exclusive(tid, key),
        }
    }

    fn acquire_shared(&self, tid: TxnId, key: PageKey) -> Result<()> {
        {
            let graph = self.graph.lock();
            if graph.mode_of(tid, key).is_some() {
                // Shared or exclusive: both cover a shared request.
                return Ok(());
            }
        }

        let latch = self.latch_for(key);
        if !latch.acquire_shared(self.timeout) {
            debug!(%tid, %key, "shared lock wait timed out");
            return Err(Error::TransactionAborted(tid));
        }
        self.graph.lock().add_edge(tid, key, LockMode::Shared);
        Ok(())
    }

    fn acquire_exclusive(&self, tid: TxnId, key: PageKey) -> Result<()> {
        let latch = self.latch_for(key);

        let upgrade = {
            let graph = self.graph.lock();
            match graph.mode_of(tid, key) {
                Some(LockMode::Exclusive) => return Ok(()),
                Some(LockMode::Shared) => graph.holder_count(key) == 1,
                None => false,
            }
        };

        if upgrade {
            // Sole shared holder: give the slot back before requesting the
            // full budget, otherwise our own slot blocks us. Another reader
            // may slip in between release and reacquire; then we time out
            // and abort, never holding a half-upgraded lock.
            latch.release_shared();
            self.graph.lock().remove_edge(tid, key);
        }

        if !latch.acquire_exclusive(self.timeout) {
            debug!(%tid, %key, upgrade, "exclusive lock wait timed out");
            return Err(Error::TransactionAborted(tid));
        }
        self.graph.lock().add_edge(tid, key, LockMode::Exclusive);
        Ok(())
    }

    /// Release `tid`'s lock on `key`: the full budget if it held exclusive,
    /// one slot if shared. A no-op if no lock is held.
    pub fn release(&self, tid: TxnId, key: PageKey) {
        let mode = {
            let mut graph = self.graph.lock();
            let mode = graph.mode_of(tid, key);
            if mode.is_some() {
                graph.remove_edge(tid, key);
            }
            mode
        };

        let latch = self.latch_for(key);
        match mode {
            Some(LockMode::Exclusive) => latch.release_exclusive(),
            Some(LockMode::Shared) => latch.release_shared(),
            None => {}
        }
        drop(latch);
        self.reclaim_latch(key);
    }

    /// Drop `key`'s latch once nothing references it anymore.
    ///
    /// A blocked waiter keeps its own `Arc` clone of the latch, so the
    /// strong count stays above one and reclamation is deferred until that
    /// waiter is done. Removing a latch someone still waits on would let a
    /// later request mint a second latch for the same page.
    fn reclaim_latch(&self, key: PageKey) {
        let mut latches = self.latches.lock();
        if let Some(latch) = latches.get(&key) {
            if Arc::strong_count(latch) == 1 && latch.readers() == 0 && !latch.has_writer() {
                latches.remove(&key);
            }
        }
    }

    /// Release every lock `tid` holds, then retire it from the graph.
    pub fn release_all(&self, tid: TxnId) {
        for key in self.pages_held_by(tid) {
            self.release(tid, key);
        }
        self.graph.lock().transaction_complete(tid);
    }

    /// Whether `tid` holds `mode` (or stronger) on `key`.
    pub fn holds_lock(&self, tid: TxnId, key: PageKey, mode: LockMode) -> bool {
        self.graph
            .lock()
            .mode_of(tid, key)
            .is_some_and(|held| held.covers(mode))
    }

    pub fn holds_exclusive(&self, tid: TxnId, key: PageKey) -> bool {
        self.graph.lock().holds_exclusive(tid, key)
    }

    /// Whether any transaction holds `key` exclusively.
    pub fn has_exclusive(&self, key: PageKey) -> bool {
        self.graph.lock().is_exclusively_held(key)
    }

    /// Whether any transaction holds `key` in any mode.
    pub fn is_held(&self, key: PageKey) -> bool {
        self.graph.lock().holder_count(key) > 0
    }

    pub fn pages_held_by(&self, tid: TxnId) -> HashSet<PageKey> {
        self.graph.lock().pages_held_by(tid)
    }

    pub fn holders_of(&self, key: PageKey) -> HashSet<TxnId> {
        self.graph.lock().holders_of(key)
    }
}
