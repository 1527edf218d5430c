//! Bipartite transaction ↔ page ownership graph.

use std::collections::{HashMap, HashSet};

use crate::common::{PageKey, TxnId};

/// Access mode recorded on a lock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl LockMode {
    /// Whether holding `self` already satisfies a request for `wanted`.
    #[inline]
    pub fn covers(self, wanted: LockMode) -> bool {
        self == LockMode::Exclusive || wanted == LockMode::Shared
    }
}

/// The bipartite relation between transactions and the pages they hold,
/// each edge tagged with its mode.
///
/// Adjacency is keyed by the value-type identifiers themselves ([`TxnId`],
/// [`PageKey`]), so logical identity and map identity are the same thing.
/// Invariant: a page has either any number of shared edges or exactly one
/// exclusive edge, never both. Pure in-memory bookkeeping, no I/O.
#[derive(Debug, Default)]
pub struct LockGraph {
    by_txn: HashMap<TxnId, HashMap<PageKey, LockMode>>,
    by_page: HashMap<PageKey, HashSet<TxnId>>,
}

impl LockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge. A no-op if an edge already covering `mode` exists;
    /// an exclusive insert over the caller's own shared edge upgrades it
    /// in place.
    pub fn add_edge(&mut self, tid: TxnId, key: PageKey, mode: LockMode) {
        let edges = self.by_txn.entry(tid).or_default();
        match edges.get(&key) {
            Some(held) if held.covers(mode) => return,
            _ => {}
        }
        edges.insert(key, mode);
        self.by_page.entry(key).or_default().insert(tid);
    }

    /// Remove an edge. The edge must exist.
    pub fn remove_edge(&mut self, tid: TxnId, key: PageKey) {
        let edges = self.by_txn.get_mut(&tid);
        assert!(
            edges.as_ref().is_some_and(|e| e.contains_key(&key)),
            "removing a lock edge that was never added: {tid} -> {key}"
        );
        let edges = edges.expect("asserted above");
        edges.remove(&key);
        if edges.is_empty() {
            self.by_txn.remove(&tid);
        }

        if let Some(holders) = self.by_page.get_mut(&key) {
            holders.remove(&tid);
            if holders.is_empty() {
                self.by_page.remove(&key);
            }
        }
    }

    /// The mode `tid` holds on `key`, if any.
    pub fn mode_of(&self, tid: TxnId, key: PageKey) -> Option<LockMode> {
        self.by_txn.get(&tid).and_then(|edges| edges.get(&key)).copied()
    }

    /// Every page `tid` currently holds.
    pub fn pages_held_by(&self, tid: TxnId) -> HashSet<PageKey> {
        self.by_txn
            .get(&tid)
            .map(|edges| edges.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every transaction currently holding `key`.
    pub fn holders_of(&self, key: PageKey) -> HashSet<TxnId> {
        self.by_page.get(&key).cloned().unwrap_or_default()
    }

    /// Number of transactions holding `key`.
    pub fn holder_count(&self, key: PageKey) -> usize {
        self.by_page.get(&key).map_or(0, HashSet::len)
    }

    /// True iff exactly one transaction holds `key` and its edge is
    /// exclusive.
    pub fn is_exclusively_held(&self, key: PageKey) -> bool {
        let Some(holders) = self.by_page.get(&key) else {
            return false;
        };
        if holders.len() != 1 {
            return false;
        }
        let tid = holders.iter().next().expect("len checked");
        self.mode_of(*tid, key) == Some(LockMode::Exclusive)
    }

    pub fn holds_exclusive(&self, tid: TxnId, key: PageKey) -> bool {
        self.mode_of(tid, key) == Some(LockMode::Exclusive)
    }

    pub fn holds_shared(&self, tid: TxnId, key: PageKey) -> bool {
        self.mode_of(tid, key) == Some(LockMode::Shared)
    }

    /// Remove every edge incident to `tid`. Pages left with no holders are
    /// garbage-collected from the reverse index.
    pub fn transaction_complete(&mut self, tid: TxnId) {
        let Some(edges) = self.by_txn.remove(&tid) else {
            return;
        };
        for key in edges.keys() {
            if let Some(holders) = self.by_page.get_mut(key) {
                holders.remove(&tid);
                if holders.is_empty() {
                    self.by_page.remove(key);
                }
            }
        }
    }

    /// True when no edges exist at all.
    pub fn is_empty(&self) -> bool {
        self.by_txn.is_empty() && self.by_page.is_empty()
    }
}
