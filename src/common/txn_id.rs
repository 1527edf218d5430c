//! Transaction identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a transaction for its lifetime.
///
/// Ids come from a process-wide monotonic counter and are never reused:
/// once a transaction reaches COMPLETE, its id is retired. Reusing an id
/// would let a new transaction inherit lock-graph edges of a dead one.
///
/// # Example
/// ```
/// use latchdb::TxnId;
///
/// let a = TxnId::fresh();
/// let b = TxnId::fresh();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxnId(pub u64);

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(0);

impl TxnId {
    /// Allocate the next transaction id.
    pub fn fresh() -> Self {
        TxnId(NEXT_TXN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_id_fresh_is_unique() {
        let ids: Vec<TxnId> = (0..100).map(|_| TxnId::fresh()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_txn_id_display() {
        assert_eq!(format!("{}", TxnId(42)), "Txn(42)");
    }
}
