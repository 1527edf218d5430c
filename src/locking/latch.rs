//! Per-page counting latch.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::common::config::MAX_SHARED_SLOTS;

#[derive(Debug, Default)]
struct LatchState {
    readers: usize,
    writer: bool,
}

/// The admission budget of one page: [`MAX_SHARED_SLOTS`] reader slots, and
/// a writer that needs the whole budget to itself.
///
/// This is an explicit reader-count + writer-flag under a mutex and condvar,
/// not a semaphore. A semaphore's permit count conflates "how many holders"
/// with "is anyone exclusive"; keeping the two separate makes the state
/// inspectable and the invariants checkable.
///
/// All waits are bounded: a request that cannot be granted by its deadline
/// returns `false` and the lock manager turns that into a transaction
/// abort. Blocking forever is never an option here.
#[derive(Debug, Default)]
pub struct PageLatch {
    state: Mutex<LatchState>,
    cond: Condvar,
}

impl PageLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve one reader slot. Returns `false` on timeout.
    pub fn acquire_shared(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut st = self.state.lock();
        loop {
            if !st.writer && st.readers < MAX_SHARED_SLOTS {
                st.readers += 1;
                return true;
            }
            if self.cond.wait_until(&mut st, deadline).timed_out() {
                // Re-check once: the grant may have raced the timeout.
                if !st.writer && st.readers < MAX_SHARED_SLOTS {
                    st.readers += 1;
                    return true;
                }
                return false;
            }
        }
    }

    /// Reserve the entire budget. Returns `false` on timeout.
    pub fn acquire_exclusive(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut st = self.state.lock();
        loop {
            if !st.writer && st.readers == 0 {
                st.writer = true;
                return true;
            }
            if self.cond.wait_until(&mut st, deadline).timed_out() {
                if !st.writer && st.readers == 0 {
                    st.writer = true;
                    return true;
                }
                return false;
            }
        }
    }

    /// Give back one reader slot.
    ///
    /// # Panics
    /// Panics if no reader slot is held.
    pub fn release_shared(&self) {
        let mut st = self.state.lock();
        assert!(st.readers > 0, "reader count underflow");
        st.readers -= 1;
        drop(st);
        self.cond.notify_all();
    }

    /// Give back the entire budget.
    ///
    /// # Panics
    /// Panics if the writer flag is not set.
    pub fn release_exclusive(&self) {
        let mut st = self.state.lock();
        assert!(st.writer, "releasing an exclusive latch that is not held");
        st.writer = false;
        drop(st);
        self.cond.notify_all();
    }

    /// Current reader count (diagnostics and tests).
    pub fn readers(&self) -> usize {
        self.state.lock().readers
    }

    /// Whether a writer currently holds the budget.
    pub fn has_writer(&self) -> bool {
        self.state.lock().writer
    }
}
