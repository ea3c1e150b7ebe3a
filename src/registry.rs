//! Test-scoped storage for failed checks.
//!
//! Every running test owns one slot, keyed by its [`TestId`]. A slot is created empty by
//! [`reset`](AssumptionRegistry::reset), grows in call order through
//! [`append`](AssumptionRegistry::append), and is removed by
//! [`drain`](AssumptionRegistry::drain), which is the only way entries leave.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::entry::AssumptionEntry;

/// Identity of a running test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestId(String);

impl TestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// An id unique to this call, prefixed with the current thread's name.
    ///
    /// libtest names each test thread after its test, so the prefix is the test path.
    pub fn from_current_thread() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let serial = NEXT.fetch_add(1, Ordering::Relaxed);
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("unnamed");
        Self(format!("{name}#{serial}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Ordered failure entries per running test.
#[derive(Debug, Default)]
pub struct AssumptionRegistry {
    slots: Mutex<HashMap<TestId, Vec<AssumptionEntry>>>,
}

impl AssumptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Slots are only ever appended to or removed whole, so a panic while the lock was
    // held cannot leave a slot half-written.
    fn slots(&self) -> MutexGuard<'_, HashMap<TestId, Vec<AssumptionEntry>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts `id` with an empty slot, discarding anything left over.
    pub fn reset(&self, id: &TestId) {
        self.slots().insert(id.clone(), Vec::new());
    }

    /// Appends `entry` to the open slot for `id`.
    ///
    /// Returns `false` and discards the entry when `id` has no slot, i.e. before
    /// [`reset`](Self::reset) or after [`drain`](Self::drain).
    pub fn append(&self, id: &TestId, entry: AssumptionEntry) -> bool {
        match self.slots().get_mut(id) {
            Some(slot) => {
                slot.push(entry);
                true
            }
            None => false,
        }
    }

    /// Removes and returns everything recorded for `id`, in call order.
    pub fn drain(&self, id: &TestId) -> Vec<AssumptionEntry> {
        self.slots().remove(id).unwrap_or_default()
    }

    /// Number of entries currently held for `id`.
    pub fn len(&self, id: &TestId) -> usize {
        self.slots().get(id).map_or(0, Vec::len)
    }

    /// Number of tests that currently hold a slot.
    pub fn active(&self) -> usize {
        self.slots().len()
    }
}
