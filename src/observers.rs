//! Pass/fail observers.
//!
//! Observers are notified synchronously, in registration order, before the check that
//! triggered them returns. A panicking observer is logged and skipped; it never changes
//! the check's result, the remaining observers, or finalization.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::condition::panic_message;
use crate::entry::AssumptionEntry;

/// Receives the outcome of every check.
pub trait AssumptionObserver: Send + Sync {
    /// A check held. There is no entry for passing checks.
    fn on_pass(&self, _line: u32) {}

    /// A check failed and `entry` has been recorded.
    fn on_fail(&self, _line: u32, _entry: &AssumptionEntry) {}
}

struct OnPass<F>(F);

impl<F> AssumptionObserver for OnPass<F>
where
    F: Fn(u32) + Send + Sync,
{
    fn on_pass(&self, line: u32) {
        (self.0)(line)
    }
}

struct OnFail<F>(F);

impl<F> AssumptionObserver for OnFail<F>
where
    F: Fn(u32, &AssumptionEntry) + Send + Sync,
{
    fn on_fail(&self, line: u32, entry: &AssumptionEntry) {
        (self.0)(line, entry)
    }
}

/// The registered observers, in registration order.
#[derive(Default)]
pub struct Observers {
    list: RwLock<Vec<Arc<dyn AssumptionObserver>>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn AssumptionObserver>) {
        self.list
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn on_pass<F>(&self, f: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.register(Arc::new(OnPass(f)));
    }

    pub fn on_fail<F>(&self, f: F)
    where
        F: Fn(u32, &AssumptionEntry) + Send + Sync + 'static,
    {
        self.register(Arc::new(OnFail(f)));
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Observers run outside the lock so they may register further observers.
    fn snapshot(&self) -> Vec<Arc<dyn AssumptionObserver>> {
        self.list
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn notify_pass(&self, line: u32) {
        for observer in self.snapshot() {
            guarded("pass", line, || observer.on_pass(line));
        }
    }

    pub(crate) fn notify_fail(&self, line: u32, entry: &AssumptionEntry) {
        for observer in self.snapshot() {
            guarded("fail", line, || observer.on_fail(line, entry));
        }
    }
}

fn guarded(event: &str, line: u32, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        warn!(
            event,
            line,
            panic = %panic_message(payload.as_ref()),
            "assumption observer panicked"
        );
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.len())
            .finish()
    }
}
