//! The assumption context: dispatch of checks, finalization, and the per-test scope.
//!
//! An [`Assumptions`] value is injected into every check rather than reached through
//! ambient state. Tests get a [`TestScope`] from [`Assumptions::begin`] (or run a body
//! through [`Assumptions::run`]) and make their checks against it.

use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, trace, warn};

use crate::condition::{Cause, Condition, Verdict};
use crate::config::AssumeConfig;
use crate::entry::AssumptionEntry;
use crate::finalize;
use crate::formatter;
use crate::observers::{AssumptionObserver, Observers};
use crate::outcome::{Expectation, Outcome, TestFailure};
use crate::registry::{AssumptionRegistry, TestId};
use crate::site::CallSite;

static GLOBAL: Lazy<Assumptions> = Lazy::new(|| {
    let config = AssumeConfig::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring assumption configuration");
        AssumeConfig::default()
    });
    Assumptions::new(config)
});

/// Registry, observers and configuration for a set of tests.
#[derive(Debug, Default)]
pub struct Assumptions {
    registry: AssumptionRegistry,
    observers: Observers,
    config: AssumeConfig,
}

impl Assumptions {
    pub fn new(config: AssumeConfig) -> Self {
        Self {
            registry: AssumptionRegistry::new(),
            observers: Observers::new(),
            config,
        }
    }

    /// The process-wide context, configured from the environment on first use.
    pub fn global() -> &'static Assumptions {
        &GLOBAL
    }

    pub fn config(&self) -> &AssumeConfig {
        &self.config
    }

    pub fn registry(&self) -> &AssumptionRegistry {
        &self.registry
    }

    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    pub fn observe(&self, observer: Arc<dyn AssumptionObserver>) {
        self.observers.register(observer);
    }

    /// Registers a callback for every check that holds.
    pub fn on_pass<F>(&self, f: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.observers.on_pass(f);
    }

    /// Registers a callback for every check that fails, after its entry is recorded.
    pub fn on_fail<F>(&self, f: F)
    where
        F: Fn(u32, &AssumptionEntry) + Send + Sync + 'static,
    {
        self.observers.on_fail(f);
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Resets the slot for `id` and returns a scope that checks against it.
    pub fn begin(&self, id: impl Into<TestId>) -> TestScope<'_> {
        let id = id.into();
        debug!(test = %id, "assumption scope started");
        self.registry.reset(&id);
        TestScope {
            context: self,
            id,
            finished: false,
        }
    }

    /// Checks `condition` for test `id`, recording it on failure. Never panics on a
    /// failing condition; returns whether it held.
    ///
    /// `id` must have been started with [`begin`](Self::begin) and not yet finalized;
    /// otherwise the failure is logged and not recorded.
    pub fn check<C: Condition>(
        &self,
        id: &TestId,
        site: &CallSite,
        condition: C,
        message: Option<String>,
    ) -> bool {
        self.record(id, site, condition.verdict(), message)
    }

    /// Like [`check`](Self::check), but evaluates the condition itself so that a panic
    /// inside it is recorded as a failure instead of unwinding into the test.
    pub fn check_with<C, F>(
        &self,
        id: &TestId,
        site: &CallSite,
        condition: F,
        message: Option<String>,
    ) -> bool
    where
        C: Condition,
        F: FnOnce() -> C,
    {
        let verdict = match panic::catch_unwind(AssertUnwindSafe(condition)) {
            Ok(condition) => condition.verdict(),
            Err(payload) => Verdict::Raised(Cause::from_panic(payload.as_ref())),
        };
        self.record(id, site, verdict, message)
    }

    fn record(
        &self,
        id: &TestId,
        site: &CallSite,
        verdict: Verdict,
        message: Option<String>,
    ) -> bool {
        if verdict.held() {
            trace!(test = %id, site = %site, "assumption held");
            self.observers.notify_pass(site.line());
            return true;
        }

        let entry = formatter::format_entry(
            &verdict,
            message.as_deref(),
            site,
            self.config.format_options(),
        );
        trace!(test = %id, site = %site, message = entry.message(), "assumption failed");
        if !self.registry.append(id, entry.clone()) {
            warn!(
                test = %id,
                site = %site,
                "assumption failed outside a started test; call `begin` first"
            );
        }
        self.observers.notify_fail(site.line(), &entry);
        false
    }

    /// Drains the slot for `id` and resolves the test's single outcome.
    pub fn finalize(
        &self,
        id: &TestId,
        existing: Option<TestFailure>,
        expectation: &Expectation,
    ) -> Outcome {
        let entries = self.registry.drain(id);
        debug!(
            test = %id,
            failed_assumptions = entries.len(),
            unrelated_failure = existing.is_some(),
            "finalizing assumptions"
        );
        finalize::resolve(entries, existing, expectation)
    }

    /// Runs `body` as test `id`: resets, runs under `catch_unwind`, and finalizes
    /// exactly once whether the body returned, failed or panicked.
    pub fn run<R, F>(&self, id: impl Into<TestId>, expectation: &Expectation, body: F) -> Outcome
    where
        R: TestBodyResult,
        F: FnOnce(&TestScope<'_>) -> R,
    {
        let scope = self.begin(id);
        let existing = match panic::catch_unwind(AssertUnwindSafe(|| body(&scope))) {
            Ok(result) => result.into_failure(),
            Err(payload) => Some(TestFailure::from_panic(payload.as_ref())),
        };
        scope.finish(existing, expectation)
    }
}

// ============================================================================
// TEST SCOPE
// ============================================================================

/// A running test's handle onto its context.
///
/// Dropping a scope without [`finish`](TestScope::finish) still drains its slot, so an
/// abandoned test cannot leak entries into a later one.
#[derive(Debug)]
pub struct TestScope<'a> {
    context: &'a Assumptions,
    id: TestId,
    finished: bool,
}

impl TestScope<'_> {
    pub fn id(&self) -> &TestId {
        &self.id
    }

    pub fn check<C: Condition>(&self, site: CallSite, condition: C, message: Option<String>) -> bool {
        self.context.check(&self.id, &site, condition, message)
    }

    pub fn check_with<C, F>(&self, site: CallSite, condition: F, message: Option<String>) -> bool
    where
        C: Condition,
        F: FnOnce() -> C,
    {
        self.context.check_with(&self.id, &site, condition, message)
    }

    /// Failed checks recorded so far.
    pub fn failures(&self) -> usize {
        self.context.registry.len(&self.id)
    }

    pub fn finish(mut self, existing: Option<TestFailure>, expectation: &Expectation) -> Outcome {
        self.finished = true;
        self.context.finalize(&self.id, existing, expectation)
    }
}

impl Drop for TestScope<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let dropped = self.context.registry.drain(&self.id);
        if !dropped.is_empty() {
            warn!(
                test = %self.id,
                failed_assumptions = dropped.len(),
                "assumption scope dropped without finalization"
            );
        }
    }
}

// ============================================================================
// TEST BODIES
// ============================================================================

/// What a test body may return: nothing, or a `Result` whose error is an unrelated
/// failure.
pub trait TestBodyResult {
    fn into_failure(self) -> Option<TestFailure>;
}

impl TestBodyResult for () {
    fn into_failure(self) -> Option<TestFailure> {
        None
    }
}

impl<E: Error + 'static> TestBodyResult for Result<(), E> {
    fn into_failure(self) -> Option<TestFailure> {
        self.err().map(|error| TestFailure::from_error(&error))
    }
}

impl TestBodyResult for Result<(), TestFailure> {
    fn into_failure(self) -> Option<TestFailure> {
        self.err()
    }
}

/// Runs `body` against the global context for use inside a `#[test]` function.
///
/// Panics at the end with the full report when any check failed, or re-panics with the
/// body's own panic message (plus the assumption summary) when the body panicked.
pub fn soft<R, F>(body: F)
where
    R: TestBodyResult,
    F: FnOnce(&TestScope<'_>) -> R,
{
    let outcome = Assumptions::global().run(TestId::from_current_thread(), &Expectation::Pass, body);
    if let Outcome::Failed(failure) = outcome {
        panic!("{failure}");
    }
}
