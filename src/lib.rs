//! Soft assertions for tests.
//!
//! A failed [`assume!`] is recorded instead of stopping the test. When the test ends,
//! every failed assumption is reported together, after any ordinary panic or error the
//! test produced.
//!
//! ```rust,no_run
//! use assume::{assume, soft};
//!
//! #[test]
//! fn totals() {
//!     soft(|t| {
//!         let (a, b) = (1, 2);
//!         assume!(t, a == b; a, b);
//!         assume!(t, a + b == 4, "sum was {}", a + b);
//!     });
//! }
//! ```
//!
//! Hosts that drive their own test lifecycle use [`Assumptions`] directly:
//! [`Assumptions::begin`] at test start, checks against the returned [`TestScope`], and
//! [`TestScope::finish`] (or [`Assumptions::finalize`]) at teardown.

pub mod condition;
pub mod config;
pub mod context;
pub mod entry;
pub mod errors;
pub mod finalize;
pub mod formatter;
pub mod observers;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod repr;
pub mod site;

pub use crate::condition::{Cause, Condition, Verdict};
pub use crate::config::AssumeConfig;
pub use crate::context::{soft, Assumptions, TestBodyResult, TestScope};
pub use crate::entry::AssumptionEntry;
pub use crate::errors::AssumeError;
pub use crate::observers::AssumptionObserver;
pub use crate::outcome::{
    AggregateFailure, Expectation, Failure, Outcome, ReportSection, TestFailure, XFail,
};
pub use crate::registry::{AssumptionRegistry, TestId};
pub use crate::site::{CallSite, Locals};

/// Checks a condition against a [`TestScope`] without stopping the test.
///
/// Returns whether the condition held. The condition is evaluated inside the check, so
/// a panic while evaluating it is recorded as a failure.
///
/// - `assume!(t, cond)`
/// - `assume!(t, cond, "format {}", args)`
/// - `assume!(t, cond; a, b)` snapshots `a` and `b` for the locals listing
/// - `assume!(t, cond; a, b => "format {}", args)`
#[macro_export]
macro_rules! assume {
    ($scope:expr, $cond:expr; $($var:ident),+ => $($fmt:tt)+) => {
        $scope.check_with(
            $crate::call_site!($cond; $($var),+),
            || $cond,
            Some(format!($($fmt)+)),
        )
    };
    ($scope:expr, $cond:expr; $($var:ident),+ $(,)?) => {
        $scope.check_with($crate::call_site!($cond; $($var),+), || $cond, None)
    };
    ($scope:expr, $cond:expr, $($fmt:tt)+) => {
        $scope.check_with($crate::call_site!($cond), || $cond, Some(format!($($fmt)+)))
    };
    ($scope:expr, $cond:expr $(,)?) => {
        $scope.check_with($crate::call_site!($cond), || $cond, None)
    };
}
