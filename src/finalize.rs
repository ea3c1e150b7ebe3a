//! Finalization: turns a test's drained entries, any unrelated failure, and the host's
//! expected-failure marking into exactly one [`Outcome`].
//!
//! | unrelated failure | entries | expectation  | outcome                                 |
//! |-------------------|---------|--------------|-----------------------------------------|
//! | none              | none    | pass         | `Passed`                                |
//! | none              | some    | pass         | `Failed(Assumptions)`                   |
//! | present           | none    | pass         | `Failed(Error)`, unchanged              |
//! | present           | some    | pass         | `Failed(Error)` + assumptions section   |
//! | present           | none    | xfail        | `XFailed` with the marker's reason      |
//! | any               | some    | xfail        | `XFailed`, reason includes the entries  |
//! | none              | none    | xfail        | `XPassed`, or `Failed` when strict      |

use crate::entry::AssumptionEntry;
use crate::outcome::{AggregateFailure, Expectation, Failure, Outcome, TestFailure};

/// Title of the section appended to an unrelated failure's report.
pub const ASSUMPTIONS_SECTION: &str = "Failed Assumptions";

pub fn resolve(
    entries: Vec<AssumptionEntry>,
    existing: Option<TestFailure>,
    expectation: &Expectation,
) -> Outcome {
    let aggregate = AggregateFailure::from_entries(entries);
    match expectation {
        Expectation::Pass => match (existing, aggregate) {
            (None, None) => Outcome::Passed,
            (None, Some(aggregate)) => Outcome::Failed(Failure::Assumptions(aggregate)),
            (Some(failure), None) => Outcome::Failed(Failure::Error(failure)),
            (Some(mut failure), Some(aggregate)) => {
                failure.add_section(ASSUMPTIONS_SECTION, aggregate.to_string());
                Outcome::Failed(Failure::Error(failure))
            }
        },
        Expectation::Fail(xfail) => match (existing, aggregate) {
            (_, Some(aggregate)) => Outcome::XFailed {
                reason: format!("{}\n\n{aggregate}", xfail.reason),
            },
            (Some(_), None) => Outcome::XFailed {
                reason: xfail.reason.clone(),
            },
            (None, None) if xfail.strict => Outcome::Failed(Failure::UnexpectedPass {
                reason: xfail.reason.clone(),
            }),
            (None, None) => Outcome::XPassed {
                reason: xfail.reason.clone(),
            },
        },
    }
}
