//! Outcome types surfaced to the host at the end of a test.

use std::any::Any;
use std::error::Error;
use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};

use crate::condition::panic_message;
use crate::entry::AssumptionEntry;

// ============================================================================
// EXPECTED-FAILURE MARKING
// ============================================================================

/// What the host expects a test to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    #[default]
    Pass,
    Fail(XFail),
}

impl Expectation {
    /// Expected to fail; an unexpected pass is reported as `XPASS`.
    pub fn xfail(reason: impl Into<String>) -> Self {
        Self::Fail(XFail {
            reason: reason.into(),
            strict: false,
        })
    }

    /// Expected to fail; an unexpected pass fails the test.
    pub fn strict_xfail(reason: impl Into<String>) -> Self {
        Self::Fail(XFail {
            reason: reason.into(),
            strict: true,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XFail {
    pub reason: String,
    pub strict: bool,
}

// ============================================================================
// UNRELATED FAILURES
// ============================================================================

/// A supplementary block of text attached to a failure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub text: String,
}

/// A failure that did not come from an assumption: a panic, an error returned from the
/// test body, or anything else the host caught.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    kind: String,
    message: String,
    sections: Vec<ReportSection>,
}

impl TestFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            sections: Vec::new(),
        }
    }

    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::new("panic", panic_message(payload))
    }

    /// Captures the error's type and message, with its source chain as a section.
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let mut failure = Self::new(std::any::type_name::<E>(), error.to_string());
        let mut chain = Vec::new();
        let mut next = error.source();
        while let Some(source) = next {
            chain.push(format!("caused by: {source}"));
            next = source.source();
        }
        if !chain.is_empty() {
            failure.add_section("Error chain", chain.join("\n"));
        }
        failure
    }

    /// Appends supplementary text to this failure's report.
    pub fn add_section(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.sections.push(ReportSection {
            title: title.into(),
            text: text.into(),
        });
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }
}

impl fmt::Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        for section in &self.sections {
            write!(f, "\n\n--- {} ---\n{}", section.title, section.text)?;
        }
        Ok(())
    }
}

// ============================================================================
// AGGREGATE FAILURE
// ============================================================================

/// Every failed check of one test, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateFailure {
    count: usize,
    entries: Vec<AssumptionEntry>,
}

impl AggregateFailure {
    /// `None` when there is nothing to aggregate.
    pub fn from_entries(entries: Vec<AssumptionEntry>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self {
            count: entries.len(),
            entries,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn entries(&self) -> &[AssumptionEntry] {
        &self.entries
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Failed Assumptions:", self.count)?;
        for entry in &self.entries {
            write!(f, "\n\n{entry}")?;
        }
        Ok(())
    }
}

impl Error for AggregateFailure {}

impl Diagnostic for AggregateFailure {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("assume::failed_assumptions"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let noun = if self.count == 1 { "check" } else { "checks" };
        Some(Box::new(format!(
            "{} soft {noun} failed; each is listed with its call site",
            self.count
        )))
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Why a test failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", content = "detail", rename_all = "snake_case")]
pub enum Failure {
    /// Only assumptions failed.
    Assumptions(AggregateFailure),
    /// An unrelated failure; any failed assumptions are appended as a section.
    Error(TestFailure),
    /// A strict expected-failure test passed.
    UnexpectedPass { reason: String },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Assumptions(aggregate) => write!(f, "{aggregate}"),
            Failure::Error(failure) => write!(f, "{failure}"),
            Failure::UnexpectedPass { reason } => write!(f, "[XPASS(strict)] {reason}"),
        }
    }
}

/// The single result of finalizing a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed(Failure),
    XFailed { reason: String },
    XPassed { reason: String },
}

impl Outcome {
    /// Short status label, as a test runner prints it.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASS",
            Outcome::Failed(_) => "FAIL",
            Outcome::XFailed { .. } => "XFAIL",
            Outcome::XPassed { .. } => "XPASS",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => f.write_str("PASS"),
            Outcome::Failed(failure) => write!(f, "FAIL\n{failure}"),
            Outcome::XFailed { reason } => write!(f, "XFAIL {reason}"),
            Outcome::XPassed { reason } => write!(f, "XPASS {reason}"),
        }
    }
}
