//! Conditions and their verdicts.
//!
//! A check accepts anything implementing [`Condition`]: a plain `bool`, or a `Result`
//! whose error means the check itself raised instead of evaluating to false. Panics
//! inside a lazily evaluated condition are turned into a [`Cause`] by the dispatcher.

use std::any::Any;
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How a single check came out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The condition evaluated to true.
    Held,
    /// The condition evaluated to false.
    Failed,
    /// Evaluating the condition produced an error or panicked.
    Raised(Cause),
}

impl Verdict {
    pub fn held(&self) -> bool {
        matches!(self, Verdict::Held)
    }
}

/// Something a check can be made against.
pub trait Condition {
    fn verdict(self) -> Verdict;
}

impl Condition for bool {
    fn verdict(self) -> Verdict {
        if self {
            Verdict::Held
        } else {
            Verdict::Failed
        }
    }
}

impl<E: Error + 'static> Condition for Result<bool, E> {
    fn verdict(self) -> Verdict {
        match self {
            Ok(held) => held.verdict(),
            Err(error) => Verdict::Raised(Cause::from_error(&error)),
        }
    }
}

impl<E: Error + 'static> Condition for Result<(), E> {
    fn verdict(self) -> Verdict {
        match self {
            Ok(()) => Verdict::Held,
            Err(error) => Verdict::Raised(Cause::from_error(&error)),
        }
    }
}

impl Condition for Verdict {
    fn verdict(self) -> Verdict {
        self
    }
}

/// The error a condition raised, flattened to text so entries stay immutable and
/// `Send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    kind: String,
    message: String,
    chain: Vec<String>,
}

impl Cause {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            chain: Vec::new(),
        }
    }

    /// Captures an error's type, message and its full `source()` chain.
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let mut chain = Vec::new();
        let mut next = error.source();
        while let Some(source) = next {
            chain.push(source.to_string());
            next = source.source();
        }
        Self {
            kind: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            chain,
        }
    }

    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::new("panic", panic_message(payload))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Messages of the underlying sources, outermost first.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
