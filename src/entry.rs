use std::fmt;

use serde::{Deserialize, Serialize};

/// One failed check. Passing checks never produce an entry.
///
/// Entries are built by the formatter and are immutable afterwards; the registry owns
/// them until the test is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumptionEntry {
    file: String,
    line: u32,
    message: String,
    rendered_detail: String,
}

impl AssumptionEntry {
    pub(crate) fn new(
        file: impl Into<String>,
        line: u32,
        message: impl Into<String>,
        rendered_detail: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
            rendered_detail: rendered_detail.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// `file:line` of the check that produced this entry.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rendered_detail(&self) -> &str {
        &self.rendered_detail
    }
}

impl fmt::Display for AssumptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:{}: {}", self.file, self.line, self.message)?;
        write!(f, "{}", self.rendered_detail)
    }
}
