//! Handles user-facing output of outcomes.
//!
//! Status lines are coloured with `termcolor` when the configuration allows it; the
//! failure text itself is always plain so that it stays diffable.

use std::fmt;
use std::io;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::AssumeConfig;
use crate::outcome::Outcome;

/// Prints `outcome` for test `name` to stderr.
pub fn print_outcome(name: &str, outcome: &Outcome, config: &AssumeConfig) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(color_choice(config));
    write_outcome(&mut stderr, name, outcome)
}

/// `use_colors` still defers to termcolor's own terminal and `NO_COLOR` checks.
pub fn color_choice(config: &AssumeConfig) -> ColorChoice {
    if config.use_colors {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Writes a status line for `name`, followed by the failure or xfail text if any.
pub fn write_outcome<W: WriteColor>(out: &mut W, name: &str, outcome: &Outcome) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(status_color(outcome))).set_bold(true))?;
    write!(out, "{}", outcome.label())?;
    out.reset()?;
    writeln!(out, ": {name}")?;
    match outcome {
        Outcome::Failed(failure) => writeln!(out, "{failure}")?,
        Outcome::XFailed { reason } | Outcome::XPassed { reason } => {
            writeln!(out, "  reason: {reason}")?
        }
        Outcome::Passed => {}
    }
    Ok(())
}

fn status_color(outcome: &Outcome) -> Color {
    match outcome {
        Outcome::Passed => Color::Green,
        Outcome::Failed(_) => Color::Red,
        Outcome::XFailed { .. } | Outcome::XPassed { .. } => Color::Yellow,
    }
}

/// Renders `outcome` as pretty-printed JSON.
pub fn to_json(outcome: &Outcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

/// Tally of outcomes across a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub xfailed: usize,
    pub xpassed: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed(_) => self.failed += 1,
            Outcome::XFailed { .. } => self.xfailed += 1,
            Outcome::XPassed { .. } => self.xpassed += 1,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.xfailed + self.xpassed
    }
}

impl<'a> FromIterator<&'a Outcome> for Summary {
    fn from_iter<I: IntoIterator<Item = &'a Outcome>>(iter: I) -> Self {
        let mut summary = Summary::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.failed, "failed"),
            (self.passed, "passed"),
            (self.xfailed, "xfailed"),
            (self.xpassed, "xpassed"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect();
        if parts.is_empty() {
            f.write_str("no tests ran")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
