//! Entry formatter.
//!
//! Turns a failed check into an [`AssumptionEntry`]: a one-line message plus a rendered
//! detail block that reads like a native assertion report. The detail has up to three
//! parts, in order:
//!
//! 1. the source snippet around the call site, rendered through miette with the checked
//!    expression labelled (or a `>` marker line when the file cannot be read);
//! 2. the error chain, when the condition raised instead of evaluating to false;
//! 3. the `name = value` table of captured locals, only when capture is enabled.
//!
//! Formatting never fails outward. Anything that goes wrong while rendering is folded
//! into a `<detail unavailable: ...>` placeholder so the entry is still recorded.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::panic::{self, AssertUnwindSafe};

use miette::{
    Diagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode,
    SourceSpan,
};
use thiserror::Error;
use tracing::warn;
use unicode_width::UnicodeWidthStr;

use crate::condition::{panic_message, Cause, Verdict};
use crate::entry::AssumptionEntry;
use crate::site::{CallSite, Locals};

const LOCALS_NAME_WIDTH: usize = 10;
const CONTEXT_LINES: usize = 2;
const RENDER_WIDTH: usize = 100;

/// Knobs the formatter takes from configuration; it owns none of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub capture_locals: bool,
    pub source_context: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            capture_locals: false,
            source_context: true,
        }
    }
}

/// Builds the entry for a failed check.
///
/// Callers only invoke this for verdicts that did not hold.
pub fn format_entry(
    verdict: &Verdict,
    message: Option<&str>,
    site: &CallSite,
    options: FormatOptions,
) -> AssumptionEntry {
    let message = entry_message(verdict, message, site);
    let detail = match panic::catch_unwind(AssertUnwindSafe(|| {
        render_detail(verdict, site, options)
    })) {
        Ok(Ok(detail)) => detail,
        Ok(Err(fmt::Error)) => unavailable(site, "formatting error"),
        Err(payload) => unavailable(site, &panic_message(payload.as_ref())),
    };
    AssumptionEntry::new(site.file(), site.line(), message, detail)
}

fn unavailable(site: &CallSite, reason: &str) -> String {
    warn!(site = %site, reason, "could not render assumption detail");
    format!("<detail unavailable: {reason}>")
}

fn entry_message(verdict: &Verdict, message: Option<&str>, site: &CallSite) -> String {
    match (message, verdict) {
        (Some(message), _) => message.to_string(),
        (None, Verdict::Raised(cause)) => {
            format!("AssumptionFailure: `{}` raised {}", site.expression(), cause)
        }
        (None, _) => format!("AssumptionFailure: `{}`", site.expression()),
    }
}

fn render_detail(
    verdict: &Verdict,
    site: &CallSite,
    options: FormatOptions,
) -> Result<String, fmt::Error> {
    let cause = match verdict {
        Verdict::Raised(cause) => Some(cause),
        _ => None,
    };

    let mut out = String::new();
    let snippet = if options.source_context {
        SiteSnippet::load(site)
    } else {
        None
    };
    match snippet {
        Some(snippet) => render_snippet(&mut out, cause, snippet)?,
        None => render_marker(&mut out, cause, site)?,
    }

    if options.capture_locals && !site.locals().is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
        render_locals(&mut out, site.locals())?;
    }

    Ok(out.trim_end().to_string())
}

// ============================================================================
// SOURCE SNIPPETS
// ============================================================================

/// The call-site file and the span of the check within it.
struct SiteSnippet {
    source: NamedSource<String>,
    span: SourceSpan,
}

impl SiteSnippet {
    fn load(site: &CallSite) -> Option<Self> {
        let content = candidate_paths(Path::new(site.file()))
            .into_iter()
            .find_map(|path| std::fs::read_to_string(path).ok())?;
        let span = span_at(&content, site.line(), site.column())?;
        Some(Self {
            source: NamedSource::new(site.file(), content),
            span,
        })
    }
}

/// `file!()` is relative to the workspace root, while tests run from the package root.
fn candidate_paths(file: &Path) -> Vec<PathBuf> {
    let mut paths = vec![file.to_path_buf()];
    if file.is_absolute() {
        return paths;
    }
    if let Some(manifest_dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
        paths.extend(
            Path::new(&manifest_dir)
                .ancestors()
                .map(|dir| dir.join(file)),
        );
    }
    paths
}

/// Span from the 1-based `column` of `line` to the end of that line.
fn span_at(content: &str, line: u32, column: u32) -> Option<SourceSpan> {
    let target = usize::try_from(line).ok()?.checked_sub(1)?;
    let mut start = 0;
    for (index, text) in content.split_inclusive('\n').enumerate() {
        if index == target {
            let body = text.trim_end_matches(|c: char| c == '\n' || c == '\r');
            let column = usize::try_from(column).ok()?.saturating_sub(1);
            let offset = body
                .char_indices()
                .nth(column)
                .map(|(offset, _)| offset)
                .unwrap_or(0);
            let len = body[offset..].trim_end().len().max(1);
            return Some(SourceSpan::from((start + offset, len)));
        }
        start += text.len();
    }
    None
}

#[derive(Debug, Error)]
#[error("{message}")]
struct CauseLink {
    message: String,
    #[source]
    next: Option<Box<CauseLink>>,
}

impl CauseLink {
    fn from_cause(cause: &Cause) -> Self {
        let next = cause.chain().iter().rev().fold(None, |next, message| {
            Some(Box::new(CauseLink {
                message: message.clone(),
                next,
            }))
        });
        Self {
            message: cause.to_string(),
            next,
        }
    }
}

#[derive(Debug, Error)]
#[error("{headline}")]
struct CheckDiagnostic {
    headline: String,
    snippet: NamedSource<String>,
    span: SourceSpan,
    #[source]
    cause: Option<CauseLink>,
}

impl Diagnostic for CheckDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("assume::assumption_failed"))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.snippet)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = if self.cause.is_some() {
            "raised here"
        } else {
            "checked here"
        };
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(label.to_string()),
            self.span,
        ))))
    }
}

fn render_snippet(
    out: &mut String,
    cause: Option<&Cause>,
    snippet: SiteSnippet,
) -> fmt::Result {
    let headline = match cause {
        Some(_) => "assumption raised an error",
        None => "assumption did not hold",
    };
    let diagnostic = CheckDiagnostic {
        headline: headline.to_string(),
        snippet: snippet.source,
        span: snippet.span,
        cause: cause.map(CauseLink::from_cause),
    };
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_context_lines(CONTEXT_LINES)
        .with_width(RENDER_WIDTH)
        .render_report(out, &diagnostic)
}

/// Fallback when the call-site file is unavailable: the expression and the error lines.
fn render_marker(out: &mut String, cause: Option<&Cause>, site: &CallSite) -> fmt::Result {
    writeln!(out, ">       {}", site.expression())?;
    if let Some(cause) = cause {
        writeln!(out, "E       {cause}")?;
        for message in cause.chain() {
            writeln!(out, "E         caused by: {message}")?;
        }
    }
    Ok(())
}

// ============================================================================
// LOCALS
// ============================================================================

fn render_locals(out: &mut String, locals: &Locals) -> fmt::Result {
    let mut bindings: Vec<_> = locals.iter().collect();
    bindings.sort_by(|a, b| a.0.cmp(b.0));
    let width = bindings
        .iter()
        .map(|(name, _)| name.width())
        .max()
        .unwrap_or(0)
        .max(LOCALS_NAME_WIDTH);
    for (name, value) in bindings {
        let pad = width - name.width();
        writeln!(out, "{name}{:pad$} = {value}", "")?;
    }
    Ok(())
}
