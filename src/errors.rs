//! Library errors.
//!
//! Assumption failures are not errors in this sense: they are recorded and reported at
//! finalization. `AssumeError` covers the things that can go wrong around them, which
//! today means loading configuration.

use std::fmt;
use std::path::PathBuf;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssumeError {
    #[error("failed to read configuration file {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    ConfigParse {
        message: String,
        config: NamedSource<String>,
        span: Option<SourceSpan>,
        #[source]
        source: serde_yaml::Error,
    },
}

impl AssumeError {
    pub(crate) fn config_parse(
        name: impl AsRef<str>,
        text: &str,
        source: serde_yaml::Error,
    ) -> Self {
        let span = source
            .location()
            .map(|location| SourceSpan::from((location.index(), 1)));
        Self::ConfigParse {
            message: source.to_string(),
            config: NamedSource::new(name, text.to_string()),
            span,
            source,
        }
    }

    const fn code_suffix(&self) -> &'static str {
        match self {
            Self::ConfigRead { .. } => "read",
            Self::ConfigParse { .. } => "parse",
        }
    }
}

impl Diagnostic for AssumeError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("assume::config::{}", self.code_suffix())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Self::ConfigRead { .. } => Some(Box::new(
                "check the path given in ASSUME_CONFIG, or unset it to use the defaults",
            )),
            Self::ConfigParse { .. } => Some(Box::new(
                "recognised keys are capture_locals, source_context and use_colors",
            )),
        }
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            Self::ConfigParse { config, .. } => Some(config),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Self::ConfigParse {
                span: Some(span), ..
            } => Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
                Some("here".to_string()),
                *span,
            )))),
            _ => None,
        }
    }
}
