//! Configuration for the assumption engine.
//!
//! Defaults match a plain `cargo test` run: no local capture, source snippets on,
//! colours when stderr is a terminal. The global context reads overrides from the
//! environment:
//!
//! - `ASSUME_CONFIG`: path to a YAML file with any of the fields below.
//! - `ASSUME_SHOWLOCALS`: `1`, `true` or `yes` enables local capture.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AssumeError;
use crate::formatter::FormatOptions;

pub const CONFIG_ENV: &str = "ASSUME_CONFIG";
pub const SHOWLOCALS_ENV: &str = "ASSUME_SHOWLOCALS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssumeConfig {
    /// Append the `name = value` table of captured locals to each entry.
    pub capture_locals: bool,
    /// Render the call-site source snippet in each entry.
    pub source_context: bool,
    /// Colour terminal reports.
    pub use_colors: bool,
}

impl Default for AssumeConfig {
    fn default() -> Self {
        Self {
            capture_locals: false,
            source_context: true,
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

impl AssumeConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, AssumeError> {
        Self::parse("config", text)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AssumeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AssumeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path.display().to_string(), &text)
    }

    fn parse(name: impl AsRef<str>, text: &str) -> Result<Self, AssumeError> {
        // An empty document means "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| AssumeError::config_parse(name, text, source))
    }

    /// Defaults, then the file named by `ASSUME_CONFIG`, then `ASSUME_SHOWLOCALS`.
    pub fn from_env() -> Result<Self, AssumeError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Ok(value) = std::env::var(SHOWLOCALS_ENV) {
            config.capture_locals = is_truthy(&value);
        }
        Ok(config)
    }

    pub fn with_capture_locals(mut self, capture_locals: bool) -> Self {
        self.capture_locals = capture_locals;
        self
    }

    pub fn with_source_context(mut self, source_context: bool) -> Self {
        self.source_context = source_context;
        self
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            capture_locals: self.capture_locals,
            source_context: self.source_context,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
