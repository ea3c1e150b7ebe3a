//! Call-site tokens.
//!
//! A [`CallSite`] is captured by the [`assume!`](crate::assume) family of macros at the
//! point where a check is written. It carries the file, line and column of the call, the
//! text of the checked expression, and an optional snapshot of named values in scope.
//! Everything is rendered to text at capture time, so an entry never borrows from the
//! test body that produced it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::condition::panic_message;
use crate::repr;

/// Where a check was written, plus whatever the caller chose to snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    file: String,
    line: u32,
    column: u32,
    expression: String,
    locals: Locals,
}

impl CallSite {
    pub fn new(
        file: impl Into<String>,
        line: u32,
        column: u32,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            expression: expression.into(),
            locals: Locals::new(),
        }
    }

    /// Attaches a snapshot of named values to this call site.
    pub fn with_locals(mut self, locals: Locals) -> Self {
        self.locals = locals;
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// The source text of the checked condition, as written by the caller.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn locals(&self) -> &Locals {
        &self.locals
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// An ordered snapshot of `name = value` pairs taken at a call site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locals {
    bindings: Vec<(String, String)>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under `name` using its `Debug` rendering.
    ///
    /// A `Debug` impl that panics is recorded as a placeholder instead of unwinding
    /// into the caller.
    pub fn push<T: fmt::Debug + ?Sized>(&mut self, name: &str, value: &T) {
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| format!("{value:?}")))
            .unwrap_or_else(|payload| {
                format!("<unprintable value: {}>", panic_message(payload.as_ref()))
            });
        self.bindings.push((name.to_string(), rendered));
    }

    /// Records a byte string as `b"..."` so it cannot be confused with text.
    pub fn push_bytes(&mut self, name: &str, value: &[u8]) {
        self.bindings.push((name.to_string(), repr::bytes(value)));
    }

    /// Records an already-rendered value verbatim.
    pub fn push_rendered(&mut self, name: impl Into<String>, rendered: impl Into<String>) {
        self.bindings.push((name.into(), rendered.into()));
    }

    /// Builder form of [`Locals::push`].
    pub fn with<T: fmt::Debug + ?Sized>(mut self, name: &str, value: &T) -> Self {
        self.push(name, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Captures the call site of a check: file, line, column and expression text.
///
/// `call_site!(a == b; a, b)` additionally snapshots `a` and `b`.
#[macro_export]
macro_rules! call_site {
    ($cond:expr; $($var:ident),+ $(,)?) => {
        $crate::CallSite::new(file!(), line!(), column!(), stringify!($cond))
            .with_locals($crate::locals![$($var),+])
    };
    ($cond:expr) => {
        $crate::CallSite::new(file!(), line!(), column!(), stringify!($cond))
    };
}

/// Snapshots the named bindings into a [`Locals`](crate::Locals) using `Debug`.
#[macro_export]
macro_rules! locals {
    ($($var:ident),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut locals = $crate::Locals::new();
        $( locals.push(stringify!($var), &$var); )*
        locals
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl fmt::Debug for Exploding {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("debug exploded")
        }
    }

    #[test]
    fn call_site_macro_points_at_caller() {
        let a = 1;
        let line = line!() + 1;
        let site = crate::call_site!(a == 2; a);
        assert_eq!(site.line(), line);
        assert!(site.file().ends_with("site.rs"));
        assert_eq!(site.expression(), "a == 2");
        assert_eq!(site.locals().iter().collect::<Vec<_>>(), vec![("a", "1")]);
    }

    #[test]
    fn panicking_debug_becomes_placeholder() {
        let mut locals = Locals::new();
        locals.push("boom", &Exploding);
        let (_, value) = locals.iter().next().unwrap();
        assert!(value.starts_with("<unprintable value"));
        assert!(value.contains("debug exploded"));
    }

    #[test]
    fn bytes_are_rendered_as_byte_strings() {
        let mut locals = Locals::new();
        locals.push_bytes("raw", b"\x01[");
        assert_eq!(locals.iter().next(), Some(("raw", "b\"\\x01[\"")));
    }
}
