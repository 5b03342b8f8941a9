use std::cmp::max;
use std::fmt;
use std::sync::Arc;

use crate::types::span::Span;

/// A convenient type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur during template compilation or evaluation.
///
/// Compile errors are returned directly from
/// [`Engine::compile`][crate::Engine::compile]. Execution errors never abort
/// an evaluation, they are collected in
/// [`Rendered::errors`][crate::Rendered::errors] next to the output.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    /// The template source and the span of the whole construct.
    span: Option<(Arc<str>, Span)>,
    /// The part of the construct to point at, defaults to the whole span.
    highlight: Option<Span>,
}

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed block nesting, raised before any evaluation.
    Compile,
    /// A pipe function failed while evaluating an expression.
    Execution,
    /// A value could not be converted using serde.
    Serialize,
}

impl Error {
    /// Construct a new error with a message only.
    ///
    /// This is the error pipe functions should return, the evaluator adds the
    /// location of the failing expression.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Execution,
            msg: msg.into(),
            span: None,
            highlight: None,
        }
    }

    pub(crate) fn compile(msg: impl Into<String>, source: &Arc<str>, span: impl Into<Span>) -> Self {
        Self {
            kind: ErrorKind::Compile,
            msg: msg.into(),
            span: Some((source.clone(), span.into())),
            highlight: None,
        }
    }

    /// Attach the location of the expression that raised this error.
    pub(crate) fn enrich(mut self, source: &Arc<str>, span: Span, highlight: Span) -> Self {
        if self.span.is_none() {
            self.span = Some((source.clone(), span));
            self.highlight = Some(highlight);
        }
        self
    }

    /// Returns the category of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message without location information.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the byte range in the template source the error refers to.
    pub fn span(&self) -> Option<(usize, usize)> {
        self.span.as_ref().map(|(_, s)| (s.m, s.n))
    }

    /// Returns the one based line and column of the error.
    pub fn line_col(&self) -> Option<(usize, usize)> {
        let (source, span) = self.span.as_ref()?;
        let at = self.highlight.unwrap_or(*span).m;
        Some(line_col(source, at))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self::msg(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self::msg(msg)
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self {
            kind: ErrorKind::Serialize,
            msg: msg.to_string(),
            span: None,
            highlight: None,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => {
                fmt_pretty(&self.msg, source, self.highlight.unwrap_or(*span), f)
            }
            None => write!(f, "{}", self.msg),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => {
                let span = self.highlight.unwrap_or(*span);
                if f.alternate() {
                    fmt_pretty(&self.msg, source, span, f)
                } else {
                    let (line, col) = line_col(source, span.m);
                    write!(f, "{} at line {} column {}", self.msg, line, col)
                }
            }
            None => write!(f, "{}", self.msg),
        }
    }
}

/// Counts preceding newlines to find the one based position of `offset`.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = before[start..].chars().count() + 1;
    (line, col)
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lines: Vec<_> = source.split_terminator('\n').collect();
    let (line, col) = to_line_col(&lines, span.m);
    let width = max(1, display_width(&source[span]));
    let code = lines
        .get(line)
        .or_else(|| lines.last())
        .copied()
        .unwrap_or_default();

    let num = (line + 1).to_string();
    let pad = display_width(&num);
    let pipe = "|";
    let underline = "^".repeat(width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = msg
    )
}

fn to_line_col(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut n = 0;
    for (i, line) in lines.iter().enumerate() {
        let len = line.len() + 1;
        if n + len > offset {
            return (i, display_width(&line[..offset - n]));
        }
        n += len;
    }
    (
        lines.len(),
        lines.last().map(|l| display_width(l)).unwrap_or(0),
    )
}

#[cfg(feature = "unicode")]
fn display_width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn display_width(s: &str) -> usize {
    s.chars().count()
}
