//! Defines a tokenized [`Pipe`] expression.

use std::sync::OnceLock;

use crate::types::path::ObjectPath;
use crate::types::span::Span;
use crate::Value;

/// A tokenized pipe expression, e.g. `items where [ price > 10 ] length`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub args: Vec<PipeArgument>,
    /// The span of the expression text in the template source.
    pub span: Span,
}

/// How an argument token is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgMode {
    /// A function name, an object path or a literal depending on context.
    Auto,
    /// A quoted string or a keyword or number literal.
    Constant,
    /// A `$` prefixed token that is always evaluated as an object path.
    Evaluated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipeArgument {
    /// The unescaped token text.
    pub text: String,
    /// The value of the token when it is taken literally.
    pub value: Value,
    pub mode: ArgMode,
    /// The span of the token in the template source.
    pub span: Span,
    /// For a `[` token the distance to its matching `]`, otherwise zero.
    pub lambda_len: usize,
    path: OnceLock<ObjectPath>,
}

impl Pipe {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl PipeArgument {
    pub fn new(text: String, value: Value, mode: ArgMode, span: Span) -> Self {
        Self {
            text,
            value,
            mode,
            span,
            lambda_len: 0,
            path: OnceLock::new(),
        }
    }

    pub fn offset(mut self, by: usize) -> Self {
        self.span = self.span.offset(by);
        self
    }

    /// The object path described by the token, parsed on first use.
    ///
    /// A leading `$` is part of the path text so that `$(name)` is a computed
    /// segment.
    pub fn path(&self) -> &ObjectPath {
        self.path.get_or_init(|| ObjectPath::parse(&self.text))
    }
}
