//! Defines a compiled [`Program`] which is a flat sequence of [`Instr`] that
//! can be executed by the renderer.

use std::sync::Arc;

use crate::types::pipe::Pipe;

/// Placeholder for a jump target that is patched once the target is known.
pub const FIXME: usize = !0;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub source: Arc<str>,
    pub instrs: Vec<Instr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Evaluate the pipe and emit the result.
    ///
    /// The result is HTML escaped unless `raw` is set. `depth` is the number
    /// of HTML elements open at this point.
    Eval { pipe: Pipe, raw: bool, depth: usize },

    /// Evaluate the pipe and jump to `target` if its truthiness equals
    /// `negate`.
    Test {
        pipe: Pipe,
        negate: bool,
        target: usize,
    },

    /// Evaluate the pipe, push it as a new frame and start enumerating it.
    ///
    /// `target` is the index of the matching [`Instr::IterateEnd`]. If there
    /// is nothing to enumerate the frame is popped and execution continues
    /// after it.
    Iterate { pipe: Pipe, target: usize },

    /// Advance the innermost frame and jump to `target` if there is another
    /// entry, otherwise pop the frame.
    IterateEnd(usize),

    /// Jump unconditionally.
    Jump(usize),

    /// Emit template text.
    ///
    /// `trim_start` drops a pending space before the text and `trim_end`
    /// suppresses whitespace directly after it.
    Literal {
        text: String,
        trim_start: bool,
        trim_end: bool,
        depth: usize,
    },

    /// A whitespace run between tags.
    ///
    /// A newline space is rendered as a line break indented to `depth`,
    /// otherwise the run collapses to at most one space.
    Space { newline: bool, depth: usize },
}
