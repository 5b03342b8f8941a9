use std::borrow::Cow;
use std::cell::Cell;
use std::sync::Arc;

use crate::render::context::PipeContext;
use crate::render::fmt::Formatter;
use crate::render::stack::{Frame, Stack};
use crate::types::path::{ObjectPath, PathMode, Segment};
use crate::types::pipe::Pipe;
use crate::types::program::{Instr, Program};
use crate::{Engine, Error, Globals, Options, Output, Rendered, Value};

thread_local! {
    /// Incremented each time a render produces text, so an expression can
    /// tell that evaluating it rendered another template.
    static RENDER_COUNT: Cell<u16> = Cell::new(0);
}

/// The state of a single render.
pub struct Renderer<'r> {
    pub(crate) engine: &'r Engine,
    pub(crate) source: &'r Arc<str>,
    pub(crate) options: &'r Options<'r>,
    pub(crate) globals: Globals<'r>,
    pub(crate) stack: Stack,
    pub(crate) errors: Vec<Error>,
    /// The HTML depth of the expression being evaluated.
    pub(crate) depth: usize,
}

/// Whether the render produces text or a single value.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Nothing has been emitted yet.
    Undecided,
    /// Exactly one expression produced a value.
    RawValue,
    String,
}

impl<'r> Renderer<'r> {
    pub(crate) fn new(
        engine: &'r Engine,
        program: &'r Program,
        input: Value,
        options: &'r Options<'r>,
    ) -> Self {
        let globals = match options.globals {
            Some(parent) => Globals::with_parent(parent),
            None => Globals::new(),
        };
        Self {
            engine,
            source: &program.source,
            options,
            globals,
            stack: Stack::new(input),
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn render(mut self, program: &'r Program) -> Rendered {
        let options = self.options;
        let mut f = Formatter::new(&options.indent, &options.indent_padding);
        let mut mode = if options.raw_value {
            Mode::Undecided
        } else {
            Mode::String
        };
        let mut result = Value::Undefined;

        let mut pc = 0;
        while let Some(instr) = program.instrs.get(pc) {
            match instr {
                Instr::Eval { pipe, raw, depth } => {
                    let before = RENDER_COUNT.with(Cell::get);
                    self.depth = *depth;
                    let value = self.evaluate(pipe);
                    let nested = RENDER_COUNT.with(Cell::get) != before;
                    // Nullish output leaves pending whitespace untouched.
                    if !value.is_nullish() {
                        mode = match mode {
                            Mode::Undecided => {
                                result = value.clone();
                                Mode::RawValue
                            }
                            _ => Mode::String,
                        };
                        f.write_value(&value.stringify(), !raw && !nested);
                    }
                }

                Instr::Test {
                    pipe,
                    negate,
                    target,
                } => {
                    if self.evaluate(pipe).truthy() == *negate {
                        pc = *target;
                        continue;
                    }
                }

                Instr::Iterate { pipe, target } => {
                    let mut frame = Frame::new(self.evaluate(pipe));
                    if !frame.advance() {
                        pc = *target + 1;
                        continue;
                    }
                    self.stack.push(frame);
                }

                Instr::IterateEnd(j) => {
                    if self.stack.top_mut().map_or(false, Frame::advance) {
                        pc = *j;
                        continue;
                    }
                    self.stack.pop();
                }

                Instr::Jump(j) => {
                    pc = *j;
                    continue;
                }

                Instr::Literal {
                    text,
                    trim_start,
                    trim_end,
                    ..
                } => {
                    mode = Mode::String;
                    f.write_literal(text, *trim_start, *trim_end);
                }

                Instr::Space { newline, depth } => {
                    if *newline {
                        f.write_newline(*depth);
                    } else {
                        f.write_space();
                    }
                }
            }
            pc += 1;
        }

        let output = match mode {
            Mode::RawValue => Output::Value(result),
            _ => {
                RENDER_COUNT.with(|c| c.set(c.get().wrapping_add(1)));
                Output::String(f.into_string())
            }
        };
        Rendered::new(output, self.errors)
    }

    fn evaluate(&mut self, pipe: &'r Pipe) -> Value {
        PipeContext::new(self, pipe, 0, pipe.len()).evaluate()
    }

    /// Resolves an object path, returning whether the lookup is valid along
    /// with the value.
    ///
    /// A single character path other than a plain name is only valid with
    /// `shorthand` set, so that `.` or `#` can be passed as literal text.
    pub(crate) fn resolve_path(&self, path: &ObjectPath, shorthand: bool) -> (bool, Value) {
        let head = path.head();
        let valid = shorthand
            || path.mode == PathMode::Default
            || (head.chars().count() > 1 && head != "##");

        let top = self.stack.top();
        let mut skip = 1;
        let mut value = match path.mode {
            PathMode::Key => return (valid, top.map(Frame::key).unwrap_or_default()),
            PathMode::Index => return (valid, top.map(Frame::index).unwrap_or_default()),
            PathMode::Count => return (valid, top.map(Frame::count).unwrap_or_default()),
            PathMode::Frame(n) => self.stack.value_at(n),
            PathMode::Root => self.stack.root(),
            PathMode::Global => match path.segments.get(1) {
                Some(segment) => {
                    skip = 2;
                    let name = self.segment_name(segment);
                    match self.globals.get(&name) {
                        Some(v) => Cow::Borrowed(v),
                        None => Cow::Owned(Value::Undefined),
                    }
                }
                None => Cow::Owned(self.globals.to_value()),
            },
            PathMode::Default => {
                let name = self.segment_name(&path.segments[0]);
                match self.find(&name) {
                    Some(v) => v,
                    None => return (false, Value::Undefined),
                }
            }
        };

        for segment in path.segments.iter().skip(skip) {
            if value.is_nullish() {
                break;
            }
            let name = self.segment_name(segment);
            value = property(value, &name);
        }
        (valid, value.into_owned())
    }

    /// Searches each frame from the innermost outwards and then the globals.
    fn find(&self, name: &str) -> Option<Cow<'_, Value>> {
        for n in 0..self.stack.len() {
            let v = self.stack.value_at(n);
            if v.has_property(name) {
                return Some(property(v, name));
            }
        }
        self.globals.get(name).map(Cow::Borrowed)
    }

    fn segment_name<'a>(&self, segment: &'a Segment) -> Cow<'a, str> {
        match segment {
            Segment::Name(name) => Cow::Borrowed(name),
            Segment::Computed(path) => Cow::Owned(self.resolve_path(path, false).1.to_string()),
        }
    }
}

fn property<'a>(value: Cow<'a, Value>, name: &str) -> Cow<'a, Value> {
    match value {
        Cow::Borrowed(v) => v.property(name),
        Cow::Owned(v) => Cow::Owned(v.property(name).into_owned()),
    }
}
