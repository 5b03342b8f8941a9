use std::sync::Arc;

use crate::functions::{Function, Lambda, LambdaFactory};
use crate::render::core::Renderer;
use crate::render::stack::Frame;
use crate::types::path::ObjectPath;
use crate::types::pipe::{ArgMode, Pipe, PipeArgument};
use crate::types::program::Program;
use crate::types::span::Span;
use crate::value::flatten;
use crate::{Error, Globals, Options, Result, Value};

/// The maximum number of template renders that may enclose each other.
const MAX_NESTING: usize = 64;

/// The state of a pipe expression while it is evaluated.
///
/// A pipe function receives the context positioned just after its own name.
/// It can pull as many of the following arguments as it needs, the
/// evaluation continues with the next unconsumed argument as the name of the
/// next function.
pub struct PipeContext<'a, 'r> {
    renderer: &'a mut Renderer<'r>,
    pipe: &'r Pipe,
    start: usize,
    end: usize,
    /// The index of the next argument.
    i: usize,
    /// The value the expression started from.
    input: Value,
    /// The value piped into the current function.
    value: Value,
    /// The index at which `input` is still the implied argument.
    reset_pos: usize,
    /// Extra results, flattened together with the final value.
    pushed: Vec<Value>,
}

impl<'a, 'r> PipeContext<'a, 'r> {
    pub(crate) fn new(renderer: &'a mut Renderer<'r>, pipe: &'r Pipe, start: usize, end: usize) -> Self {
        Self {
            renderer,
            pipe,
            start,
            end,
            i: start,
            input: Value::Undefined,
            value: Value::Undefined,
            reset_pos: start,
            pushed: Vec::new(),
        }
    }

    /// Evaluates the arguments from left to right.
    ///
    /// The first failing function is recorded as an error and ends the
    /// evaluation with `undefined`.
    pub(crate) fn evaluate(mut self) -> Value {
        self.i = self.start;
        self.input = self.renderer.stack.value_at(0).into_owned();
        self.value = self.reset();

        let pipe = self.pipe;
        while self.i < self.end {
            let start = self.i;
            let arg = &pipe.args[start];
            self.i += 1;
            let result = match self.renderer.engine.resolve(&arg.text) {
                Some(f) => f.call(&mut self),
                None if start == self.reset_pos => Ok(match arg.mode {
                    ArgMode::Constant => arg.value.clone(),
                    _ => Value::Undefined,
                }),
                None => Err(Error::msg(format!("invalid pipe function `{}`", arg.text))),
            };
            match result {
                Ok(value) => self.value = value,
                Err(err) => {
                    let last = &pipe.args[(self.i - 1).max(start)];
                    self.fail(err, arg.span.combine(last.span));
                    self.value = Value::Undefined;
                    break;
                }
            }
        }

        if self.pushed.is_empty() {
            self.value
        } else {
            self.pushed.push(self.value);
            flatten(Value::Array(self.pushed))
        }
    }

    fn fail(&mut self, err: Error, highlight: Span) {
        tracing::debug!(error = %err.message(), "pipe evaluation failed");
        let err = err.enrich(self.renderer.source, self.pipe.span, highlight);
        self.renderer.errors.push(err);
    }

    fn arg(&self, i: usize) -> Option<&'r PipeArgument> {
        if i < self.end {
            self.pipe.args.get(i)
        } else {
            None
        }
    }

    /// The next argument, without taking it.
    pub(crate) fn next_argument(&self) -> Option<&'r PipeArgument> {
        self.arg(self.i)
    }

    /// The value piped into the current function.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value the expression started from, the current value of the
    /// innermost frame.
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// Returns `true` if there are arguments left.
    pub fn has_argument(&self) -> bool {
        self.i < self.end
    }

    /// Takes the next argument.
    ///
    /// A constant is returned as is and a lambda is applied to the current
    /// value. Any other token is looked up as an object path and the result
    /// is used if the path exists and fits the current value, otherwise the
    /// token text is used as a string. At the start of an expression a token
    /// that is not a path is left in place and the input value is returned.
    pub fn take_argument(&mut self) -> Value {
        self.take_argument_with(true)
    }

    /// Like [`take_argument`][Self::take_argument] but a lambda is looked
    /// up as a path instead of being applied.
    pub fn take_argument_no_lambda(&mut self) -> Value {
        self.take_argument_with(false)
    }

    fn take_argument_with(&mut self, lambda: bool) -> Value {
        let reset = self.reset_pos == self.i;
        let Some(arg) = self.arg(self.i) else {
            return if reset {
                self.input.clone()
            } else {
                Value::Undefined
            };
        };
        if arg.mode == ArgMode::Constant {
            self.i += 1;
            return arg.value.clone();
        }
        if lambda {
            if let Some(lambda) = self.take_lambda() {
                let target = if reset {
                    self.input.clone()
                } else {
                    self.value.clone()
                };
                return self.invoke(&lambda, target, Value::Undefined);
            }
        }

        let path = arg.path();
        let (valid, resolved) = self.renderer.resolve_path(path, reset);
        let accept = valid
            && (reset
                || path.is_compound()
                || !self.value.is_primitive()
                || resolved.is_primitive());
        if arg.mode == ArgMode::Evaluated || accept {
            self.i += 1;
            resolved
        } else if reset {
            self.input.clone()
        } else {
            self.i += 1;
            arg.value.clone()
        }
    }

    /// Takes the next argument as written, without any lookup.
    ///
    /// A lambda is skipped and gives `undefined`.
    pub fn take_argument_raw(&mut self) -> Value {
        if self.take_lambda().is_some() {
            return Value::Undefined;
        }
        match self.arg(self.i) {
            Some(arg) => {
                self.i += 1;
                arg.value.clone()
            }
            None => Value::Undefined,
        }
    }

    /// Takes the next argument if it is a bracketed lambda.
    pub fn take_lambda(&mut self) -> Option<Lambda> {
        let arg = self.arg(self.i)?;
        if arg.lambda_len == 0 {
            return None;
        }
        let start = self.i;
        self.i += arg.lambda_len + 1;
        Some(Lambda::Pipe {
            start: start + 1,
            end: start + arg.lambda_len,
        })
    }

    /// Takes the next argument as a lambda.
    ///
    /// A bracketed lambda or a callable value is used directly, any other
    /// argument is turned into a lambda by `factory`.
    pub fn take_lambda_or(&mut self, factory: LambdaFactory) -> Lambda {
        if let Some(lambda) = self.take_lambda() {
            return lambda;
        }
        match self.take_argument() {
            Value::Function(f) => Lambda::Callable(f),
            value => factory.create(value),
        }
    }

    /// Applies a lambda to a value.
    ///
    /// Inside a bracketed lambda `value` is the current scope and `key` is
    /// available as `#key`.
    pub fn invoke(&mut self, lambda: &Lambda, value: Value, key: Value) -> Value {
        match lambda {
            Lambda::Pipe { start, end } => {
                self.renderer.stack.push(Frame::entry(key, value));
                let result = PipeContext::new(self.renderer, self.pipe, *start, *end).evaluate();
                self.renderer.stack.pop();
                result
            }
            Lambda::Constant(v) => v.clone(),
            Lambda::Property(name) => value.property(name).into_owned(),
            Lambda::Callable(f) => f.call(&value),
            Lambda::Function(f) => self.call_with(f, value),
        }
    }

    /// Calls a function with `value` piped in and no arguments.
    fn call_with(&mut self, f: &Function, value: Value) -> Value {
        let mut ctx = PipeContext::new(self.renderer, self.pipe, self.end, self.end);
        ctx.input = value.clone();
        ctx.value = value;
        ctx.reset_pos = usize::MAX;
        match f.call(&mut ctx) {
            Ok(v) => v,
            Err(err) => {
                let span = ctx.pipe.span;
                ctx.fail(err, span);
                Value::Undefined
            }
        }
    }

    /// Makes the input value the implied argument again and takes the next
    /// argument.
    pub fn reset(&mut self) -> Value {
        self.reset_pos = self.i;
        self.take_argument()
    }

    /// Skips the remaining arguments, returns the current value.
    pub fn stop(&mut self) -> Value {
        self.i = self.end;
        self.value.clone()
    }

    /// Adds an extra result to the expression.
    pub fn push(&mut self, value: Value) {
        self.pushed.push(value);
    }

    pub fn globals(&self) -> &Globals<'r> {
        &self.renderer.globals
    }

    pub fn globals_mut(&mut self) -> &mut Globals<'r> {
        &mut self.renderer.globals
    }

    /// Evaluates an object path against the current scope.
    pub fn evaluate_path(&self, path: &str) -> Value {
        let path = ObjectPath::parse(path);
        self.renderer.resolve_path(&path, false).1
    }

    /// Looks up a function by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<Function>> {
        self.renderer.engine.resolve(name)
    }

    /// Renders a template with the current value as input.
    ///
    /// The template sees the globals of this render as a parent scope and
    /// continues the indentation of the expression being evaluated.
    pub(crate) fn render_template(&mut self, program: &Program) -> Result<Value> {
        let renderer = &mut *self.renderer;
        let options = renderer.options;
        if options.nesting >= MAX_NESTING {
            return Err(Error::msg("reached maximum template depth"));
        }
        let padding = format!(
            "{}{}",
            options.indent_padding,
            options.indent.repeat(renderer.depth)
        );
        let nested = Options {
            indent: options.indent.clone(),
            indent_padding: padding,
            raw_value: false,
            globals: Some(&renderer.globals),
            nesting: options.nesting + 1,
        };
        let rendered = Renderer::new(renderer.engine, program, self.value.clone(), &nested)
            .render(program);
        let (output, errors) = rendered.into_parts();
        renderer.errors.extend(errors);
        Ok(Value::String(output.to_string()))
    }
}
