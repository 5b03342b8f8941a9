//! Pipe functions and how they are found.

#[cfg(feature = "builtins")]
pub(crate) mod builtins;
#[cfg(feature = "builtins")]
mod date;
#[cfg(feature = "builtins")]
mod printf;
mod resolve;

use std::fmt;
use std::sync::Arc;

pub(crate) use crate::functions::resolve::Link;
pub use crate::functions::resolve::{Next, Resolve};
use crate::render::PipeContext;
use crate::value::{Callable, List};
use crate::{Result, Value};

pub type FunctionFn = dyn Fn(&mut PipeContext<'_, '_>) -> Result<Value> + Send + Sync + 'static;

/// A function that can be called from a pipe expression.
pub struct Function {
    f: Box<FunctionFn>,
    variadic: bool,
}

impl Function {
    /// Wraps a function of fixed arity.
    ///
    /// The first parameter receives the piped value, each further parameter
    /// takes the next argument of the expression.
    pub fn new<F, R, A>(f: F) -> Self
    where
        F: PipeFn<R, A> + Send + Sync + 'static,
        R: PipeReturn,
        A: PipeArgs,
    {
        Self {
            f: Box::new(move |ctx: &mut PipeContext<'_, '_>| {
                let args = A::take(ctx);
                f.call(args).to_value()
            }),
            variadic: false,
        }
    }

    /// Wraps a function that pulls its own arguments from the context.
    pub fn variadic<F>(f: F) -> Self
    where
        F: Fn(&mut PipeContext<'_, '_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            f: Box::new(f),
            variadic: true,
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn call(&self, ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
        (self.f)(ctx)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

/// A function argument that can be applied to a value.
///
/// Lambdas are what functions like `where`, `map` and `sortby` apply to
/// each element of a collection.
#[derive(Debug, Clone)]
pub enum Lambda {
    /// A bracketed sub-expression, e.g. `[ price > 10 ]`, by argument index.
    Pipe { start: usize, end: usize },
    /// Ignores its input and returns the value.
    Constant(Value),
    /// Returns the named property of its input.
    Property(String),
    /// A host callable passed in through the data.
    Callable(Callable),
    /// A registered pipe function applied to its input.
    Function(Arc<Function>),
}

/// Turns a plain argument into a [`Lambda`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaFactory {
    /// The argument itself is the result.
    Constant,
    /// The argument names a property of the input.
    Property,
}

impl LambdaFactory {
    pub fn create(self, value: Value) -> Lambda {
        match self {
            Self::Constant => Lambda::Constant(value),
            Self::Property => Lambda::Property(value.to_string()),
        }
    }
}

/// Represents any pipe function of fixed arity.
///
/// This trait is used by [`Engine::add_function`][crate::Engine::add_function]
/// to abstract over functions and closures that take between one and six
/// parameters. The first parameter always receives the piped value, every
/// further parameter takes the next argument of the expression.
///
/// Parameters can be any of [`Value`], [`String`], [`f64`], [`i64`],
/// [`bool`] or [`Vec<Value>`]. Arguments are coerced the way JavaScript
/// would, a conversion never fails.
///
/// The function can return anything that implements `Into<Value>` or a
/// [`Result`] of it.
///
/// # Examples
///
/// ```
/// let engine = waterpipe::Engine::new();
/// engine.add_function("surround", |s: String, with: String| format!("{with}{s}{with}"));
///
/// let result = engine.render("{{name surround *}}", waterpipe::value! { name: "bold" })?;
/// assert_eq!(result.into_string(), "*bold*");
/// # Ok::<(), waterpipe::Error>(())
/// ```
pub trait PipeFn<R, A> {
    #[doc(hidden)]
    fn call(&self, args: A) -> R;
}

pub trait PipeArgs: Sized {
    #[doc(hidden)]
    fn take(ctx: &mut PipeContext<'_, '_>) -> Self;
}

pub trait PipeArg: Sized {
    #[doc(hidden)]
    fn from_value(v: Value) -> Self;
}

pub trait PipeReturn {
    #[doc(hidden)]
    fn to_value(self) -> Result<Value>;
}

////////////////////////////////////////////////////////////////////////////////
// PipeFn
////////////////////////////////////////////////////////////////////////////////

macro_rules! impl_pipe_fn {
    ($($arg:ident)*) => {
        impl<Func, R, V, $($arg,)*> PipeFn<R, (V, $($arg,)*)> for Func
        where
            Func: Fn(V, $($arg,)*) -> R,
            V: PipeArg,
            $($arg: PipeArg,)*
        {
            #[allow(non_snake_case)]
            fn call(&self, (v, $($arg,)*): (V, $($arg,)*)) -> R {
                self(v, $($arg,)*)
            }
        }

        impl<V, $($arg,)*> PipeArgs for (V, $($arg,)*)
        where
            V: PipeArg,
            $($arg: PipeArg,)*
        {
            fn take(ctx: &mut PipeContext<'_, '_>) -> Self {
                let v = V::from_value(ctx.value().clone());
                (v, $($arg::from_value(ctx.take_argument()),)*)
            }
        }
    };
}

impl_pipe_fn! {}
impl_pipe_fn! { A }
impl_pipe_fn! { A B }
impl_pipe_fn! { A B C }
impl_pipe_fn! { A B C D }
impl_pipe_fn! { A B C D E }

////////////////////////////////////////////////////////////////////////////////
// PipeArg
////////////////////////////////////////////////////////////////////////////////

impl PipeArg for Value {
    fn from_value(v: Value) -> Self {
        v
    }
}

impl PipeArg for String {
    fn from_value(v: Value) -> Self {
        match v {
            Value::String(s) => s,
            v => v.as_text().into_owned(),
        }
    }
}

impl PipeArg for f64 {
    fn from_value(v: Value) -> Self {
        v.to_number()
    }
}

impl PipeArg for i64 {
    fn from_value(v: Value) -> Self {
        v.to_number_or_zero() as i64
    }
}

impl PipeArg for bool {
    fn from_value(v: Value) -> Self {
        v.truthy()
    }
}

impl PipeArg for List<Value> {
    fn from_value(v: Value) -> Self {
        match v {
            Value::Array(list) => list,
            v if v.is_nullish() => List::new(),
            v => vec![v],
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// PipeReturn
////////////////////////////////////////////////////////////////////////////////

impl<T> PipeReturn for T
where
    T: Into<Value>,
{
    fn to_value(self) -> Result<Value> {
        Ok(self.into())
    }
}

impl<T> PipeReturn for Result<T>
where
    T: Into<Value>,
{
    fn to_value(self) -> Result<Value> {
        self.map(Into::into)
    }
}
