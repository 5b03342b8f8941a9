//! An HTML-aware template engine built on pipe expressions.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Expressions: `{{ user.name }}`, raw output: `{{& user.bio }}`
//! - Pipes: `{{ items where [ price > 10 ] map name join ", " }}`
//! - Conditionals: `{{if user.enabled}} ... {{elseif not user.banned}} ... {{else}} ... {{/if}}`
//! - Loops: `{{foreach users}} {{name}} is number {{#index}} {{/foreach}}`
//! - Comments: `{{! stripped from the output }}`
//!
//! ### Engine
//!
//! - Whitespace between HTML tags is collapsed and line breaks are
//!   re-indented to the element depth
//! - Expressions are HTML escaped unless written as `{{& ... }}`
//! - A library of builtin pipe functions and `%`-prefixed printf formats
//! - Render using any [`serde`] serializable values
//! - Execution errors never abort a render, they are returned next to the
//!   output
//! - Compiled templates are cached and the engine can be shared between
//!   threads
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the pipe
//! functions and the compiled templates. Generally, you only need to
//! construct one engine during the lifetime of a program.
//!
//! ```
//! let engine = waterpipe::Engine::new();
//! ```
//!
//! Next, [`.compile`][Engine::compile] is used to compile a template.
//! Compiling the same source again returns the cached program.
//!
//! ```
//! # let engine = waterpipe::Engine::new();
//! let template = engine.compile("Hello {{ user.name }}!")?;
//! # Ok::<(), waterpipe::Error>(())
//! ```
//!
//! Finally, the template is rendered by calling
//! [`.render`][Template::render].
//!
//! ```
//! # let engine = waterpipe::Engine::new();
//! # let template = engine.compile("Hello {{ user.name }}!")?;
//! let result = template.render(waterpipe::value! { user: { name: "John Smith" } })?;
//! assert!(result.errors().is_empty());
//! assert_eq!(result.into_string(), "Hello John Smith!");
//! # Ok::<(), waterpipe::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Render using structured data
//!
//! Here is the same example as above except using derived data.
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Context { user: User }
//!
//! #[derive(serde::Serialize)]
//! struct User { name: String }
//!
//! let ctx = Context { user: User { name: "John Smith".into() } };
//!
//! let result = waterpipe::Engine::new().render("Hello {{ user.name }}", &ctx)?;
//!
//! assert_eq!(result.into_string(), "Hello John Smith");
//! # Ok::<(), waterpipe::Error>(())
//! ```
//!
//! ### Transform data using pipe functions
//!
//! Each word of an expression after the first value is the name of a
//! function that receives the current value and takes as many of the
//! following words as it needs.
//!
//! ```
//! let engine = waterpipe::Engine::new();
//! engine.add_function("shout", |s: String| format!("{}!", s.to_uppercase()));
//!
//! let result = engine.render(
//!     "{{ items where [ price more 10 ] map name join \", \" shout }}",
//!     waterpipe::value! {
//!         items: [
//!             { name: "apple", price: 5 },
//!             { name: "melon", price: 12 },
//!             { name: "grape", price: 20 },
//!         ]
//!     },
//! )?;
//!
//! assert_eq!(result.into_string(), "MELON, GRAPE!");
//! # Ok::<(), waterpipe::Error>(())
//! ```
//!
//! See the [`PipeFn`] trait documentation for more information on functions.
//!
//! ### Evaluate a single expression
//!
//! [`Engine::evaluate_single`] returns the value of an expression instead
//! of its text.
//!
//! ```
//! use waterpipe::{Output, Value};
//!
//! let result = waterpipe::Engine::new().evaluate_single("1 + 2", ())?;
//! assert_eq!(result.output(), &Output::Value(Value::from(3)));
//! # Ok::<(), waterpipe::Error>(())
//! ```

mod compile;
mod error;
mod functions;
mod globals;
mod macros;
mod render;
mod types;
pub mod value;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::functions::{
    Function, Lambda, LambdaFactory, Next, PipeArg, PipeArgs, PipeFn, PipeReturn, Resolve,
};
pub use crate::globals::Globals;
pub use crate::render::PipeContext;
pub use crate::types::options::Options;
pub use crate::value::{to_value, Value};

use crate::functions::Link;
use crate::types::program::Program;

/// The compilation and rendering engine.
///
/// All registration methods take `&self`, an engine can be shared between
/// threads and extended while it is in use.
pub struct Engine {
    cache: DashMap<String, Arc<Program>>,
    functions: DashMap<String, Arc<Function>>,
    /// Copied on write so lookups never hold the lock while a resolver runs.
    resolvers: RwLock<Arc<Vec<Link>>>,
}

/// A compiled template.
#[derive(Clone)]
pub struct Template<'engine> {
    engine: &'engine Engine,
    program: Arc<Program>,
}

/// The result of a render.
///
/// Rendering never fails after compilation. A function that fails is
/// recorded as an error and evaluates to `undefined`, the rest of the
/// template is still rendered.
#[derive(Debug, Clone)]
pub struct Rendered {
    output: Output,
    errors: Vec<Error>,
}

/// The output of a render.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    String(String),
    /// The value of a template consisting of a single expression, only
    /// produced with [`Options::raw_value`] set.
    Value(Value),
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Construct a new engine with the builtin functions.
    pub fn new() -> Self {
        let engine = Self::empty();
        #[cfg(feature = "builtins")]
        functions::builtins::register(&engine);
        engine
    }

    /// Construct a new engine without any functions.
    pub fn empty() -> Self {
        Self {
            cache: DashMap::new(),
            functions: DashMap::new(),
            resolvers: RwLock::new(Arc::new(vec![Link::Registry])),
        }
    }

    /// Add a new function to the engine.
    ///
    /// The first parameter receives the piped value, each further parameter
    /// takes the next argument of the expression. A function with the same
    /// name is replaced.
    #[inline]
    pub fn add_function<F, R, A>(&self, name: impl Into<String>, f: F)
    where
        F: PipeFn<R, A> + Send + Sync + 'static,
        R: PipeReturn,
        A: PipeArgs,
    {
        self.functions
            .insert(name.into(), Arc::new(Function::new(f)));
    }

    /// Add a new function that takes its arguments from the context itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use waterpipe::{Engine, PipeContext, Result, Value};
    ///
    /// fn count_args(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    ///     let mut n = 0;
    ///     while ctx.has_argument() {
    ///         ctx.take_argument();
    ///         n += 1;
    ///     }
    ///     Ok(Value::from(n))
    /// }
    ///
    /// let engine = Engine::new();
    /// engine.add_variadic("count", count_args);
    ///
    /// let result = engine.render("{{count a b c}}", ())?;
    /// assert_eq!(result.into_string(), "3");
    /// # Ok::<(), waterpipe::Error>(())
    /// ```
    #[inline]
    pub fn add_variadic<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut PipeContext<'_, '_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.functions
            .insert(name.into(), Arc::new(Function::variadic(f)));
    }

    /// Add a function that renders a template.
    ///
    /// The template is compiled immediately. When called it is rendered with
    /// the piped value as input and the output is returned unescaped.
    ///
    /// # Examples
    ///
    /// ```
    /// let engine = waterpipe::Engine::new();
    /// engine.add_template_function("card", "<b>{{name}}</b>")?;
    ///
    /// let result = engine.render("{{user card}}", waterpipe::value! { user: { name: "Ann" } })?;
    /// assert_eq!(result.into_string(), "<b>Ann</b>");
    /// # Ok::<(), waterpipe::Error>(())
    /// ```
    pub fn add_template_function(&self, name: impl Into<String>, source: &str) -> Result<()> {
        let program = self.program(source)?;
        self.add_variadic(name, move |ctx: &mut PipeContext<'_, '_>| {
            ctx.render_template(&program)
        });
        Ok(())
    }

    /// Add a resolver for function names.
    ///
    /// Resolvers are asked after the registered functions, the most recently
    /// added first.
    pub fn add_resolver<R>(&self, resolver: R)
    where
        R: Resolve + 'static,
    {
        let mut chain = self.resolvers.write();
        Arc::make_mut(&mut chain).insert(1, Link::Custom(Arc::new(resolver)));
    }

    /// Lookup a function by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<Function>> {
        tracing::trace!(name, "resolving pipe function");
        let chain = Arc::clone(&self.resolvers.read());
        Next::new(&self.functions, &chain).resolve(name)
    }

    /// Compile a template.
    ///
    /// Compiling the same source again returns the cached program.
    #[inline]
    pub fn compile(&self, source: &str) -> Result<Template<'_>> {
        let program = self.program(source)?;
        Ok(Template {
            engine: self,
            program,
        })
    }

    /// Compile and render a template using the provided value.
    #[inline]
    pub fn render<S>(&self, source: &str, ctx: S) -> Result<Rendered>
    where
        S: serde::Serialize,
    {
        self.compile(source)?.render(ctx)
    }

    /// Evaluate a single pipe expression, returning its value.
    #[inline]
    pub fn evaluate_single<S>(&self, expr: &str, ctx: S) -> Result<Rendered>
    where
        S: serde::Serialize,
    {
        self.compile(&format!("{{{{{expr}}}}}"))?
            .render_with(ctx, Options::new().raw_value(true))
    }

    fn program(&self, source: &str) -> Result<Arc<Program>> {
        if let Some(program) = self.cache.get(source) {
            return Ok(Arc::clone(program.value()));
        }
        let program = Arc::new(compile::template(source)?);
        tracing::debug!(
            len = source.len(),
            instrs = program.instrs.len(),
            "compiled template"
        );
        let entry = self.cache.entry(source.to_owned()).or_insert(program);
        Ok(Arc::clone(entry.value()))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("Engine")
            .field("functions", &names)
            .field("templates", &self.cache.len())
            .field("resolvers", &self.resolvers.read().len())
            .finish()
    }
}

impl<'engine> Template<'engine> {
    /// Render the template using the provided value.
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Result<Rendered>
    where
        S: serde::Serialize,
    {
        self.render_with(ctx, &Options::default())
    }

    /// Render the template using the provided value and options.
    #[inline]
    pub fn render_with<S>(&self, ctx: S, options: &Options<'_>) -> Result<Rendered>
    where
        S: serde::Serialize,
    {
        Ok(self.render_value(to_value(ctx)?, options))
    }

    /// Render the template using a value directly.
    pub fn render_value(&self, value: Value, options: &Options<'_>) -> Rendered {
        tracing::trace!(source = %self.source(), "rendering template");
        render::program(self.engine, &self.program, value, options)
    }

    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &str {
        &self.program.source
    }

    /// Returns `true` if both templates share one compiled program.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.program, &other.program)
    }
}

impl fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source())
            .finish_non_exhaustive()
    }
}

impl Rendered {
    pub(crate) fn new(output: Output, errors: Vec<Error>) -> Self {
        Self { output, errors }
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// The execution errors collected during the render.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Returns the output as text, a raw value is stringified.
    pub fn into_string(self) -> String {
        self.output.to_string()
    }

    /// Returns the output as a value, text becomes a string value.
    pub fn into_value(self) -> Value {
        match self.output {
            Output::String(s) => Value::String(s),
            Output::Value(v) => v,
        }
    }

    pub fn into_parts(self) -> (Output, Vec<Error>) {
        (self.output, self.errors)
    }

    /// Returns the output, or the first error if any were collected.
    pub fn into_result(self) -> Result<Output> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.output),
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Value(v) => f.write_str(&v.stringify()),
        }
    }
}
