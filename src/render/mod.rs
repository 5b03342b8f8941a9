mod context;
mod core;
mod fmt;
mod stack;

pub use crate::render::context::PipeContext;
use crate::render::core::Renderer;
use crate::types::program::Program;
use crate::{Engine, Options, Rendered, Value};

/// Render a compiled program with the given input value.
///
/// Execution errors do not abort the render, they are collected next to the
/// output.
pub(crate) fn program(
    engine: &Engine,
    program: &Program,
    input: Value,
    options: &Options<'_>,
) -> Rendered {
    Renderer::new(engine, program, input, options).render(program)
}
