pub mod options;
pub mod path;
pub mod pipe;
pub mod program;
pub mod span;
