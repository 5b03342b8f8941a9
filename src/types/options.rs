use crate::Globals;

/// The options of a single render.
///
/// Use [`Options::default()`] for the defaults and the builder methods to
/// change them.
///
/// # Examples
///
/// ```
/// use waterpipe::Options;
///
/// let mut options = Options::new();
/// options.indent_width(4).raw_value(true);
/// ```
#[derive(Debug, Clone)]
pub struct Options<'g> {
    pub(crate) indent: String,
    pub(crate) indent_padding: String,
    pub(crate) raw_value: bool,
    pub(crate) globals: Option<&'g Globals<'g>>,
    /// How many template renders enclose this one.
    pub(crate) nesting: usize,
}

impl Default for Options<'_> {
    /// Returns the default options, indenting with two spaces.
    fn default() -> Self {
        Self {
            indent: String::from("  "),
            indent_padding: String::new(),
            raw_value: false,
            globals: None,
            nesting: 0,
        }
    }
}

impl<'g> Options<'g> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text a line break is indented with for each open element.
    pub fn indent(&mut self, indent: impl Into<String>) -> &mut Self {
        self.indent = indent.into();
        self
    }

    /// Indent line breaks with `n` spaces for each open element.
    pub fn indent_width(&mut self, n: usize) -> &mut Self {
        self.indent = " ".repeat(n);
        self
    }

    /// Set extra text written after the indentation of every line break.
    pub fn indent_padding(&mut self, padding: impl Into<String>) -> &mut Self {
        self.indent_padding = padding.into();
        self
    }

    /// Return the value of a template that consists of a single expression
    /// instead of its text.
    pub fn raw_value(&mut self, yes: bool) -> &mut Self {
        self.raw_value = yes;
        self
    }

    /// Set the globals the render's own globals are layered on.
    pub fn globals(&mut self, globals: &'g Globals<'g>) -> &mut Self {
        self.globals = Some(globals);
        self
    }
}
