/// The whitespace waiting to be written before the next output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// Drop any whitespace that follows.
    Suppress,
    None,
    /// Write a single space before the next output.
    Space,
}

/// The output buffer of a render.
///
/// Collapsible whitespace is held back until it is known whether anything
/// follows it.
#[derive(Debug)]
pub struct Formatter<'a> {
    buf: String,
    pending: Pending,
    indent: &'a str,
    padding: &'a str,
    /// The range of the last line break written.
    last_break: Option<(usize, usize)>,
}

impl<'a> Formatter<'a> {
    pub fn new(indent: &'a str, padding: &'a str) -> Self {
        Self {
            buf: String::new(),
            pending: Pending::Suppress,
            indent,
            padding,
            last_break: None,
        }
    }

    /// Writes the result of an expression.
    pub fn write_value(&mut self, s: &str, escape: bool) {
        if self.pending == Pending::Space {
            self.buf.push(' ');
        }
        self.pending = Pending::None;
        if escape {
            escape_html(&mut self.buf, s);
        } else {
            self.buf.push_str(s);
        }
    }

    /// Writes template text.
    pub fn write_literal(&mut self, s: &str, trim_start: bool, trim_end: bool) {
        if self.pending == Pending::Space && !trim_start {
            self.buf.push(' ');
        }
        self.buf.push_str(s);
        self.pending = if trim_end {
            Pending::Suppress
        } else {
            Pending::None
        };
    }

    /// Writes a whitespace run that collapses to at most one space.
    pub fn write_space(&mut self) {
        self.pending = match self.pending {
            Pending::Suppress => Pending::None,
            _ => Pending::Space,
        };
    }

    /// Writes a line break indented to `depth`.
    ///
    /// Nothing is written at the very start of the output. A break directly
    /// following another break replaces it.
    pub fn write_newline(&mut self, depth: usize) {
        if self.buf.is_empty() {
            return;
        }
        let start = match self.last_break {
            Some((m, n)) if n == self.buf.len() => m,
            _ => self.buf.len(),
        };
        self.buf.truncate(start);
        self.buf.push_str("\r\n");
        for _ in 0..depth {
            self.buf.push_str(self.indent);
        }
        self.buf.push_str(self.padding);
        self.last_break = Some((start, self.buf.len()));
        self.pending = Pending::Suppress;
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Escapes the HTML special characters `&<>"'`.
pub fn escape_html(buf: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            '\'' => buf.push_str("&#39;"),
            c => buf.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_between_literals() {
        let mut f = Formatter::new("  ", "");
        f.write_space();
        f.write_literal("<b>", false, true);
        f.write_space();
        f.write_literal("x", false, false);
        f.write_space();
        f.write_literal("y", false, false);
        f.write_space();
        f.write_literal("</b>", true, false);
        assert_eq!(f.into_string(), "<b>x y</b>");
    }

    #[test]
    fn newline_indent() {
        let mut f = Formatter::new("\t", "> ");
        f.write_newline(1);
        f.write_literal("<ul>", false, true);
        f.write_newline(1);
        f.write_newline(2);
        f.write_literal("<li>", false, true);
        assert_eq!(f.into_string(), "<ul>\r\n\t\t> <li>");
    }

    #[test]
    fn escape_special_chars() {
        let mut buf = String::new();
        escape_html(&mut buf, r#"<a href="x">'&'</a>"#);
        assert_eq!(
            buf,
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }
}
