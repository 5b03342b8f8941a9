//! Tracks HTML structure across the text of a template.
//!
//! The scanner splits text into [`Instr::Literal`] pieces at element
//! boundaries and turns whitespace between tags into [`Instr::Space`]
//! instructions. The element nesting depth is recorded on every piece so the
//! renderer can indent line breaks.

use crate::types::program::Instr;

const VOID: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements whose content is emitted without touching whitespace.
const RAW_TEXT: &[&str] = &["script", "style", "pre", "textarea"];

/// What is found on one side of a whitespace run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
    Tag,
    Construct,
    Text,
}

#[derive(Debug)]
pub struct Html {
    /// Names of the open elements, innermost last.
    open: Vec<String>,
    /// The tag whose markup is being scanned.
    tag: Option<Markup>,
    /// The text that ends the current verbatim section.
    verbatim: Option<String>,
    /// What precedes the current position.
    left: Edge,
}

#[derive(Debug)]
struct Markup {
    name: String,
    closing: bool,
    quote: Option<char>,
    self_closing: bool,
}

/// The pending literal piece of the current chunk.
struct Piece {
    start: usize,
    trim_start: bool,
}

impl Html {
    pub fn new() -> Self {
        Self {
            open: Vec::new(),
            tag: None,
            verbatim: None,
            left: Edge::Start,
        }
    }

    /// The number of open elements.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Marks the position after a construct.
    pub fn construct(&mut self) {
        self.left = Edge::Construct;
    }

    /// Scans a chunk of template text, `right` is what follows it.
    pub fn scan(&mut self, text: &str, right: Edge, out: &mut Vec<Instr>) {
        let mut piece = Piece {
            start: 0,
            trim_start: false,
        };
        let mut i = 0;
        while i < text.len() {
            let rest = &text[i..];

            if let Some(term) = &self.verbatim {
                self.left = Edge::Text;
                match rest.to_ascii_lowercase().find(term.as_str()) {
                    Some(j) if term == "-->" => i += j + term.len(),
                    Some(j) => i += j,
                    None => break,
                }
                self.verbatim = None;
                continue;
            }

            let Some(c) = rest.chars().next() else {
                break;
            };

            if let Some(tag) = &mut self.tag {
                match (tag.quote, c) {
                    (Some(q), c) if c == q => tag.quote = None,
                    (Some(_), _) => {}
                    (None, '"' | '\'') => tag.quote = Some(c),
                    (None, '>') => {
                        self.end_tag(text, &mut piece, i + 1, out);
                        i += 1;
                        continue;
                    }
                    (None, c) if !c.is_whitespace() => tag.self_closing = c == '/',
                    _ => {}
                }
                i += c.len_utf8();
                continue;
            }

            if rest.starts_with("<!--") {
                self.verbatim = Some(String::from("-->"));
                i += 4;
                continue;
            }

            if let Some((closing, name)) = tag_start(rest) {
                if closing {
                    self.flush(text, &mut piece, i, false, out);
                    if let Some(pos) = self.open.iter().rposition(|n| *n == name) {
                        self.open.truncate(pos);
                    }
                    piece.trim_start = true;
                }
                self.tag = Some(Markup {
                    name,
                    closing,
                    quote: None,
                    self_closing: false,
                });
                i += 1;
                continue;
            }

            if c.is_whitespace() {
                let end = rest
                    .find(|c: char| !c.is_whitespace())
                    .map_or(text.len(), |j| i + j);
                let right = if end == text.len() {
                    right
                } else if tag_start(&text[end..]).is_some() {
                    Edge::Tag
                } else {
                    Edge::Text
                };
                let left = self.left;
                if collapsible(left, right) {
                    self.flush(text, &mut piece, i, false, out);
                    let newline =
                        text[i..end].contains('\n') && left != Edge::Start && right != Edge::End;
                    // The depth is filled in once the whole template is compiled.
                    out.push(Instr::Space { newline, depth: 0 });
                    piece.start = end;
                }
                i = end;
                continue;
            }

            self.left = Edge::Text;
            i += c.len_utf8();
        }
        self.flush(text, &mut piece, text.len(), false, out);
    }

    /// Emits closing tags for every element opened above `base`.
    pub fn close_to(&mut self, base: usize, out: &mut Vec<Instr>) {
        while self.open.len() > base {
            let Some(name) = self.open.pop() else {
                break;
            };
            out.push(Instr::Literal {
                text: format!("</{name}>"),
                trim_start: true,
                trim_end: false,
                depth: self.open.len(),
            });
        }
    }

    fn end_tag(&mut self, text: &str, piece: &mut Piece, end: usize, out: &mut Vec<Instr>) {
        self.left = Edge::Tag;
        let Some(tag) = self.tag.take() else {
            return;
        };
        if tag.closing
            || tag.self_closing
            || tag.name.starts_with('!')
            || VOID.contains(&tag.name.as_str())
        {
            return;
        }
        self.flush(text, piece, end, true, out);
        if RAW_TEXT.contains(&tag.name.as_str()) {
            self.verbatim = Some(format!("</{}", tag.name));
        }
        self.open.push(tag.name);
    }

    fn flush(&self, text: &str, piece: &mut Piece, end: usize, trim_end: bool, out: &mut Vec<Instr>) {
        if piece.start < end {
            out.push(Instr::Literal {
                text: text[piece.start..end].to_owned(),
                trim_start: piece.trim_start,
                trim_end,
                depth: self.open.len(),
            });
        }
        piece.start = end;
        piece.trim_start = false;
    }
}

fn collapsible(left: Edge, right: Edge) -> bool {
    matches!(left, Edge::Start | Edge::Tag | Edge::Construct)
        && matches!(right, Edge::End | Edge::Tag | Edge::Construct)
        && (left == Edge::Tag || right == Edge::Tag)
}

/// Recognizes `<name`, `</name` and `<!` returning whether the tag closes an
/// element and its lowercase name.
fn tag_start(s: &str) -> Option<(bool, String)> {
    let rest = s.strip_prefix('<')?;
    let (closing, rest) = match rest.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    let first = rest.chars().next()?;
    if !(is_name_start(first) || (first == '!' && !closing)) {
        return None;
    }
    let len = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    Some((closing, rest[..len].to_lowercase()))
}

#[cfg(feature = "unicode")]
fn is_name_start(c: char) -> bool {
    unicode_ident::is_xid_start(c)
}

#[cfg(not(feature = "unicode"))]
fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Vec<String> {
        let mut html = Html::new();
        let mut out = Vec::new();
        html.scan(text, Edge::End, &mut out);
        html.close_to(0, &mut out);
        out.into_iter()
            .map(|instr| match instr {
                Instr::Literal {
                    text,
                    trim_start,
                    trim_end,
                    depth,
                } => format!(
                    "{}{text}{} @{depth}",
                    if trim_start { "|" } else { "" },
                    if trim_end { "|" } else { "" }
                ),
                Instr::Space { newline: true, .. } => String::from("NL"),
                Instr::Space { .. } => String::from("SP"),
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn scan_nested() {
        assert_eq!(
            scan("<ul>\n  <li>a</li>\n</ul>"),
            ["<ul>| @0", "NL", "<li>| @1", "a @2", "|</li> @1", "NL", "|</ul> @0"]
        );
    }

    #[test]
    fn scan_collapses_between_tags() {
        assert_eq!(
            scan("<b>x</b> <i>y</i>"),
            ["<b>| @0", "x @1", "|</b> @0", "SP", "<i>| @0", "y @1", "|</i> @0"]
        );
    }

    #[test]
    fn scan_keeps_text_whitespace() {
        assert_eq!(scan("a b"), ["a b @0"]);
        assert_eq!(scan("<p>a b </p>"), ["<p>| @0", "a b  @1", "|</p> @0"]);
    }

    #[test]
    fn scan_void_and_attributes() {
        assert_eq!(
            scan(r#"<img src="a>b"> <br/><p class='x'>"#),
            [
                r#"<img src="a>b"> @0"#,
                "SP",
                "<br/><p class='x'>| @0",
                "|</p> @0"
            ]
        );
    }

    #[test]
    fn scan_edges() {
        assert_eq!(scan("\n<p>x</p>\n"), ["SP", "<p>| @0", "x @1", "|</p> @0", "SP"]);
    }

    #[test]
    fn scan_verbatim_sections() {
        assert_eq!(
            scan("<pre> a\n </pre><!-- <b> -->"),
            ["<pre>| @0", " a\n  @1", "|</pre><!-- <b> --> @0"]
        );
    }

    #[test]
    fn scan_unmatched_close_is_ignored() {
        assert_eq!(scan("</div>x"), ["|</div>x @0"]);
    }
}
