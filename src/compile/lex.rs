use crate::types::span::Span;

/// A lexer that splits the template source into text and `{{ ... }}`
/// constructs.
///
/// Comment constructs are dropped and the text around them is joined, so
/// the HTML scanner never sees a comment as a boundary. A `{{` that does not
/// start a well formed construct is kept as text.
pub struct Lexer<'source> {
    source: &'source str,
    cursor: usize,
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'source> {
    /// Template text.
    Text(String),
    Construct(Construct<'source>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construct<'source> {
    pub tag: Tag,
    /// The content after the tag with surrounding whitespace removed.
    pub content: &'source str,
    /// The offset of `content` in the template source.
    pub offset: usize,
    /// The span of the whole construct including the braces.
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `{{ pipe }}`
    Eval,
    /// `{{& pipe }}`
    Raw,
    /// `{{if pipe}}` or `{{if not pipe}}`
    If { negate: bool },
    /// `{{elseif pipe}}` or `{{elseif not pipe}}`
    ElseIf { negate: bool },
    /// `{{else}}`
    Else,
    /// `{{foreach pipe}}`
    Foreach,
    /// `{{/if}}` or `{{/foreach}}`
    Close,
    /// `{{! comment }}`
    Comment,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self { source, cursor: 0 }
    }

    /// Finds the next well formed construct at or after `from`.
    fn find_construct(&self, mut from: usize) -> Option<Construct<'source>> {
        while let Some(i) = self.source[from..].find("{{") {
            let begin = from + i;
            if let Some(c) = self.construct_at(begin) {
                return Some(c);
            }
            from = begin + 1;
        }
        None
    }

    fn construct_at(&self, begin: usize) -> Option<Construct<'source>> {
        let after = begin + 2;
        let (tag, len) = lex_tag(&self.source[after..]);
        let start = after + len;
        let rest = &self.source[start..];
        let close = rest.find("}}")?;
        let raw = &rest[..close];
        let content = raw.trim_start();
        let offset = start + (raw.len() - content.len());
        let content = content.trim_end();
        if content.is_empty() && matches!(tag, Tag::Eval | Tag::Raw) {
            return None;
        }
        Some(Construct {
            tag,
            content,
            offset,
            span: Span::from(begin..start + close + 2),
        })
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Token<'source>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut text = String::new();
        loop {
            if self.cursor >= self.source.len() {
                return (!text.is_empty()).then_some(Token::Text(text));
            }
            match self.find_construct(self.cursor) {
                Some(c) => {
                    text.push_str(&self.source[self.cursor..c.span.m]);
                    if c.tag == Tag::Comment {
                        self.cursor = c.span.n;
                        continue;
                    }
                    if !text.is_empty() {
                        // Yield the text now and the construct on the next
                        // call.
                        self.cursor = c.span.m;
                        return Some(Token::Text(text));
                    }
                    self.cursor = c.span.n;
                    return Some(Token::Construct(c));
                }
                None => {
                    text.push_str(&self.source[self.cursor..]);
                    self.cursor = self.source.len();
                }
            }
        }
    }
}

/// Returns the tag at the start of `s` and the number of bytes it spans.
fn lex_tag(s: &str) -> (Tag, usize) {
    if s.starts_with('/') {
        return (Tag::Close, 1);
    }
    if s.starts_with('!') {
        return (Tag::Comment, 1);
    }
    if s.starts_with('&') {
        return (Tag::Raw, 1);
    }
    if let Some(n) = keyword(s, "foreach", true) {
        return (Tag::Foreach, n);
    }
    if let Some(n) = keyword(s, "if", false) {
        let (negate, m) = negation(&s[n..]);
        return (Tag::If { negate }, n + m);
    }
    if let Some(n) = keyword(s, "elseif", false) {
        let (negate, m) = negation(&s[n..]);
        return (Tag::ElseIf { negate }, n + m);
    }
    if let Some(n) = keyword(s, "else", true) {
        return (Tag::Else, n);
    }
    (Tag::Eval, 0)
}

/// Matches `word` followed by whitespace, or by `}` if `closed` is set.
fn keyword(s: &str, word: &str, closed: bool) -> Option<usize> {
    let rest = s.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() => Some(word.len()),
        Some('}') if closed => Some(word.len()),
        _ => None,
    }
}

fn negation(s: &str) -> (bool, usize) {
    let ws = s.len() - s.trim_start().len();
    match keyword(&s[ws..], "not", false) {
        Some(n) => (true, ws + n),
        None => (false, 0),
    }
}
