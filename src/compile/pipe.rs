//! Tokenizes the text of a construct into a [`Pipe`].

use crate::types::pipe::{ArgMode, Pipe, PipeArgument};
use crate::types::span::Span;
use crate::value::number;
use crate::Value;

/// Tokenizes a pipe expression.
///
/// Tokens are separated by whitespace. A double quoted token may contain
/// whitespace and is always a constant, a string unless its text is a
/// keyword or a number. A backslash escapes the character after it. `offset` is the position of `text` in the template
/// source and is used for the token spans.
pub fn parse(text: &str, offset: usize) -> Pipe {
    let mut args = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        match token_at(text, pos) {
            Some((arg, end)) => {
                args.push(arg.offset(offset));
                pos = end;
            }
            None => pos += text[pos..].chars().next().map_or(1, char::len_utf8),
        }
    }
    match_lambdas(&mut args);
    Pipe {
        args,
        span: Span::from(offset..offset + text.len()),
    }
}

fn token_at(text: &str, pos: usize) -> Option<(PipeArgument, usize)> {
    let rest = &text[pos..];
    let mut chars = rest.char_indices().peekable();
    let (_, first) = chars.next()?;

    if first == '"' {
        let mut escaped = false;
        for (i, c) in chars {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    let text = unescape(&rest[1..i]);
                    let value = keyword(&text).unwrap_or_else(|| Value::String(text.clone()));
                    let span = Span::from(pos..pos + i + 1);
                    let arg = PipeArgument::new(text, value, ArgMode::Constant, span);
                    return Some((arg, pos + i + 1));
                }
                _ => {}
            }
        }
        // An unterminated quote is skipped.
        return None;
    }

    if first.is_whitespace() {
        return None;
    }

    let mut end = rest.len();
    let mut escaped = first == '\\';
    if escaped && chars.peek().is_none() {
        return None;
    }
    while let Some((i, c)) = chars.next() {
        if escaped {
            escaped = false;
        } else if c.is_whitespace() {
            end = i;
            break;
        } else if c == '\\' {
            if chars.peek().is_none() {
                end = i;
                break;
            }
            escaped = true;
        }
    }

    let raw = &rest[..end];
    let text = unescape(raw);
    let span = Span::from(pos..pos + end);
    let arg = if raw.starts_with('$') {
        PipeArgument::new(text.clone(), Value::String(text), ArgMode::Evaluated, span)
    } else if let Some(value) = keyword(raw) {
        PipeArgument::new(text, value, ArgMode::Constant, span)
    } else {
        PipeArgument::new(text.clone(), Value::String(text), ArgMode::Auto, span)
    };
    Some((arg, pos + end))
}

fn keyword(raw: &str) -> Option<Value> {
    match raw {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        "undefined" => Some(Value::Undefined),
        _ => number::parse_literal(raw).map(Value::Number),
    }
}

fn unescape(raw: &str) -> String {
    let mut s = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => s.extend(chars.next()),
            c => s.push(c),
        }
    }
    s
}

/// Records on each `[` token the distance to its matching `]`.
fn match_lambdas(args: &mut [PipeArgument]) {
    let mut open = Vec::new();
    for i in 0..args.len() {
        if args[i].mode != ArgMode::Auto {
            continue;
        }
        match args[i].text.as_str() {
            "[" => open.push(i),
            "]" => {
                if let Some(start) = open.pop() {
                    args[start].lambda_len = i - start;
                }
            }
            _ => {}
        }
    }
}
