use std::borrow::Cow;
use std::cell::OnceCell;

use crate::Value;

/// The evaluation stack of a render.
///
/// The bottom frame holds the root input value. Each `foreach` and each
/// lambda invocation pushes a frame on top.
#[derive(Debug)]
pub struct Stack {
    frames: Vec<Frame>,
}

/// A value on the evaluation stack that may be enumerated.
#[derive(Debug)]
pub struct Frame {
    value: Value,
    /// The enumeration keys, materialized on first use.
    keys: OnceCell<Vec<Value>>,
    /// The position of the current entry, `None` before the first advance.
    pos: Option<usize>,
}

impl Stack {
    pub fn new(root: Value) -> Self {
        Self {
            frames: vec![Frame::new(root)],
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// The innermost frame.
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// The current value of the frame `n` levels out from the innermost.
    pub fn value_at(&self, n: usize) -> Cow<'_, Value> {
        match self.frames.len().checked_sub(n + 1) {
            Some(i) => self.frames[i].current(),
            None => Cow::Owned(Value::Undefined),
        }
    }

    /// The current value of the outermost frame.
    pub fn root(&self) -> Cow<'_, Value> {
        match self.frames.first() {
            Some(frame) => frame.current(),
            None => Cow::Owned(Value::Undefined),
        }
    }
}

impl Frame {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            keys: OnceCell::new(),
            pos: None,
        }
    }

    /// A frame positioned on a single entry, as seen by a lambda.
    pub fn entry(key: Value, value: Value) -> Self {
        let mut map = crate::value::Map::new();
        map.insert(key.to_string(), value);
        Self {
            value: Value::Object(map),
            keys: OnceCell::from(vec![key]),
            pos: Some(0),
        }
    }

    fn keys(&self) -> &[Value] {
        self.keys.get_or_init(|| match &self.value {
            Value::Array(list) => (0..list.len()).map(Value::from).collect(),
            Value::String(s) => (0..s.chars().count()).map(Value::from).collect(),
            value => value.keys().into_iter().map(Value::String).collect(),
        })
    }

    /// Moves to the next entry, returns `false` once every entry was visited.
    pub fn advance(&mut self) -> bool {
        let len = self.keys().len();
        let next = self.pos.map_or(0, |p| p + 1);
        self.pos = Some(next.min(len));
        next < len
    }

    fn current_key(&self) -> Option<&Value> {
        self.keys().get(self.pos?)
    }

    /// The current entry while enumerating, otherwise the frame value.
    pub fn current(&self) -> Cow<'_, Value> {
        match self.current_key() {
            Some(key) => self.value.property(&key.to_string()),
            None => Cow::Borrowed(&self.value),
        }
    }

    /// The key of the current entry, numeric for arrays and strings.
    pub fn key(&self) -> Value {
        self.current_key().cloned().unwrap_or_default()
    }

    /// The position of the current entry.
    pub fn index(&self) -> Value {
        match self.current_key() {
            Some(_) => Value::from(self.pos.unwrap_or_default()),
            None => Value::Undefined,
        }
    }

    /// The number of entries, zero for `undefined` and `null`.
    pub fn count(&self) -> Value {
        Value::from(self.keys().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    #[test]
    fn frame_enumerates_object() {
        let mut frame = Frame::new(value!({ a: 1, b: 2 }));
        assert_eq!(frame.key(), Value::Undefined);
        assert_eq!(frame.count(), Value::from(2));
        assert!(frame.advance());
        assert_eq!(frame.key(), Value::from("a"));
        assert_eq!(*frame.current(), Value::from(1));
        assert!(frame.advance());
        assert_eq!(frame.index(), Value::from(1));
        assert!(!frame.advance());
        assert!(!frame.advance());
    }

    #[test]
    fn frame_enumerates_array() {
        let mut frame = Frame::new(value!(["x", "y"]));
        assert!(frame.advance());
        assert!(frame.advance());
        assert_eq!(frame.key(), Value::from(1));
        assert_eq!(*frame.current(), Value::from("y"));
    }

    #[test]
    fn frame_nullish_is_empty() {
        let mut frame = Frame::new(Value::Null);
        assert_eq!(frame.count(), Value::from(0));
        assert!(!frame.advance());
    }

    #[test]
    fn frame_entry() {
        let frame = Frame::entry(Value::from(3), Value::from("v"));
        assert_eq!(frame.key(), Value::from(3));
        assert_eq!(frame.index(), Value::from(0));
        assert_eq!(*frame.current(), Value::from("v"));
    }

    #[test]
    fn stack_value_at() {
        let mut stack = Stack::new(value!({ a: 1 }));
        let mut frame = Frame::new(value!([10, 20]));
        frame.advance();
        stack.push(frame);
        assert_eq!(*stack.value_at(0), Value::from(10));
        assert_eq!(*stack.value_at(1), value!({ a: 1 }));
        assert_eq!(*stack.value_at(2), Value::Undefined);
        assert_eq!(*stack.root(), value!({ a: 1 }));
    }
}
