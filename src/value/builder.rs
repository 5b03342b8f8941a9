use crate::value::{List, Map};
use crate::Value;

/// Accumulates results into an array or an object.
///
/// The mode is fixed at construction. In array mode keys are ignored, in
/// object mode entries keep their insertion order and a repeated key
/// overwrites the earlier value in place.
#[derive(Debug, Clone)]
pub enum Collection {
    Array(List<Value>),
    Object(Map<String, Value>),
}

impl Collection {
    pub fn new(array: bool) -> Self {
        if array {
            Self::Array(List::new())
        } else {
            Self::Object(Map::new())
        }
    }

    /// A collection shaped like `value`, an array for arrays and strings and
    /// an object for anything else.
    pub fn like(value: &Value) -> Self {
        Self::new(matches!(value, Value::Array(_) | Value::String(_)))
    }

    pub fn push(&mut self, value: Value, key: impl Into<String>) {
        match self {
            Self::Array(list) => list.push(value),
            Self::Object(map) => {
                map.insert(key.into(), value);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Array(list) => list.len(),
            Self::Object(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Array(list) => Value::Array(list),
            Self::Object(map) => Value::Object(map),
        }
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        c.into_value()
    }
}

/// Recursively expands nested arrays into one flat array, dropping `null`
/// and `undefined` elements. Any other value is returned unchanged.
pub fn flatten(value: Value) -> Value {
    match value {
        Value::Array(list) => {
            let mut out = List::with_capacity(list.len());
            flatten_into(list, &mut out);
            Value::Array(out)
        }
        value => value,
    }
}

fn flatten_into(list: List<Value>, out: &mut List<Value>) {
    for value in list {
        match value {
            Value::Array(inner) => flatten_into(inner, out),
            v if v.is_nullish() => {}
            v => out.push(v),
        }
    }
}
