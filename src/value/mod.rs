//! Defines the [`Value`] enum, the dynamic data a template is evaluated
//! against.
//!
//! Values follow JavaScript-like semantics: there is a distinct `undefined`
//! and `null`, every number is a double, and objects keep their keys in
//! insertion order.

mod builder;
mod cmp;
mod from;
pub(crate) mod number;
mod ser;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub use indexmap::map;
pub use indexmap::IndexMap as Map;
pub use std::vec::Vec as List;

pub use crate::value::builder::{flatten, Collection};
pub use crate::value::cmp::{compare, loose_eq};
pub use crate::value::ser::to_value;

/// Data to be rendered represented as a recursive enum.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(List<Value>),
    Object(Map<String, Value>),
    Function(Callable),
}

/// A host function stored inside a [`Value`].
///
/// Callables are never rendered. A pipe function that expects a lambda
/// accepts a callable in its place.
#[derive(Clone)]
pub struct Callable(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<function>")
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Value {
    /// Returns a human readable name of the value's type.
    pub fn human(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
        }
    }

    /// Returns `true` for `undefined` and `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Object(_) | Self::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Number(n) if n.is_nan())
    }

    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => !(*n == 0.0 || n.is_nan()),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) => true,
        }
    }

    /// Numeric coercion.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined | Self::Function(_) => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => number::parse(s),
            Self::Array(_) => number::parse(&self.to_string()),
            Self::Object(_) => f64::NAN,
        }
    }

    /// Like [`to_number`][Value::to_number] but `NaN` becomes zero.
    pub fn to_number_or_zero(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    /// The text of a value as used by comparisons and string functions.
    ///
    /// Nullish values, `NaN` and callables become the empty string, every
    /// other value uses string coercion.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::String(s) => Cow::Borrowed(s),
            v if v.is_nullish() || v.is_nan() => Cow::Borrowed(""),
            Self::Function(_) => Cow::Borrowed(""),
            v => Cow::Owned(v.to_string()),
        }
    }

    /// The text of a value as emitted by an expression.
    ///
    /// Same as [`as_text`][Value::as_text] except that arrays and objects
    /// are serialized as JSON.
    pub fn stringify(&self) -> Cow<'_, str> {
        match self {
            Self::String(s) => Cow::Borrowed(s),
            v if v.is_nullish() || v.is_nan() => Cow::Borrowed(""),
            Self::Function(_) => Cow::Borrowed(""),
            v => Cow::Owned(v.to_json()),
        }
    }

    /// Serializes the value as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }

    /// Returns `true` if the property exists and is not a callable.
    ///
    /// Any integer name is considered a property of an array.
    pub fn has_property(&self, name: &str) -> bool {
        match self {
            Self::Array(_) => name.parse::<i32>().is_ok() || name == "length",
            Self::Object(map) => !matches!(map.get(name), None | Some(Self::Function(_))),
            Self::String(s) => {
                name == "length" || index(name).map_or(false, |i| i < s.chars().count())
            }
            _ => false,
        }
    }

    /// Property access, returns `undefined` if the property does not exist.
    pub fn property(&self, name: &str) -> Cow<'_, Value> {
        match self {
            Self::Array(list) => {
                if name == "length" {
                    return Cow::Owned(Self::from(list.len()));
                }
                match index(name).and_then(|i| list.get(i)) {
                    Some(v) => Cow::Borrowed(v),
                    None => Cow::Owned(Self::Undefined),
                }
            }
            Self::Object(map) => match map.get(name) {
                Some(v) => Cow::Borrowed(v),
                None => Cow::Owned(Self::Undefined),
            },
            Self::String(s) => {
                if name == "length" {
                    return Cow::Owned(Self::from(s.chars().count()));
                }
                match index(name).and_then(|i| s.chars().nth(i)) {
                    Some(c) => Cow::Owned(Self::String(c.to_string())),
                    None => Cow::Owned(Self::Undefined),
                }
            }
            _ => Cow::Owned(Self::Undefined),
        }
    }

    /// Returns the own enumerable keys in iteration order.
    ///
    /// Arrays and strings enumerate their indices, objects their keys in
    /// insertion order and every other value nothing.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Self::Array(list) => (0..list.len()).map(|i| i.to_string()).collect(),
            Self::Object(map) => map.keys().cloned().collect(),
            Self::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the own enumerable entries in iteration order.
    ///
    /// Array and string keys are numbers, object keys are strings.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        match self {
            Self::Array(list) => list
                .iter()
                .enumerate()
                .map(|(i, v)| (Self::from(i), v.clone()))
                .collect(),
            Self::Object(map) => map
                .iter()
                .map(|(k, v)| (Self::String(k.clone()), v.clone()))
                .collect(),
            Self::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (Self::from(i), Self::String(c.to_string())))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the elements of an array, or the value itself as a single
    /// element.
    pub fn to_list(&self) -> List<Value> {
        match self {
            Self::Array(list) => list.clone(),
            v => vec![v.clone()],
        }
    }

    /// Takes the value out, leaving `undefined` in its place.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }
}

/// String coercion.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => f.write_str(&number::to_string(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(list) => {
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !v.is_nullish() {
                        write!(f, "{}", v)?;
                    }
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("[object Object]"),
            Self::Function(_) => f.write_str("function"),
        }
    }
}

fn index(name: &str) -> Option<usize> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    name.parse().ok()
}
