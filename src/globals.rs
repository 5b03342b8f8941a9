//! Layered global variables.

use crate::value::Map;
use crate::Value;

/// A scope of global variables that masks an optional parent scope.
///
/// Lookups search this scope and then each parent in turn. Writes always go
/// to this scope, so a parent is never mutated through its child.
///
/// # Examples
///
/// ```
/// use waterpipe::{Globals, Value};
///
/// let mut site = Globals::new();
/// site.insert("title", "Home");
///
/// let mut page = Globals::with_parent(&site);
/// page.insert("title", "About");
/// assert_eq!(page.get("title"), Some(&Value::from("About")));
/// assert_eq!(site.get("title"), Some(&Value::from("Home")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Globals<'p> {
    vars: Map<String, Value>,
    parent: Option<&'p Globals<'p>>,
}

impl<'p> Globals<'p> {
    /// Construct an empty scope with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an empty scope that masks `parent`.
    pub fn with_parent(parent: &'p Globals<'p>) -> Self {
        Self {
            vars: Map::new(),
            parent: Some(parent),
        }
    }

    /// Returns the value of the variable in the nearest scope that defines
    /// it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.vars.get(name) {
            Some(v) => Some(v),
            None => self.parent.and_then(|p| p.get(name)),
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a variable in this scope, returning the previous local value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    /// Returns the number of distinct variables visible from this scope.
    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.parent.map_or(true, Globals::is_empty)
    }

    fn names(&self) -> Vec<&str> {
        let mut names = self.parent.map(Globals::names).unwrap_or_default();
        for name in self.vars.keys() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Merges every visible variable into one object, outermost scope first.
    pub fn to_value(&self) -> Value {
        let mut map = match self.parent.map(Globals::to_value) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (k, v) in &self.vars {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

impl<K, V> FromIterator<(K, V)> for Globals<'_>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            parent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_masks_parent() {
        let parent: Globals = [("a", 1), ("b", 2)].into_iter().collect();
        let mut child = Globals::with_parent(&parent);
        child.insert("a", 10);
        child.insert("c", 3);
        assert_eq!(child.get("a"), Some(&Value::from(10)));
        assert_eq!(child.get("b"), Some(&Value::from(2)));
        assert_eq!(parent.get("a"), Some(&Value::from(1)));
        assert_eq!(parent.get("c"), None);
        assert_eq!(child.len(), 3);
        assert_eq!(
            child.to_value(),
            crate::value!({ a: 10, b: 2, c: 3 })
        );
    }
}
