//! Runtime values as seen by the exporter and the replay evaluator.
//!
//! Scalars and collections are plain data. Complex objects live in an
//! [`ObjectModel`](crate::ObjectModel) and are referenced by identity
//! through [`ObjectRef`], so the same object reachable from two places is
//! the same `ObjectRef` in both.

use std::fmt;

/// Identity of an object owned by an object model.
///
/// Two refs compare equal iff they point at the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub u32);

impl ObjectRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mapping key: the hashable subset of Value
///
/// Float is excluded, same as for runtime maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    String(String),
}

impl Key {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            Key::Int(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

/// Insertion-ordered key/value collection with unique keys.
///
/// Lookups are linear; mappings handed to the exporter are small and the
/// order they were built in is part of the emitted text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(Key, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Mapping::default()
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn insert(&mut self, key: impl Into<Key>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// True when the keys are exactly 0..n-1 in order.
    ///
    /// Such mappings are emitted in the compact sequence form.
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == Key::Int(i as i64))
    }
}

impl IntoIterator for Mapping {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<Key>> FromIterator<(K, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

impl From<Vec<Value>> for Mapping {
    fn from(items: Vec<Value>) -> Self {
        Mapping {
            entries: items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::Int(i as i64), v))
                .collect(),
        }
    }
}

/// Value: what the exporter walks and the replay evaluator produces
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    Bool(bool),

    Int(i64),

    /// IEEE 754 double; NaN and the infinities are representable
    Float(f64),

    String(String),

    /// Ordered list, emitted without explicit indices
    Sequence(Vec<Value>),

    /// Ordered keyed collection
    Mapping(Mapping),

    /// Reference into an object model. Shared and cyclic graphs are built
    /// out of these.
    Object(ObjectRef),

    /// Function-like value. Code is not data: never exportable.
    Closure { name: String },

    /// OS-level handle (stream, socket, ...). Never exportable.
    Resource { kind: String, id: u64 },
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    /// Human-readable runtime type name, used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Sequence(_) => "sequence".to_string(),
            Value::Mapping(_) => "mapping".to_string(),
            Value::Object(_) => "object".to_string(),
            Value::Closure { .. } => "closure".to_string(),
            Value::Resource { kind, .. } => format!("resource ({})", kind),
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Value::Object(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

impl From<ObjectRef> for Value {
    fn from(r: ObjectRef) -> Self {
        Value::Object(r)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut m = Mapping::new();
        m.insert("a", Value::Int(1));
        m.insert("b", Value::Int(2));
        m.insert("a", Value::Int(3));

        let keys: Vec<String> = m.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(m.get_str("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_is_list() {
        let list = Mapping::from(vec![Value::Int(1), Value::Int(2)]);
        assert!(list.is_list());

        let mut gap = Mapping::new();
        gap.insert(0i64, Value::Null);
        gap.insert(2i64, Value::Null);
        assert!(!gap.is_list());

        let mut reordered = Mapping::new();
        reordered.insert(1i64, Value::Null);
        reordered.insert(0i64, Value::Null);
        assert!(!reordered.is_list());

        assert!(Mapping::new().is_list());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(
            Value::Closure {
                name: "f".to_string()
            }
            .type_name(),
            "closure"
        );
        assert_eq!(
            Value::Resource {
                kind: "stream".to_string(),
                id: 3
            }
            .type_name(),
            "resource (stream)"
        );
    }
}
