//! Native snapshots for opaque-serializable objects
//!
//! Opaque objects are not taken apart by the exporter. The model turns them
//! into bytes here and the emitted text carries those bytes as a literal,
//! handing them back to [`ObjectModel::native_unserialize`] on replay.
//!
//! # Why TypedValue?
//!
//! `Value` may hold object references, which only mean something inside the
//! model that owns them. `TypedValue` is the owned, reference-free subset
//! and can be serialized with serde/bincode.
//!
//! [`ObjectModel::native_unserialize`]: crate::ObjectModel::native_unserialize

use crate::value::{Key, Mapping, Value};
use serde::{Deserialize, Serialize};

/// Error during snapshot encoding/decoding
#[derive(Debug)]
pub enum SnapshotError {
    /// Object references cannot be captured in a native snapshot
    ObjectNotSerializable,
    /// Cannot serialize closures
    ClosureNotSerializable,
    /// Cannot serialize OS handles
    ResourceNotSerializable,
    /// Bincode encoding/decoding error (preserves original error for debugging)
    BincodeError(Box<bincode::Error>),
    /// Snapshot does not fit the layout of the class it names
    LayoutMismatch {
        class: String,
        expected: usize,
        found: usize,
    },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::ObjectNotSerializable => {
                write!(f, "Object references cannot be part of a native snapshot")
            }
            SnapshotError::ClosureNotSerializable => {
                write!(f, "Closures cannot be serialized - code is not data")
            }
            SnapshotError::ResourceNotSerializable => {
                write!(f, "Resources cannot be serialized - runtime state")
            }
            SnapshotError::BincodeError(e) => write!(f, "Bincode error: {}", e),
            SnapshotError::LayoutMismatch {
                class,
                expected,
                found,
            } => write!(
                f,
                "Snapshot of '{}' has {} slots, class declares {}",
                class, found, expected
            ),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::BincodeError(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<bincode::Error> for SnapshotError {
    fn from(e: bincode::Error) -> Self {
        SnapshotError::BincodeError(Box::new(e))
    }
}

/// Serializable map key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TypedKey {
    Int(i64),
    String(String),
}

impl TypedKey {
    pub fn from_key(key: &Key) -> Self {
        match key {
            Key::Int(n) => TypedKey::Int(*n),
            Key::String(s) => TypedKey::String(s.clone()),
        }
    }

    pub fn to_key(&self) -> Key {
        match self {
            TypedKey::Int(n) => Key::Int(*n),
            TypedKey::String(s) => Key::String(s.clone()),
        }
    }
}

/// Serializable, reference-free mirror of [`Value`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<TypedValue>),
    /// Entries keep their insertion order
    Mapping(Vec<(TypedKey, TypedValue)>),
}

impl TypedValue {
    /// Convert from a runtime Value
    ///
    /// Returns error if the Value contains an object reference, code or a
    /// resource. Floats are kept bit for bit, including NaN and infinities.
    pub fn from_value(value: &Value) -> Result<Self, SnapshotError> {
        match value {
            Value::Null => Ok(TypedValue::Null),
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            Value::Int(n) => Ok(TypedValue::Int(*n)),
            Value::Float(v) => Ok(TypedValue::Float(*v)),
            Value::String(s) => Ok(TypedValue::String(s.clone())),
            Value::Sequence(items) => {
                let mut typed = Vec::with_capacity(items.len());
                for item in items {
                    typed.push(TypedValue::from_value(item)?);
                }
                Ok(TypedValue::Sequence(typed))
            }
            Value::Mapping(m) => Ok(TypedValue::Mapping(typed_entries(m)?)),
            Value::Object(_) => Err(SnapshotError::ObjectNotSerializable),
            Value::Closure { .. } => Err(SnapshotError::ClosureNotSerializable),
            Value::Resource { .. } => Err(SnapshotError::ResourceNotSerializable),
        }
    }

    /// Convert back to a runtime Value
    pub fn to_value(&self) -> Value {
        match self {
            TypedValue::Null => Value::Null,
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Int(n) => Value::Int(*n),
            TypedValue::Float(v) => Value::Float(*v),
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Sequence(items) => {
                Value::Sequence(items.iter().map(TypedValue::to_value).collect())
            }
            TypedValue::Mapping(entries) => Value::Mapping(mapping_from_entries(entries)),
        }
    }
}

fn typed_entries(m: &Mapping) -> Result<Vec<(TypedKey, TypedValue)>, SnapshotError> {
    let mut entries = Vec::with_capacity(m.len());
    for (k, v) in m.iter() {
        entries.push((TypedKey::from_key(k), TypedValue::from_value(v)?));
    }
    Ok(entries)
}

fn mapping_from_entries(entries: &[(TypedKey, TypedValue)]) -> Mapping {
    entries
        .iter()
        .map(|(k, v)| (k.to_key(), v.to_value()))
        .collect()
}

/// State captured from an opaque object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NativeState {
    /// Declared-field slots, in the class layout order
    Slots(Vec<TypedValue>),
    /// Structural properties
    Properties(Vec<(TypedKey, TypedValue)>),
}

/// Everything needed to rebuild an opaque object in an equivalent model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeSnapshot {
    pub class: String,
    pub state: NativeState,
}

impl NativeSnapshot {
    pub fn from_slots(class: &str, slots: &[Value]) -> Result<Self, SnapshotError> {
        let mut typed = Vec::with_capacity(slots.len());
        for slot in slots {
            typed.push(TypedValue::from_value(slot)?);
        }
        Ok(NativeSnapshot {
            class: class.to_string(),
            state: NativeState::Slots(typed),
        })
    }

    pub fn from_properties(class: &str, props: &Mapping) -> Result<Self, SnapshotError> {
        Ok(NativeSnapshot {
            class: class.to_string(),
            state: NativeState::Properties(typed_entries(props)?),
        })
    }

    /// Properties as a runtime mapping (None for slot state)
    pub fn properties(&self) -> Option<Mapping> {
        match &self.state {
            NativeState::Properties(entries) => Some(mapping_from_entries(entries)),
            NativeState::Slots(_) => None,
        }
    }

    /// Slots as runtime values (None for property state)
    pub fn slots(&self) -> Option<Vec<Value>> {
        match &self.state {
            NativeState::Slots(slots) => Some(slots.iter().map(TypedValue::to_value).collect()),
            NativeState::Properties(_) => None,
        }
    }

    /// Serialize to binary format (bincode)
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::from)
    }

    /// Deserialize from binary format (bincode)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectRef;

    #[test]
    fn test_bytes_roundtrip() {
        let snapshot = NativeSnapshot::from_slots(
            "time.Period",
            &[
                Value::Int(10),
                Value::string("PT2S"),
                Value::Sequence(vec![Value::Bool(true), Value::Null]),
            ],
        )
        .unwrap();

        let bytes = snapshot.to_bytes().unwrap();
        let parsed = NativeSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(snapshot, parsed);
        assert_eq!(parsed.slots().unwrap()[1], Value::string("PT2S"));
    }

    #[test]
    fn test_properties_keep_order() {
        let props: Mapping = vec![
            ("z", Value::Int(1)),
            ("a", Value::Int(2)),
        ]
        .into_iter()
        .collect();
        let snapshot = NativeSnapshot::from_properties("time.Zone", &props).unwrap();
        let back = NativeSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        assert_eq!(back.properties().unwrap(), props);
    }

    #[test]
    fn test_object_not_serializable() {
        let result = NativeSnapshot::from_slots("x.Y", &[Value::Object(ObjectRef(0))]);
        assert!(matches!(result, Err(SnapshotError::ObjectNotSerializable)));
    }

    #[test]
    fn test_closure_not_serializable() {
        let value = Value::Closure {
            name: "handler".to_string(),
        };
        let result = TypedValue::from_value(&value);
        assert!(matches!(result, Err(SnapshotError::ClosureNotSerializable)));
    }

    #[test]
    fn test_non_finite_floats_survive_bytes() {
        let snapshot = NativeSnapshot::from_slots(
            "time.Period",
            &[
                Value::Float(f64::NAN),
                Value::Float(f64::INFINITY),
                Value::Float(f64::NEG_INFINITY),
                Value::Float(-0.0),
            ],
        )
        .unwrap();
        let back = NativeSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        let slots = back.slots().unwrap();
        assert!(matches!(slots[0], Value::Float(v) if v.is_nan()));
        assert_eq!(slots[1], Value::Float(f64::INFINITY));
        assert_eq!(slots[2], Value::Float(f64::NEG_INFINITY));
        assert!(matches!(slots[3], Value::Float(v) if v == 0.0 && v.is_sign_negative()));
    }

    #[test]
    fn test_corrupted_data_returns_error() {
        let corrupted = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(NativeSnapshot::from_bytes(&corrupted).is_err());
    }

    #[test]
    fn test_truncated_data_returns_error() {
        let snapshot = NativeSnapshot::from_slots("a.B", &[Value::string("hello world")]).unwrap();
        let bytes = snapshot.to_bytes().unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(NativeSnapshot::from_bytes(truncated).is_err());
    }
}
