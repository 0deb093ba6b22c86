//! JSON documents as value graphs
//!
//! Arrays become sequences. Objects become mappings, or anonymous records
//! in [`ObjectMode::Records`]. Integer literals that fit `i64` become ints,
//! every other number a float.

use crate::config::ObjectMode;
use rehydrate_core::{Heap, Value};

pub fn to_value(heap: &mut Heap, json: &serde_json::Value, mode: ObjectMode) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Sequence(
            items
                .iter()
                .map(|item| to_value(heap, item, mode))
                .collect(),
        ),
        serde_json::Value::Object(map) => {
            let entries: Vec<(&str, Value)> = map
                .iter()
                .map(|(k, v)| (k.as_str(), to_value(heap, v, mode)))
                .collect();
            match mode {
                ObjectMode::Mappings => Value::Mapping(entries.into_iter().collect()),
                ObjectMode::Records => Value::Object(heap.record(entries)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehydrate_core::ObjectModel;

    #[test]
    fn test_numbers() {
        let mut heap = Heap::new();
        let json: serde_json::Value = serde_json::from_str("[1, -2, 1.5, 1.0, 18446744073709551615]").unwrap();
        assert_eq!(
            to_value(&mut heap, &json, ObjectMode::Mappings),
            Value::Sequence(vec![
                Value::Int(1),
                Value::Int(-2),
                Value::Float(1.5),
                Value::Float(1.0),
                Value::Float(18446744073709551615.0),
            ])
        );
    }

    #[test]
    fn test_objects_as_records() {
        let mut heap = Heap::new();
        let json: serde_json::Value = serde_json::from_str(r#"{"a": {"b": true}}"#).unwrap();
        let value = to_value(&mut heap, &json, ObjectMode::Records);
        let outer = value.as_object().unwrap();
        let props = heap.properties(outer).unwrap();
        let inner = props.get_str("a").and_then(Value::as_object).unwrap();
        assert_eq!(heap.get(inner, "b").unwrap(), Value::Bool(true));
    }
}
