//! Hydrator
//!
//! The reconstruction helper the exported text calls into:
//! `alloc(@Class)` creates an instance without running initialization and
//! `fill(obj, data)` populates it.
//!
//! Population order for one object:
//! 1. A custom-unserialize hook receives `data` and nothing else runs.
//! 2. Structural classes (records, date-like value types) get every entry
//!    assigned as a property by plain name.
//! 3. Otherwise each key is resolved to a declared slot and assigned
//!    directly. `name` starts at the concrete class, `Scope::name` starts at
//!    `Scope`; resolution walks up to the first level that declares `name`.
//! 4. A post-populate hook, if any, runs last.
//!
//! Capabilities and key resolutions are cached per concrete class for the
//! lifetime of the hydrator.

use crate::error::HydrateError;
use crate::syntax::SCOPE_SEPARATOR;
use rehydrate_core::{Capabilities, FieldRef, Key, Mapping, ObjectModel, ObjectRef};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

#[derive(Debug)]
struct ClassMeta {
    caps: Capabilities,
    /// Raw data key -> resolved slot
    fields: HashMap<String, FieldRef>,
}

#[derive(Debug, Default)]
pub struct Hydrator {
    classes: HashMap<String, ClassMeta>,
}

impl Hydrator {
    pub fn new() -> Self {
        Hydrator::default()
    }

    /// Create an uninitialized instance of `class`
    pub fn allocate<M: ObjectModel + ?Sized>(
        &mut self,
        model: &mut M,
        class: &str,
    ) -> Result<ObjectRef, HydrateError> {
        self.meta(&*model, class)?;
        Ok(model.allocate(class)?)
    }

    /// Populate `obj` from `data` and hand it back
    pub fn populate<M: ObjectModel + ?Sized>(
        &mut self,
        model: &mut M,
        obj: ObjectRef,
        data: Mapping,
    ) -> Result<ObjectRef, HydrateError> {
        let class = model.class_of(obj)?.to_string();
        let caps = self.meta(&*model, &class)?.caps;

        if caps.unserialize {
            model.invoke_unserialize(obj, data)?;
            return Ok(obj);
        }

        if caps.structural {
            for (key, value) in data {
                model.set_property(obj, key, value)?;
            }
        } else {
            for (key, value) in data {
                let slot = self.resolve(&*model, &class, &key)?;
                model.set_field(obj, &slot, value)?;
            }
        }

        if caps.post_populate {
            model.invoke_post_populate(obj)?;
        }
        Ok(obj)
    }

    /// Number of classes seen so far
    pub fn cached_classes(&self) -> usize {
        self.classes.len()
    }

    fn meta<M: ObjectModel + ?Sized>(
        &mut self,
        model: &M,
        class: &str,
    ) -> Result<&mut ClassMeta, HydrateError> {
        match self.classes.entry(class.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                trace!("Hydrator cache miss: class {}", class);
                let caps = model.capabilities(class)?;
                Ok(entry.insert(ClassMeta {
                    caps,
                    fields: HashMap::new(),
                }))
            }
        }
    }

    /// Map a data key of `class` to the slot it names
    fn resolve<M: ObjectModel + ?Sized>(
        &mut self,
        model: &M,
        class: &str,
        key: &Key,
    ) -> Result<FieldRef, HydrateError> {
        let raw = match key {
            Key::String(s) => s.clone(),
            Key::Int(n) => {
                return Err(HydrateError::FieldResolution {
                    class: class.to_string(),
                    field: n.to_string(),
                });
            }
        };
        if let Some(slot) = self.meta(model, class)?.fields.get(&raw) {
            return Ok(slot.clone());
        }

        trace!("Hydrator cache miss: {} on {}", raw, class);
        let unresolved = || HydrateError::FieldResolution {
            class: class.to_string(),
            field: raw.clone(),
        };
        let (start, name) = match raw.rsplit_once(SCOPE_SEPARATOR) {
            Some((scope, name)) => {
                if !model.is_same_or_ancestor(class, scope)? {
                    return Err(unresolved());
                }
                (scope, name)
            }
            None => (class, raw.as_str()),
        };
        let slot = match model.find_declaring_scope(start, name)? {
            Some(scope) => FieldRef::new(scope, name),
            None => return Err(unresolved()),
        };

        self.meta(model, class)?
            .fields
            .insert(raw.clone(), slot.clone());
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehydrate_core::{ClassDef, Heap, Value};

    fn chain() -> Heap {
        let mut heap = Heap::new();
        heap.register(
            ClassDef::new("app.Base")
                .private_field("secret")
                .field("label"),
        )
        .unwrap();
        heap.register(
            ClassDef::new("app.Leaf")
                .extends("app.Base")
                .private_field("secret"),
        )
        .unwrap();
        heap
    }

    fn data(entries: &[(&str, Value)]) -> Mapping {
        entries.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn test_unqualified_resolves_to_nearest_declaration() {
        let mut heap = chain();
        let mut hydrator = Hydrator::new();
        let obj = hydrator.allocate(&mut heap, "app.Leaf").unwrap();
        hydrator
            .populate(
                &mut heap,
                obj,
                data(&[("secret", Value::from("leaf")), ("label", Value::from("l"))]),
            )
            .unwrap();

        assert_eq!(heap.get_in(obj, "app.Leaf", "secret").unwrap(), Value::from("leaf"));
        assert_eq!(heap.get_in(obj, "app.Base", "secret").unwrap(), Value::Null);
        assert_eq!(heap.get_in(obj, "app.Base", "label").unwrap(), Value::from("l"));
    }

    #[test]
    fn test_qualified_key_starts_at_named_scope() {
        let mut heap = chain();
        let mut hydrator = Hydrator::new();
        let obj = hydrator.allocate(&mut heap, "app.Leaf").unwrap();
        hydrator
            .populate(
                &mut heap,
                obj,
                data(&[
                    ("app.Base::secret", Value::from("base")),
                    ("app.Leaf::secret", Value::from("leaf")),
                    // Inherited: resolution walks up from app.Leaf
                    ("app.Leaf::label", Value::from("l")),
                ]),
            )
            .unwrap();

        assert_eq!(heap.get_in(obj, "app.Base", "secret").unwrap(), Value::from("base"));
        assert_eq!(heap.get_in(obj, "app.Leaf", "secret").unwrap(), Value::from("leaf"));
        assert_eq!(heap.get_in(obj, "app.Base", "label").unwrap(), Value::from("l"));
    }

    #[test]
    fn test_unknown_field_is_a_resolution_failure() {
        let mut heap = chain();
        let mut hydrator = Hydrator::new();
        let obj = hydrator.allocate(&mut heap, "app.Leaf").unwrap();
        let err = hydrator
            .populate(&mut heap, obj, data(&[("missing", Value::Int(1))]))
            .unwrap_err();
        assert!(matches!(
            err,
            HydrateError::FieldResolution { ref field, .. } if field == "missing"
        ));
    }

    #[test]
    fn test_scope_outside_the_chain_is_rejected() {
        let mut heap = chain();
        heap.register(ClassDef::new("app.Other").field("label")).unwrap();
        let mut hydrator = Hydrator::new();
        let obj = hydrator.allocate(&mut heap, "app.Leaf").unwrap();
        let err = hydrator
            .populate(&mut heap, obj, data(&[("app.Other::label", Value::Int(1))]))
            .unwrap_err();
        assert!(matches!(err, HydrateError::FieldResolution { .. }));
    }

    #[test]
    fn test_structural_assigns_by_name() {
        let mut heap = Heap::new();
        heap.register(ClassDef::new("time.Zone").structural()).unwrap();
        let mut hydrator = Hydrator::new();
        let obj = hydrator.allocate(&mut heap, "time.Zone").unwrap();
        hydrator
            .populate(&mut heap, obj, data(&[("name", Value::from("UTC"))]))
            .unwrap();
        assert_eq!(heap.get(obj, "name").unwrap(), Value::from("UTC"));
    }

    #[test]
    fn test_unserialize_hook_takes_over() {
        fn restore(heap: &mut Heap, obj: ObjectRef, data: Mapping) -> Result<(), String> {
            let value = data.get_str("v").cloned().ok_or("missing 'v'")?;
            heap.set(obj, "inner", value).map_err(|e| e.to_string())
        }
        let mut heap = Heap::new();
        heap.register(ClassDef::new("app.Box").private_field("inner").on_unserialize(restore))
            .unwrap();
        let mut hydrator = Hydrator::new();
        let obj = hydrator.allocate(&mut heap, "app.Box").unwrap();

        // "v" is not a field: only the hook may interpret it
        hydrator
            .populate(&mut heap, obj, data(&[("v", Value::Int(9))]))
            .unwrap();
        assert_eq!(heap.get(obj, "inner").unwrap(), Value::Int(9));

        let err = hydrator
            .populate(&mut heap, obj, Mapping::new())
            .unwrap_err();
        assert!(err.to_string().contains("missing 'v'"));
    }

    #[test]
    fn test_post_populate_runs_after_fields() {
        fn derive(heap: &mut Heap, obj: ObjectRef) -> Result<(), String> {
            let n = match heap.get(obj, "n").map_err(|e| e.to_string())? {
                Value::Int(n) => n,
                _ => return Err("n is not set".to_string()),
            };
            heap.set(obj, "double", Value::Int(n * 2))
                .map_err(|e| e.to_string())
        }
        let mut heap = Heap::new();
        heap.register(
            ClassDef::new("app.Counter")
                .field("n")
                .field("double")
                .on_post_populate(derive),
        )
        .unwrap();
        let mut hydrator = Hydrator::new();
        let obj = hydrator.allocate(&mut heap, "app.Counter").unwrap();
        hydrator
            .populate(&mut heap, obj, data(&[("n", Value::Int(21))]))
            .unwrap();
        assert_eq!(heap.get(obj, "double").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_metadata_is_cached_per_class() {
        let mut heap = chain();
        let mut hydrator = Hydrator::new();
        for _ in 0..3 {
            let obj = hydrator.allocate(&mut heap, "app.Leaf").unwrap();
            hydrator
                .populate(&mut heap, obj, data(&[("label", Value::Int(1))]))
                .unwrap();
        }
        assert_eq!(hydrator.cached_classes(), 1);
    }
}
