//! Reference object model
//!
//! An arena of objects with integer identities and a registry of classes.
//! It implements [`ObjectModel`] and serves as the "equivalent runtime" the
//! exported text is replayed into: tests, the replay evaluator and the CLI
//! all run against it.
//!
//! # Classes
//!
//! ```rust,ignore
//! let mut heap = Heap::new();
//! heap.register(
//!     ClassDef::new("app.Base")
//!         .private_field("secret")
//!         .field("label"),
//! )?;
//! heap.register(ClassDef::new("app.Leaf").extends("app.Base").private_field("secret"))?;
//! ```
//!
//! Every declaration is its own slot: `app.Leaf` instances carry two
//! `secret` slots, one per declaring level.

use crate::error::ModelError;
use crate::native::{NativeSnapshot, SnapshotError};
use crate::object_model::{
    Capabilities, FieldDecl, FieldRef, ObjectModel, RECORD_CLASS, Visibility,
};
use crate::value::{Key, Mapping, ObjectRef, Value};
use std::collections::HashMap;

/// Custom serialize hook: returns the representation to persist
pub type SerializeHook = fn(&Heap, ObjectRef) -> Result<Mapping, String>;
/// Custom unserialize hook: rebuilds the object from that representation
pub type UnserializeHook = fn(&mut Heap, ObjectRef, Mapping) -> Result<(), String>;
/// Legacy hook: names of the fields to persist
pub type LegacyFieldsHook = fn(&Heap, ObjectRef) -> Vec<String>;
/// Runs after population
pub type PostPopulateHook = fn(&mut Heap, ObjectRef) -> Result<(), String>;

#[derive(Clone, Copy, Default)]
struct Hooks {
    serialize: Option<SerializeHook>,
    unserialize: Option<UnserializeHook>,
    legacy_fields: Option<LegacyFieldsHook>,
    post_populate: Option<PostPopulateHook>,
}

/// Class definition (builder)
#[derive(Clone)]
pub struct ClassDef {
    name: String,
    parent: Option<String>,
    fields: Vec<(String, Visibility)>,
    cases: Vec<String>,
    structural: bool,
    native: bool,
    hooks: Hooks,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDef {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            cases: Vec::new(),
            structural: false,
            native: false,
            hooks: Hooks::default(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Declare a public field
    pub fn field(self, name: impl Into<String>) -> Self {
        self.field_with(name, Visibility::Public)
    }

    pub fn protected_field(self, name: impl Into<String>) -> Self {
        self.field_with(name, Visibility::Protected)
    }

    pub fn private_field(self, name: impl Into<String>) -> Self {
        self.field_with(name, Visibility::Private)
    }

    /// Declare a field; redeclaring a name on the same level replaces it.
    pub fn field_with(mut self, name: impl Into<String>, visibility: Visibility) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = visibility,
            None => self.fields.push((name, visibility)),
        }
        self
    }

    /// Make this an enumeration with the given singleton cases
    pub fn cases<I, S>(mut self, cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cases.extend(cases.into_iter().map(Into::into));
        self
    }

    /// Instances hold plain public properties instead of declared slots
    pub fn structural(mut self) -> Self {
        self.structural = true;
        self
    }

    /// Instances round-trip through a native snapshot
    pub fn native(mut self) -> Self {
        self.native = true;
        self
    }

    pub fn on_serialize(mut self, hook: SerializeHook) -> Self {
        self.hooks.serialize = Some(hook);
        self
    }

    pub fn on_unserialize(mut self, hook: UnserializeHook) -> Self {
        self.hooks.unserialize = Some(hook);
        self
    }

    pub fn on_legacy_fields(mut self, hook: LegacyFieldsHook) -> Self {
        self.hooks.legacy_fields = Some(hook);
        self
    }

    pub fn on_post_populate(mut self, hook: PostPopulateHook) -> Self {
        self.hooks.post_populate = Some(hook);
        self
    }
}

struct Class {
    def: ClassDef,
    /// Every slot of the chain, most-derived level first
    layout: Vec<FieldDecl>,
    cases: Vec<(String, ObjectRef)>,
}

impl Class {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            enumeration: !self.def.cases.is_empty(),
            record: self.def.name == RECORD_CLASS,
            structural: self.def.structural,
            native: self.def.native,
            serialize: self.def.hooks.serialize.is_some(),
            unserialize: self.def.hooks.unserialize.is_some(),
            legacy_fields: self.def.hooks.legacy_fields.is_some(),
            post_populate: self.def.hooks.post_populate.is_some(),
        }
    }

    fn slot_index(&self, slot: &FieldRef) -> Option<usize> {
        self.layout.iter().position(|decl| decl.slot == *slot)
    }
}

#[derive(Debug, Clone)]
enum ObjectData {
    Case(String),
    Properties(Mapping),
    Slots(Vec<Value>),
}

#[derive(Debug, Clone)]
struct Object {
    class: String,
    data: ObjectData,
}

/// Arena-backed object model
pub struct Heap {
    classes: HashMap<String, Class>,
    objects: Vec<Object>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

/// Valid identifiers: ASCII letter or underscore, then alphanumerics/underscores
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Class names are dotted identifier paths. They end up verbatim in the
/// emitted text, so nothing else is accepted.
pub fn validate_class_name(name: &str) -> Result<(), ModelError> {
    if name == RECORD_CLASS || name.split('.').any(|part| !is_identifier(part)) {
        return Err(ModelError::InvalidClassName(name.to_string()));
    }
    Ok(())
}

impl Heap {
    /// Create a heap with only the built-in anonymous record class
    pub fn new() -> Self {
        let mut classes = HashMap::new();
        classes.insert(
            RECORD_CLASS.to_string(),
            Class {
                def: ClassDef::new(RECORD_CLASS).structural(),
                layout: Vec::new(),
                cases: Vec::new(),
            },
        );
        Heap {
            classes,
            objects: Vec::new(),
        }
    }

    /// Register a class. The parent must already be registered.
    pub fn register(&mut self, def: ClassDef) -> Result<(), ModelError> {
        validate_class_name(&def.name)?;
        if self.classes.contains_key(&def.name) {
            return Err(ModelError::DuplicateClass(def.name));
        }
        for member in def.fields.iter().map(|(n, _)| n).chain(def.cases.iter()) {
            if !is_identifier(member) {
                return Err(ModelError::InvalidMemberName {
                    class: def.name.clone(),
                    member: member.clone(),
                });
            }
        }

        let mut layout: Vec<FieldDecl> = if def.structural {
            Vec::new()
        } else {
            def.fields
                .iter()
                .map(|(name, visibility)| FieldDecl {
                    slot: FieldRef::new(def.name.clone(), name.clone()),
                    visibility: *visibility,
                })
                .collect()
        };
        if let Some(parent) = &def.parent {
            let parent_class = self.class(parent)?;
            if !def.structural {
                layout.extend(parent_class.layout.iter().cloned());
            }
        }

        let mut cases = Vec::with_capacity(def.cases.len());
        for case in &def.cases {
            let obj = self.push(Object {
                class: def.name.clone(),
                data: ObjectData::Case(case.clone()),
            });
            cases.push((case.clone(), obj));
        }

        self.classes
            .insert(def.name.clone(), Class { def, layout, cases });
        Ok(())
    }

    /// Number of live objects (enum cases included)
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Allocate and assign fields by unqualified name
    pub fn instantiate<'a, I>(&mut self, class: &str, fields: I) -> Result<ObjectRef, ModelError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let obj = self.allocate(class)?;
        for (name, value) in fields {
            self.set(obj, name, value)?;
        }
        Ok(obj)
    }

    /// New anonymous record with the given properties
    pub fn record<'a, I>(&mut self, props: I) -> ObjectRef
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let obj = self.new_record();
        if let Some(Object {
            data: ObjectData::Properties(m),
            ..
        }) = self.objects.get_mut(obj.index())
        {
            for (name, value) in props {
                m.insert(name, value);
            }
        }
        obj
    }

    /// Write a field by unqualified name (structural objects: a property)
    pub fn set(&mut self, obj: ObjectRef, name: &str, value: Value) -> Result<(), ModelError> {
        let structural = matches!(self.object(obj)?.data, ObjectData::Properties(_));
        if structural {
            return self.set_property(obj, Key::from(name), value);
        }
        let slot = self.resolve_unqualified(obj, name)?;
        self.set_field(obj, &slot, value)
    }

    /// Read a field by unqualified name (structural objects: a property)
    pub fn get(&self, obj: ObjectRef, name: &str) -> Result<Value, ModelError> {
        if let ObjectData::Properties(m) = &self.object(obj)?.data {
            return Ok(m.get_str(name).cloned().unwrap_or(Value::Null));
        }
        let slot = self.resolve_unqualified(obj, name)?;
        self.get_field(obj, &slot)
    }

    /// Read the slot `name` as declared on `scope`
    pub fn get_in(&self, obj: ObjectRef, scope: &str, name: &str) -> Result<Value, ModelError> {
        self.get_field(obj, &FieldRef::new(scope, name))
    }

    pub fn set_in(
        &mut self,
        obj: ObjectRef,
        scope: &str,
        name: &str,
        value: Value,
    ) -> Result<(), ModelError> {
        self.set_field(obj, &FieldRef::new(scope, name), value)
    }

    /// Deep equality across heaps that also requires identical sharing.
    ///
    /// Objects are matched up by a bijection built during the walk: an
    /// object reached twice on one side must be reached as the same object
    /// on the other side. Sequences compare equal to list-keyed mappings.
    pub fn isomorphic(&self, a: &Value, other: &Heap, b: &Value) -> bool {
        let mut iso = Isomorphism {
            left: self,
            right: other,
            forward: HashMap::new(),
            backward: HashMap::new(),
        };
        iso.values(a, b)
    }

    fn resolve_unqualified(&self, obj: ObjectRef, name: &str) -> Result<FieldRef, ModelError> {
        let class = self.class_of(obj)?;
        match self.find_declaring_scope(class, name)? {
            Some(scope) => Ok(FieldRef::new(scope, name)),
            None => Err(ModelError::NoSuchField {
                class: class.to_string(),
                field: name.to_string(),
            }),
        }
    }

    fn push(&mut self, object: Object) -> ObjectRef {
        let id = ObjectRef(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    fn class(&self, name: &str) -> Result<&Class, ModelError> {
        self.classes
            .get(name)
            .ok_or_else(|| ModelError::UnknownClass(name.to_string()))
    }

    fn object(&self, obj: ObjectRef) -> Result<&Object, ModelError> {
        self.objects
            .get(obj.index())
            .ok_or(ModelError::UnknownObject(obj))
    }

    fn object_mut(&mut self, obj: ObjectRef) -> Result<&mut Object, ModelError> {
        self.objects
            .get_mut(obj.index())
            .ok_or(ModelError::UnknownObject(obj))
    }

    fn hooks_of(&self, obj: ObjectRef) -> Result<(String, Hooks), ModelError> {
        let class = self.class_of(obj)?;
        Ok((class.to_string(), self.class(class)?.def.hooks))
    }

    fn slot_index(&self, obj: ObjectRef, slot: &FieldRef) -> Result<usize, ModelError> {
        let object = self.object(obj)?;
        self.class(&object.class)?
            .slot_index(slot)
            .ok_or_else(|| ModelError::NoSuchField {
                class: object.class.clone(),
                field: format!("{}::{}", slot.scope, slot.name),
            })
    }
}

fn missing_hook(class: String, hook: &'static str) -> ModelError {
    ModelError::Hook {
        class,
        hook,
        message: "not declared".to_string(),
    }
}

impl ObjectModel for Heap {
    fn class_of(&self, obj: ObjectRef) -> Result<&str, ModelError> {
        Ok(self.object(obj)?.class.as_str())
    }

    fn capabilities(&self, class: &str) -> Result<Capabilities, ModelError> {
        Ok(self.class(class)?.capabilities())
    }

    fn parent(&self, class: &str) -> Result<Option<&str>, ModelError> {
        Ok(self.class(class)?.def.parent.as_deref())
    }

    fn declares_field(&self, class: &str, name: &str) -> Result<bool, ModelError> {
        let class = self.class(class)?;
        Ok(!class.def.structural && class.def.fields.iter().any(|(n, _)| n == name))
    }

    fn declared_fields(&self, class: &str) -> Result<Vec<FieldDecl>, ModelError> {
        Ok(self.class(class)?.layout.clone())
    }

    fn get_field(&self, obj: ObjectRef, slot: &FieldRef) -> Result<Value, ModelError> {
        let index = self.slot_index(obj, slot)?;
        match &self.object(obj)?.data {
            ObjectData::Slots(slots) => Ok(slots[index].clone()),
            _ => Err(ModelError::WrongObjectKind {
                object: obj,
                expected: "an object with declared fields",
            }),
        }
    }

    fn set_field(
        &mut self,
        obj: ObjectRef,
        slot: &FieldRef,
        value: Value,
    ) -> Result<(), ModelError> {
        let index = self.slot_index(obj, slot)?;
        match &mut self.object_mut(obj)?.data {
            ObjectData::Slots(slots) => {
                slots[index] = value;
                Ok(())
            }
            _ => Err(ModelError::WrongObjectKind {
                object: obj,
                expected: "an object with declared fields",
            }),
        }
    }

    fn properties(&self, obj: ObjectRef) -> Result<Mapping, ModelError> {
        match &self.object(obj)?.data {
            ObjectData::Properties(m) => Ok(m.clone()),
            _ => Err(ModelError::WrongObjectKind {
                object: obj,
                expected: "a structural object",
            }),
        }
    }

    fn set_property(&mut self, obj: ObjectRef, key: Key, value: Value) -> Result<(), ModelError> {
        match &mut self.object_mut(obj)?.data {
            ObjectData::Properties(m) => {
                m.insert(key, value);
                Ok(())
            }
            _ => Err(ModelError::WrongObjectKind {
                object: obj,
                expected: "a structural object",
            }),
        }
    }

    fn enum_case(&self, obj: ObjectRef) -> Result<(String, String), ModelError> {
        let object = self.object(obj)?;
        match &object.data {
            ObjectData::Case(case) => Ok((object.class.clone(), case.clone())),
            _ => Err(ModelError::WrongObjectKind {
                object: obj,
                expected: "an enum case",
            }),
        }
    }

    fn lookup_case(&self, class: &str, case: &str) -> Result<ObjectRef, ModelError> {
        self.class(class)?
            .cases
            .iter()
            .find(|(name, _)| name == case)
            .map(|(_, obj)| *obj)
            .ok_or_else(|| ModelError::UnknownCase {
                class: class.to_string(),
                case: case.to_string(),
            })
    }

    fn allocate(&mut self, class: &str) -> Result<ObjectRef, ModelError> {
        let entry = self.class(class)?;
        if !entry.def.cases.is_empty() {
            return Err(ModelError::NotInstantiable(class.to_string()));
        }
        let data = if entry.def.structural {
            ObjectData::Properties(Mapping::new())
        } else {
            ObjectData::Slots(vec![Value::Null; entry.layout.len()])
        };
        Ok(self.push(Object {
            class: class.to_string(),
            data,
        }))
    }

    fn new_record(&mut self) -> ObjectRef {
        self.push(Object {
            class: RECORD_CLASS.to_string(),
            data: ObjectData::Properties(Mapping::new()),
        })
    }

    fn invoke_serialize(&self, obj: ObjectRef) -> Result<Mapping, ModelError> {
        let (class, hooks) = self.hooks_of(obj)?;
        let hook = hooks
            .serialize
            .ok_or_else(|| missing_hook(class.clone(), "serialize"))?;
        hook(self, obj).map_err(|message| ModelError::Hook {
            class,
            hook: "serialize",
            message,
        })
    }

    fn invoke_unserialize(&mut self, obj: ObjectRef, data: Mapping) -> Result<(), ModelError> {
        let (class, hooks) = self.hooks_of(obj)?;
        let hook = hooks
            .unserialize
            .ok_or_else(|| missing_hook(class.clone(), "unserialize"))?;
        hook(self, obj, data).map_err(|message| ModelError::Hook {
            class,
            hook: "unserialize",
            message,
        })
    }

    fn invoke_legacy_fields(&self, obj: ObjectRef) -> Result<Vec<String>, ModelError> {
        let (class, hooks) = self.hooks_of(obj)?;
        let hook = hooks
            .legacy_fields
            .ok_or_else(|| missing_hook(class, "legacy fields"))?;
        Ok(hook(self, obj))
    }

    fn invoke_post_populate(&mut self, obj: ObjectRef) -> Result<(), ModelError> {
        let (class, hooks) = self.hooks_of(obj)?;
        let hook = hooks
            .post_populate
            .ok_or_else(|| missing_hook(class.clone(), "post-populate"))?;
        hook(self, obj).map_err(|message| ModelError::Hook {
            class,
            hook: "post-populate",
            message,
        })
    }

    fn native_serialize(&self, obj: ObjectRef) -> Result<Vec<u8>, ModelError> {
        let object = self.object(obj)?;
        let snapshot = match &object.data {
            ObjectData::Slots(slots) => NativeSnapshot::from_slots(&object.class, slots)?,
            ObjectData::Properties(props) => NativeSnapshot::from_properties(&object.class, props)?,
            ObjectData::Case(_) => {
                return Err(ModelError::WrongObjectKind {
                    object: obj,
                    expected: "a native-serializable object",
                });
            }
        };
        Ok(snapshot.to_bytes()?)
    }

    fn native_unserialize(&mut self, bytes: &[u8]) -> Result<ObjectRef, ModelError> {
        let snapshot = NativeSnapshot::from_bytes(bytes)?;
        let obj = self.allocate(&snapshot.class)?;
        if let Some(props) = snapshot.properties() {
            for (key, value) in props {
                self.set_property(obj, key, value)?;
            }
            return Ok(obj);
        }

        let slots = snapshot.slots().unwrap_or_default();
        let object = self.object_mut(obj)?;
        match &mut object.data {
            ObjectData::Slots(existing) if existing.len() == slots.len() => {
                *existing = slots;
                Ok(obj)
            }
            ObjectData::Slots(existing) => Err(SnapshotError::LayoutMismatch {
                class: snapshot.class,
                expected: existing.len(),
                found: slots.len(),
            }
            .into()),
            _ => Err(ModelError::WrongObjectKind {
                object: obj,
                expected: "an object with declared fields",
            }),
        }
    }
}

struct Isomorphism<'a> {
    left: &'a Heap,
    right: &'a Heap,
    forward: HashMap<ObjectRef, ObjectRef>,
    backward: HashMap<ObjectRef, ObjectRef>,
}

impl Isomorphism<'_> {
    fn values(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Float(x), Value::Float(y)) => {
                x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
            }
            (Value::Sequence(xs), Value::Sequence(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.values(x, y))
            }
            (Value::Mapping(x), Value::Mapping(y)) => self.mappings(x, y),
            (Value::Sequence(xs), Value::Mapping(y)) => {
                self.mappings(&Mapping::from(xs.clone()), y)
            }
            (Value::Mapping(x), Value::Sequence(ys)) => {
                self.mappings(x, &Mapping::from(ys.clone()))
            }
            (Value::Object(x), Value::Object(y)) => self.objects(*x, *y),
            _ => a == b,
        }
    }

    fn mappings(&mut self, a: &Mapping, b: &Mapping) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && self.values(va, vb))
    }

    fn objects(&mut self, a: ObjectRef, b: ObjectRef) -> bool {
        match (self.forward.get(&a), self.backward.get(&b)) {
            (Some(seen_b), Some(seen_a)) => return *seen_b == b && *seen_a == a,
            (None, None) => {}
            _ => return false,
        }
        self.forward.insert(a, b);
        self.backward.insert(b, a);

        let (left_heap, right_heap) = (self.left, self.right);
        let (Some(left), Some(right)) = (
            left_heap.objects.get(a.index()),
            right_heap.objects.get(b.index()),
        ) else {
            return false;
        };
        if left.class != right.class {
            return false;
        }
        match (&left.data, &right.data) {
            (ObjectData::Case(x), ObjectData::Case(y)) => x == y,
            (ObjectData::Properties(x), ObjectData::Properties(y)) => self.mappings(x, y),
            (ObjectData::Slots(xs), ObjectData::Slots(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.values(x, y))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shadowing_heap() -> Heap {
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

    #[test]
    fn test_layout_most_derived_first() {
        let heap = shadowing_heap();
        let fields = heap.declared_fields("app.Leaf").unwrap();
        let slots: Vec<(String, String)> = fields
            .into_iter()
            .map(|d| (d.slot.scope, d.slot.name))
            .collect();
        assert_eq!(
            slots,
            vec![
                ("app.Leaf".to_string(), "secret".to_string()),
                ("app.Base".to_string(), "secret".to_string()),
                ("app.Base".to_string(), "label".to_string()),
            ]
        );
    }

    #[test]
    fn test_shadowed_slots_are_independent() {
        let mut heap = shadowing_heap();
        let obj = heap.allocate("app.Leaf").unwrap();
        heap.set(obj, "secret", Value::from("leaf")).unwrap();
        heap.set_in(obj, "app.Base", "secret", Value::from("base"))
            .unwrap();

        assert_eq!(heap.get(obj, "secret").unwrap(), Value::from("leaf"));
        assert_eq!(
            heap.get_in(obj, "app.Base", "secret").unwrap(),
            Value::from("base")
        );
    }

    #[test]
    fn test_allocate_starts_null() {
        let mut heap = shadowing_heap();
        let obj = heap.allocate("app.Leaf").unwrap();
        assert_eq!(heap.get(obj, "label").unwrap(), Value::Null);
    }

    #[test]
    fn test_find_declaring_scope() {
        let heap = shadowing_heap();
        assert_eq!(
            heap.find_declaring_scope("app.Leaf", "label").unwrap(),
            Some("app.Base".to_string())
        );
        assert_eq!(heap.find_declaring_scope("app.Leaf", "nope").unwrap(), None);
    }

    #[test]
    fn test_register_rejects_bad_names() {
        let mut heap = Heap::new();
        assert!(matches!(
            heap.register(ClassDef::new("record")),
            Err(ModelError::InvalidClassName(_))
        ));
        assert!(matches!(
            heap.register(ClassDef::new("app..X")),
            Err(ModelError::InvalidClassName(_))
        ));
        assert!(matches!(
            heap.register(ClassDef::new("app.X").field("a::b")),
            Err(ModelError::InvalidMemberName { .. })
        ));
        assert!(matches!(
            heap.register(ClassDef::new("app.X").extends("app.Missing")),
            Err(ModelError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut heap = Heap::new();
        heap.register(ClassDef::new("app.X")).unwrap();
        assert!(matches!(
            heap.register(ClassDef::new("app.X")),
            Err(ModelError::DuplicateClass(_))
        ));
    }

    #[test]
    fn test_enum_cases_are_singletons() {
        let mut heap = Heap::new();
        heap.register(ClassDef::new("app.Suit").cases(["Hearts", "Spades"]))
            .unwrap();
        let a = heap.lookup_case("app.Suit", "Hearts").unwrap();
        let b = heap.lookup_case("app.Suit", "Hearts").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            heap.enum_case(a).unwrap(),
            ("app.Suit".to_string(), "Hearts".to_string())
        );
        assert!(matches!(
            heap.allocate("app.Suit"),
            Err(ModelError::NotInstantiable(_))
        ));
        assert!(matches!(
            heap.lookup_case("app.Suit", "Clubs"),
            Err(ModelError::UnknownCase { .. })
        ));
    }

    #[test]
    fn test_native_roundtrip_into_other_heap() {
        let def = ClassDef::new("time.Period")
            .native()
            .field("start")
            .field("end");
        let mut heap = Heap::new();
        heap.register(def.clone()).unwrap();
        let obj = heap
            .instantiate(
                "time.Period",
                [("start", Value::Int(10)), ("end", Value::Int(20))],
            )
            .unwrap();
        let bytes = heap.native_serialize(obj).unwrap();

        let mut other = Heap::new();
        other.register(def).unwrap();
        let copy = other.native_unserialize(&bytes).unwrap();
        assert!(heap.isomorphic(&Value::Object(obj), &other, &Value::Object(copy)));
    }

    #[test]
    fn test_native_snapshot_rejects_object_fields() {
        let mut heap = Heap::new();
        heap.register(ClassDef::new("time.Period").native().field("next"))
            .unwrap();
        let inner = heap.new_record();
        let obj = heap
            .instantiate("time.Period", [("next", Value::Object(inner))])
            .unwrap();
        assert!(matches!(
            heap.native_serialize(obj),
            Err(ModelError::Snapshot(SnapshotError::ObjectNotSerializable))
        ));
    }

    #[test]
    fn test_isomorphic_requires_same_sharing() {
        let mut left = Heap::new();
        let shared = left.new_record();
        let a = Value::Sequence(vec![Value::Object(shared), Value::Object(shared)]);

        let mut right = Heap::new();
        let x = right.new_record();
        let y = right.new_record();
        let distinct = Value::Sequence(vec![Value::Object(x), Value::Object(y)]);
        let same = Value::Sequence(vec![Value::Object(x), Value::Object(x)]);

        assert!(!left.isomorphic(&a, &right, &distinct));
        assert!(left.isomorphic(&a, &right, &same));
    }

    #[test]
    fn test_isomorphic_handles_cycles() {
        let mut left = Heap::new();
        let a = left.new_record();
        left.set(a, "me", Value::Object(a)).unwrap();

        let mut right = Heap::new();
        let b = right.new_record();
        right.set(b, "me", Value::Object(b)).unwrap();

        assert!(left.isomorphic(&Value::Object(a), &right, &Value::Object(b)));
    }

    #[test]
    fn test_hook_failure_carries_message() {
        fn refuse(_: &mut Heap, _: ObjectRef, _: Mapping) -> Result<(), String> {
            Err("malformed payload".to_string())
        }
        let mut heap = Heap::new();
        heap.register(ClassDef::new("app.Token").on_unserialize(refuse))
            .unwrap();
        let obj = heap.allocate("app.Token").unwrap();
        let err = heap.invoke_unserialize(obj, Mapping::new()).unwrap_err();
        match err {
            ModelError::Hook { message, .. } => assert_eq!(message, "malformed payload"),
            other => panic!("Expected hook error, got {:?}", other),
        }
    }
}
