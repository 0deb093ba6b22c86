//! Exporter
//!
//! Walks a value graph once, depth first, and records the expression that
//! rebuilds it in an [`OutputTree`]. Every object is visited through the
//! [`IdentityTable`]: the first visit emits its payload, later visits
//! (shared objects, cycles) emit a bare reference. Whether the first visit
//! keeps its binding is left to the finalizer.
//!
//! # Emitted forms per kind
//!
//! - Enum case: `@app.Suit::Hearts`
//! - Empty record: `new record`
//! - Record: `<h>.fill(new record,["a"=>1])`
//! - Custom, legacy, reflective: `<h>.fill($h.alloc(@app.Point),[...])`
//! - Opaque: `unserialize(b"...")`
//!
//! where `<h>` is `($h??=hydrator())` the first time and `$h` afterwards.
//!
//! Recursion follows the nesting depth of the input; very deep graphs are
//! bounded by the thread's stack.

use crate::config::ExportOptions;
use crate::error::ExportError;
use crate::identity::{Identity, IdentityTable, Visit};
use crate::literal::{format_bool, format_bytes, format_float, format_int, format_key, format_string};
use crate::output::{OutputTree, finalize};
use crate::syntax::{
    ALLOC_METHOD, FILL_METHOD, HYDRATOR_INIT, HYDRATOR_VAR, NEW_RECORD, SCOPE_SEPARATOR,
    UNSERIALIZE_CALL,
};
use rehydrate_core::{FieldRef, Key, Kind, Mapping, ModelError, ObjectModel, ObjectRef, Value, Visibility};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Export a value with default options
pub fn export<M: ObjectModel + ?Sized>(model: &M, value: &Value) -> Result<String, ExportError> {
    export_with(model, value, &ExportOptions::default())
}

/// Export a value with explicit options
pub fn export_with<M: ObjectModel + ?Sized>(
    model: &M,
    value: &Value,
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let mut exporter = Exporter::new(model, *options);
    exporter.value(value)?;
    Ok(exporter.finish())
}

/// How objects of one class are exported, resolved once per class
#[derive(Debug)]
struct ClassPlan {
    kind: Kind,
    structural: bool,
    /// Data key and slot of every declared field (reflective classes)
    fields: Vec<(Key, FieldRef)>,
}

/// Single-use export state. Only reachable through [`export_with`], which
/// either finishes a whole walk or discards the partial tree.
struct Exporter<'m, M: ObjectModel + ?Sized> {
    model: &'m M,
    options: ExportOptions,
    identities: IdentityTable,
    tree: OutputTree,
    hydrator_bound: bool,
    plans: HashMap<String, Rc<ClassPlan>>,
}

impl<'m, M: ObjectModel + ?Sized> Exporter<'m, M> {
    fn new(model: &'m M, options: ExportOptions) -> Self {
        debug!("Export started");
        Exporter {
            model,
            options,
            identities: IdentityTable::new(),
            tree: OutputTree::new(),
            hydrator_bound: false,
            plans: HashMap::new(),
        }
    }

    /// Resolve bindings and produce the final text
    fn finish(self) -> String {
        debug!(
            "Export finished: {} objects visited, {} bindings kept",
            self.identities.objects(),
            self.identities.bindings()
        );
        finalize(&self.tree, &self.identities)
    }

    fn value(&mut self, value: &Value) -> Result<(), ExportError> {
        let mut buf = String::new();
        match value {
            Value::Null => buf.push_str("null"),
            Value::Bool(b) => format_bool(*b, &mut buf),
            Value::Int(n) => format_int(*n, &mut buf),
            Value::Float(f) => format_float(*f, &mut buf),
            Value::String(s) => format_string(s, &mut buf),
            Value::Sequence(items) => return self.sequence(items),
            Value::Mapping(m) => return self.mapping(m),
            Value::Object(obj) => return self.object(*obj),
            Value::Closure { .. } | Value::Resource { .. } => {
                return Err(ExportError::UnsupportedValue {
                    type_name: value.type_name(),
                });
            }
        }
        self.tree.push_str(&buf);
        Ok(())
    }

    fn sequence<'v>(&mut self, items: impl IntoIterator<Item = &'v Value>) -> Result<(), ExportError> {
        self.tree.push_str("[");
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.tree.push_str(",");
            }
            self.value(item)?;
        }
        self.tree.push_str("]");
        Ok(())
    }

    fn mapping(&mut self, m: &Mapping) -> Result<(), ExportError> {
        if m.is_list() {
            return self.sequence(m.iter().map(|(_, v)| v));
        }
        self.tree.push_str("[");
        for (i, (key, value)) in m.iter().enumerate() {
            let mut buf = String::new();
            if i > 0 {
                buf.push(',');
            }
            format_key(key, &mut buf);
            buf.push_str("=>");
            self.tree.push_str(&buf);
            self.value(value)?;
        }
        self.tree.push_str("]");
        Ok(())
    }

    fn object(&mut self, obj: ObjectRef) -> Result<(), ExportError> {
        let id = match self.identities.visit(obj) {
            Visit::Again(id) => {
                self.tree.reference(id);
                return Ok(());
            }
            Visit::First(id) => id,
        };

        let class = self.model.class_of(obj)?.to_string();
        let plan = self.plan(&class)?;

        match plan.kind {
            Kind::EnumerableConstant => {
                let (enum_class, case) = self.model.enum_case(obj)?;
                self.tree.bind(id);
                self.tree
                    .push_str(&format!("@{}{}{}", enum_class, SCOPE_SEPARATOR, case));
            }
            Kind::GenericRecord => {
                let props = self.model.properties(obj)?;
                if props.is_empty() {
                    self.tree.bind(id);
                    self.tree.push_str(NEW_RECORD);
                } else {
                    self.hydrator();
                    self.tree.push_str(&format!(".{}(", FILL_METHOD));
                    self.tree.bind(id);
                    self.tree.push_str(NEW_RECORD);
                    self.tree.push_str(",");
                    self.mapping(&props)?;
                    self.tree.push_str(")");
                }
            }
            Kind::CustomSerializable => {
                let data = self.model.invoke_serialize(obj)?;
                self.populate_call(id, &class, &data)?;
            }
            Kind::OpaqueSerializable => {
                let bytes = self.model.native_serialize(obj)?;
                let mut buf = String::new();
                buf.push_str(UNSERIALIZE_CALL);
                buf.push('(');
                format_bytes(&bytes, &mut buf);
                buf.push(')');
                self.tree.bind(id);
                self.tree.push_str(&buf);
            }
            Kind::LegacyFieldList => {
                let names = self.model.invoke_legacy_fields(obj)?;
                let mut data = Mapping::new();
                for name in names {
                    let value = self.read_named(obj, &class, plan.structural, &name)?;
                    data.insert(name, value);
                }
                self.populate_call(id, &class, &data)?;
            }
            Kind::GenericByReflection => {
                let data = if plan.structural {
                    self.model.properties(obj)?
                } else {
                    let mut data = Mapping::new();
                    for (key, slot) in &plan.fields {
                        data.insert(key.clone(), self.model.get_field(obj, slot)?);
                    }
                    data
                };
                self.populate_call(id, &class, &data)?;
            }
        }
        Ok(())
    }

    /// `<h>.fill($h.alloc(@Class)[,data])`
    fn populate_call(&mut self, id: Identity, class: &str, data: &Mapping) -> Result<(), ExportError> {
        self.hydrator();
        self.tree.push_str(&format!(".{}(", FILL_METHOD));
        self.tree.bind(id);
        self.tree
            .push_str(&format!("{}.{}(@{})", HYDRATOR_VAR, ALLOC_METHOD, class));
        if !(data.is_empty() && self.options.omit_empty_data) {
            self.tree.push_str(",");
            self.mapping(data)?;
        }
        self.tree.push_str(")");
        Ok(())
    }

    /// Mention the hydrator, creating it on first use
    fn hydrator(&mut self) {
        if self.hydrator_bound {
            self.tree.push_str(HYDRATOR_VAR);
        } else {
            self.hydrator_bound = true;
            self.tree.push_str(HYDRATOR_INIT);
        }
    }

    /// Read a field the way code inside the class would name it
    fn read_named(
        &self,
        obj: ObjectRef,
        class: &str,
        structural: bool,
        name: &str,
    ) -> Result<Value, ExportError> {
        if structural {
            let props = self.model.properties(obj)?;
            return Ok(props.get_str(name).cloned().unwrap_or(Value::Null));
        }
        match self.model.find_declaring_scope(class, name)? {
            Some(scope) => Ok(self.model.get_field(obj, &FieldRef::new(scope, name))?),
            None => Err(ModelError::NoSuchField {
                class: class.to_string(),
                field: name.to_string(),
            }
            .into()),
        }
    }

    fn plan(&mut self, class: &str) -> Result<Rc<ClassPlan>, ExportError> {
        if let Some(plan) = self.plans.get(class) {
            return Ok(Rc::clone(plan));
        }

        let caps = self.model.capabilities(class)?;
        let kind = Kind::classify(&caps);
        let mut fields = Vec::new();
        if kind == Kind::GenericByReflection && !caps.structural {
            for decl in self.model.declared_fields(class)? {
                // Private fields, and fields hidden by a nearer declaration,
                // are keyed by their declaring scope
                let nearest = self.model.find_declaring_scope(class, &decl.slot.name)?;
                let qualified = decl.visibility == Visibility::Private
                    || nearest.as_deref() != Some(decl.slot.scope.as_str());
                let key = if qualified {
                    format!("{}{}{}", decl.slot.scope, SCOPE_SEPARATOR, decl.slot.name)
                } else {
                    decl.slot.name.clone()
                };
                fields.push((Key::String(key), decl.slot));
            }
        }

        let plan = Rc::new(ClassPlan {
            kind,
            structural: caps.structural,
            fields,
        });
        self.plans.insert(class.to_string(), Rc::clone(&plan));
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehydrate_core::{ClassDef, Heap};

    #[test]
    fn test_scalars() {
        let heap = Heap::new();
        assert_eq!(export(&heap, &Value::Null).unwrap(), "null");
        assert_eq!(export(&heap, &Value::Int(-4)).unwrap(), "-4");
        assert_eq!(export(&heap, &Value::Float(1.5)).unwrap(), "1.5");
        assert_eq!(export(&heap, &Value::Bool(true)).unwrap(), "true");
        assert_eq!(export(&heap, &Value::string("a\"b")).unwrap(), r#""a\"b""#);
    }

    #[test]
    fn test_collections() {
        let heap = Heap::new();
        let list = Value::Sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(export(&heap, &list).unwrap(), "[1,2,3]");

        let map: Mapping = vec![("a", Value::Int(1))].into_iter().collect();
        assert_eq!(export(&heap, &Value::Mapping(map)).unwrap(), r#"["a"=>1]"#);

        assert_eq!(export(&heap, &Value::Sequence(vec![])).unwrap(), "[]");
        assert_eq!(export(&heap, &Value::Mapping(Mapping::new())).unwrap(), "[]");
    }

    #[test]
    fn test_list_keyed_mapping_is_compact() {
        let heap = Heap::new();
        let m = Mapping::from(vec![Value::Int(7), Value::Int(8)]);
        assert_eq!(export(&heap, &Value::Mapping(m)).unwrap(), "[7,8]");
    }

    #[test]
    fn test_empty_record_has_no_binding() {
        let mut heap = Heap::new();
        let rec = heap.new_record();
        assert_eq!(export(&heap, &Value::Object(rec)).unwrap(), "new record");
    }

    #[test]
    fn test_record_with_fields() {
        let mut heap = Heap::new();
        let rec = heap.record([("a", Value::Int(1))]);
        assert_eq!(
            export(&heap, &Value::Object(rec)).unwrap(),
            r#"($h??=hydrator()).fill(new record,["a"=>1])"#
        );
    }

    #[test]
    fn test_reflective_keys_qualify_private_and_shadowed() {
        let mut heap = Heap::new();
        heap.register(
            ClassDef::new("app.Base")
                .field("name")
                .private_field("token")
                .protected_field("level"),
        )
        .unwrap();
        heap.register(ClassDef::new("app.Child").extends("app.Base").field("level"))
            .unwrap();
        let obj = heap
            .instantiate("app.Child", [("name", Value::string("n"))])
            .unwrap();

        assert_eq!(
            export(&heap, &Value::Object(obj)).unwrap(),
            concat!(
                r#"($h??=hydrator()).fill($h.alloc(@app.Child),"#,
                r#"["level"=>null,"name"=>"n","app.Base::token"=>null,"app.Base::level"=>null])"#
            )
        );
    }

    #[test]
    fn test_empty_data_argument() {
        let mut heap = Heap::new();
        heap.register(ClassDef::new("app.Marker")).unwrap();
        let obj = heap.allocate("app.Marker").unwrap();
        let value = Value::Object(obj);

        assert_eq!(
            export(&heap, &value).unwrap(),
            "($h??=hydrator()).fill($h.alloc(@app.Marker))"
        );
        let options = ExportOptions::new().with_empty_data(true);
        assert_eq!(
            export_with(&heap, &value, &options).unwrap(),
            "($h??=hydrator()).fill($h.alloc(@app.Marker),[])"
        );
    }

    #[test]
    fn test_unsupported_values() {
        let heap = Heap::new();
        let closure = Value::Closure {
            name: "f".to_string(),
        };
        let err = export(&heap, &Value::Sequence(vec![Value::Int(1), closure])).unwrap_err();
        assert_eq!(err.to_string(), "Export of closure is not supported");

        let stream = Value::Resource {
            kind: "stream".to_string(),
            id: 3,
        };
        let err = export(&heap, &stream).unwrap_err();
        assert_eq!(err.to_string(), "Export of resource (stream) is not supported");
    }

    #[test]
    fn test_each_export_is_one_complete_expression() {
        let mut heap = Heap::new();
        let shared = heap.record([("a", Value::Int(1))]);
        let value = Value::Sequence(vec![shared.into(), shared.into()]);

        let first = export(&heap, &value).unwrap();
        let second = export(&heap, &value).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, r#"[($h??=hydrator()).fill($o0=new record,["a"=>1]),$o0]"#);

        let mut fresh = Heap::new();
        let copy = crate::replay::replay(&mut fresh, &first).unwrap();
        assert!(heap.isomorphic(&value, &fresh, &copy));
    }

    #[test]
    fn test_failed_export_yields_no_text() {
        let mut heap = Heap::new();
        let rec = heap.record([("a", Value::Int(1))]);
        let closure = Value::Closure {
            name: "f".to_string(),
        };
        let value = Value::Sequence(vec![rec.into(), rec.into(), closure]);
        assert!(matches!(
            export(&heap, &value),
            Err(ExportError::UnsupportedValue { .. })
        ));
    }
}
