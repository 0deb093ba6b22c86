//! Object-Model Access
//!
//! The reflection-like capabilities the exporter and the hydrator need from
//! a host runtime: classification, field enumeration with declaring scope,
//! visibility-bypassing field access, allocation without initialization and
//! hook invocation.
//!
//! Implementations own the objects. Everything is addressed by
//! [`ObjectRef`] identity and class name, so the trait works without native
//! object hashing.

use crate::error::ModelError;
use crate::value::{Key, Mapping, ObjectRef, Value};

/// Name of the built-in anonymous record type
pub const RECORD_CLASS: &str = "record";

/// Field visibility as declared on a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    /// Visible only to the declaring class. Same-named private fields on
    /// different levels of a chain are distinct slots.
    Private,
}

/// A concrete field slot: the class level that declares it plus its name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub scope: String,
    pub name: String,
}

impl FieldRef {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        FieldRef {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

/// A declared field as enumerated from a class chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub slot: FieldRef,
    pub visibility: Visibility,
}

/// Hook and storage traits of a class, detected once per class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Enum-like class whose instances are named singleton cases
    pub enumeration: bool,
    /// The anonymous record type
    pub record: bool,
    /// Fields are plain public properties assigned by name
    /// (records and date/time/interval-like value types)
    pub structural: bool,
    /// Reconstructed by a native serialize/unserialize round trip
    pub native: bool,
    /// Declares a custom serialize hook
    pub serialize: bool,
    /// Declares a custom unserialize hook
    pub unserialize: bool,
    /// Declares a legacy hook naming the fields to persist
    pub legacy_fields: bool,
    /// Declares a hook run after population
    pub post_populate: bool,
}

/// Reconstruction strategy for a complex object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    EnumerableConstant,
    GenericRecord,
    CustomSerializable,
    OpaqueSerializable,
    LegacyFieldList,
    GenericByReflection,
}

impl Kind {
    /// Layered dispatch: the first matching capability wins.
    pub fn classify(caps: &Capabilities) -> Kind {
        if caps.enumeration {
            Kind::EnumerableConstant
        } else if caps.record {
            Kind::GenericRecord
        } else if caps.serialize {
            Kind::CustomSerializable
        } else if caps.native {
            Kind::OpaqueSerializable
        } else if caps.legacy_fields {
            Kind::LegacyFieldList
        } else {
            Kind::GenericByReflection
        }
    }
}

/// Reflection-like access to a runtime's objects
pub trait ObjectModel {
    /// Concrete class of an object
    fn class_of(&self, obj: ObjectRef) -> Result<&str, ModelError>;

    fn capabilities(&self, class: &str) -> Result<Capabilities, ModelError>;

    fn parent(&self, class: &str) -> Result<Option<&str>, ModelError>;

    /// True if `class` itself declares `name` (inherited fields don't count)
    fn declares_field(&self, class: &str, name: &str) -> Result<bool, ModelError>;

    /// Every declared field of the chain, most-derived level first
    fn declared_fields(&self, class: &str) -> Result<Vec<FieldDecl>, ModelError>;

    fn get_field(&self, obj: ObjectRef, slot: &FieldRef) -> Result<Value, ModelError>;

    fn set_field(&mut self, obj: ObjectRef, slot: &FieldRef, value: Value)
    -> Result<(), ModelError>;

    /// Public properties of a structural object, in insertion order
    fn properties(&self, obj: ObjectRef) -> Result<Mapping, ModelError>;

    fn set_property(&mut self, obj: ObjectRef, key: Key, value: Value) -> Result<(), ModelError>;

    /// (class, case) of an enum singleton
    fn enum_case(&self, obj: ObjectRef) -> Result<(String, String), ModelError>;

    fn lookup_case(&self, class: &str, case: &str) -> Result<ObjectRef, ModelError>;

    /// Create an instance without running any initialization; all declared
    /// slots start as Null.
    fn allocate(&mut self, class: &str) -> Result<ObjectRef, ModelError>;

    /// Create an empty anonymous record
    fn new_record(&mut self) -> ObjectRef;

    fn invoke_serialize(&self, obj: ObjectRef) -> Result<Mapping, ModelError>;

    fn invoke_unserialize(&mut self, obj: ObjectRef, data: Mapping) -> Result<(), ModelError>;

    /// Names of the fields the legacy hook wants persisted
    fn invoke_legacy_fields(&self, obj: ObjectRef) -> Result<Vec<String>, ModelError>;

    fn invoke_post_populate(&mut self, obj: ObjectRef) -> Result<(), ModelError>;

    fn native_serialize(&self, obj: ObjectRef) -> Result<Vec<u8>, ModelError>;

    fn native_unserialize(&mut self, bytes: &[u8]) -> Result<ObjectRef, ModelError>;

    /// Walk the parent chain from `start` to the first level declaring `name`.
    fn find_declaring_scope(&self, start: &str, name: &str) -> Result<Option<String>, ModelError> {
        let mut level = Some(start.to_string());
        while let Some(class) = level {
            if self.declares_field(&class, name)? {
                return Ok(Some(class));
            }
            level = self.parent(&class)?.map(str::to_string);
        }
        Ok(None)
    }

    /// True if `ancestor` is `class` or one of its parents
    fn is_same_or_ancestor(&self, class: &str, ancestor: &str) -> Result<bool, ModelError> {
        let mut level = Some(class.to_string());
        while let Some(current) = level {
            if current == ancestor {
                return Ok(true);
            }
            level = self.parent(&current)?.map(str::to_string);
        }
        Ok(false)
    }
}
