//! Rehydrate Core: values and object-model access for graph export
//!
//! This crate provides the pieces shared by the exporter, the hydrator and
//! the replay evaluator:
//! - Value: what gets exported (scalars, collections, object references)
//! - ObjectModel: reflection-like capabilities of the host runtime
//! - Heap: an arena-backed ObjectModel used as the reference runtime
//!
//! # Modules
//!
//! - `value`: Value, Key, Mapping, ObjectRef
//! - `object_model`: ObjectModel trait, Kind classification, field slots
//! - `heap`: reference object model with class registry and hooks
//! - `native`: bincode snapshots for opaque-serializable objects
//! - `error`: ModelError

pub mod error;
pub mod heap;
pub mod native;
pub mod object_model;
pub mod value;

pub use error::ModelError;
pub use heap::{
    ClassDef, Heap, LegacyFieldsHook, PostPopulateHook, SerializeHook, UnserializeHook,
    validate_class_name,
};
pub use native::{NativeSnapshot, SnapshotError, TypedValue};
pub use object_model::{
    Capabilities, FieldDecl, FieldRef, Kind, ObjectModel, RECORD_CLASS, Visibility,
};
pub use value::{Key, Mapping, ObjectRef, Value};
