//! Object model errors
//!
//! Every failure an [`ObjectModel`](crate::ObjectModel) can report. Hook
//! failures carry the hook's own message verbatim: a failing
//! custom-unserialize hook is surfaced as-is, never retried through generic
//! field population.

use crate::native::SnapshotError;
use crate::value::ObjectRef;

#[derive(Debug)]
pub enum ModelError {
    /// No class registered under this name
    UnknownClass(String),
    /// Object identity not owned by this model
    UnknownObject(ObjectRef),
    /// Enum class has no such case
    UnknownCase { class: String, case: String },
    /// Class name is not a dotted identifier path, or is reserved
    InvalidClassName(String),
    /// Field or case name is not an identifier
    InvalidMemberName { class: String, member: String },
    /// A class with this name is already registered
    DuplicateClass(String),
    /// Class cannot be allocated (enum cases are singletons)
    NotInstantiable(String),
    /// Field slot does not exist on the object's class
    NoSuchField { class: String, field: String },
    /// Operation does not apply to this object's storage kind
    WrongObjectKind {
        object: ObjectRef,
        expected: &'static str,
    },
    /// A type-declared hook reported failure
    Hook {
        class: String,
        hook: &'static str,
        message: String,
    },
    /// Native snapshot encoding/decoding failed
    Snapshot(SnapshotError),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::UnknownClass(name) => write!(f, "Unknown class '{}'", name),
            ModelError::UnknownObject(obj) => write!(f, "Unknown object {}", obj),
            ModelError::UnknownCase { class, case } => {
                write!(f, "Enum '{}' has no case '{}'", class, case)
            }
            ModelError::InvalidClassName(name) => write!(
                f,
                "Invalid class name '{}'. Class names are dotted identifiers and 'record' is reserved.",
                name
            ),
            ModelError::InvalidMemberName { class, member } => {
                write!(f, "Invalid member name '{}' on class '{}'", member, class)
            }
            ModelError::DuplicateClass(name) => {
                write!(f, "Class '{}' is already registered", name)
            }
            ModelError::NotInstantiable(name) => {
                write!(f, "Class '{}' cannot be instantiated", name)
            }
            ModelError::NoSuchField { class, field } => {
                write!(f, "Class '{}' has no field '{}'", class, field)
            }
            ModelError::WrongObjectKind { object, expected } => {
                write!(f, "Object {} is not {}", object, expected)
            }
            ModelError::Hook {
                class,
                hook,
                message,
            } => write!(f, "{} hook of '{}' failed: {}", hook, class, message),
            ModelError::Snapshot(e) => write!(f, "Native snapshot error: {}", e),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Snapshot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SnapshotError> for ModelError {
    fn from(e: SnapshotError) -> Self {
        ModelError::Snapshot(e)
    }
}
