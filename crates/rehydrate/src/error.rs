//! Export, hydration and replay errors

use rehydrate_core::ModelError;

/// Error while exporting a value graph
#[derive(Debug)]
pub enum ExportError {
    /// A value with no textual analog (closure, OS resource). No partial
    /// output is produced.
    UnsupportedValue { type_name: String },
    /// The object model failed while the graph was inspected
    Model(ModelError),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::UnsupportedValue { type_name } => {
                write!(f, "Export of {} is not supported", type_name)
            }
            ExportError::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for ExportError {
    fn from(e: ModelError) -> Self {
        ExportError::Model(e)
    }
}

/// Error while allocating or populating an instance
#[derive(Debug)]
pub enum HydrateError {
    /// A data key names a field that no level of the class chain declares
    FieldResolution { class: String, field: String },
    /// Allocation, assignment or a hook failed in the object model
    Model(ModelError),
}

impl std::fmt::Display for HydrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HydrateError::FieldResolution { class, field } => write!(
                f,
                "Cannot resolve field '{}' on '{}': no class in the chain declares it",
                field, class
            ),
            HydrateError::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for HydrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HydrateError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for HydrateError {
    fn from(e: ModelError) -> Self {
        HydrateError::Model(e)
    }
}

/// Error while evaluating an exported expression
#[derive(Debug)]
pub enum ReplayError {
    /// Malformed text; `offset` is a byte position in the input
    Syntax { offset: usize, message: String },
    /// `$o<name>` used before any `$o<name>=` binding
    UnboundPlaceholder(String),
    /// `$h` used before `($h??=hydrator())`
    HydratorUnbound { offset: usize },
    Hydrate(HydrateError),
    Model(ModelError),
}

impl ReplayError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        ReplayError::Syntax {
            offset,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Syntax { offset, message } => {
                write!(f, "Syntax error at byte {}: {}", offset, message)
            }
            ReplayError::UnboundPlaceholder(name) => {
                write!(f, "Placeholder '$o{}' is referenced before it is bound", name)
            }
            ReplayError::HydratorUnbound { offset } => write!(
                f,
                "Hydrator used at byte {} before it was initialized",
                offset
            ),
            ReplayError::Hydrate(e) => write!(f, "{}", e),
            ReplayError::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::Hydrate(e) => Some(e),
            ReplayError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HydrateError> for ReplayError {
    fn from(e: HydrateError) -> Self {
        ReplayError::Hydrate(e)
    }
}

impl From<ModelError> for ReplayError {
    fn from(e: ModelError) -> Self {
        ReplayError::Model(e)
    }
}
