//! Fixed tokens of the emitted expression grammar
//!
//! ```text
//! expr  := literal | '[' items ']' | '$o' name ['=' expr]
//!        | hydr '.alloc(@' type ')' | hydr '.fill(' expr [',' expr] ')'
//!        | '@' type '::' case | 'new record' | 'unserialize(' bytes ')'
//! hydr  := '($h??=hydrator())' | '$h'
//! ```

/// Prefix of every placeholder binding or reference
pub const PLACEHOLDER_SIGIL: &str = "$o";

/// The expression-local hydrator after its first mention
pub const HYDRATOR_VAR: &str = "$h";

/// First mention of the hydrator: create it lazily, once per expression
pub const HYDRATOR_INIT: &str = "($h??=hydrator())";

pub const ALLOC_METHOD: &str = "alloc";

pub const FILL_METHOD: &str = "fill";

/// Bare instantiation of the anonymous record type
pub const NEW_RECORD: &str = "new record";

pub const UNSERIALIZE_CALL: &str = "unserialize";

/// Separates a declaring scope from a field name in reflective data keys,
/// and an enum type from its case
pub const SCOPE_SEPARATOR: &str = "::";
