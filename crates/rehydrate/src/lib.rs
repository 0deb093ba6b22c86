//! Rehydrate: export value graphs as replayable expressions
//!
//! [`export`] turns a value (scalars, collections, and objects that may be
//! shared or cyclic) into a single expression. Evaluating that expression
//! with a [`Hydrator`] in an equivalent runtime rebuilds a deeply equal
//! value with the same identity sharing.
//!
//! ```
//! use rehydrate::{export, replay};
//! use rehydrate_core::{Heap, ObjectModel, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut heap = Heap::new();
//! let shared = heap.new_record();
//! let value = Value::Sequence(vec![shared.into(), shared.into()]);
//!
//! let text = export(&heap, &value)?;
//! assert_eq!(text, "[$o0=new record,$o0]");
//!
//! let mut fresh = Heap::new();
//! let copy = replay(&mut fresh, &text)?;
//! assert!(heap.isomorphic(&value, &fresh, &copy));
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - `exporter`: graph walk and per-kind emission
//! - `identity` / `naming` / `output`: sharing detection, placeholder names,
//!   and the finalizer that keeps only needed bindings
//! - `hydrator`: allocation and field population
//! - `replay`: reference evaluator for the emitted grammar

pub mod config;
pub mod error;
pub mod exporter;
pub mod hydrator;
pub mod identity;
pub mod literal;
pub mod naming;
pub mod output;
pub mod replay;
pub mod syntax;

pub use config::ExportOptions;
pub use error::{ExportError, HydrateError, ReplayError};
pub use exporter::{export, export_with};
pub use hydrator::Hydrator;
pub use replay::replay;
