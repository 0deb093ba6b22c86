//! Rehydrate CLI library
//!
//! The commands behind the `rehydrate` binary, callable without a process.

pub mod config;
pub mod json;

pub use config::{CliConfig, ObjectMode};

use rehydrate::{export, replay};
use rehydrate_core::{Heap, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Read a JSON document into `heap`
pub fn load_document(path: &Path, heap: &mut Heap, mode: ObjectMode) -> Result<Value, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {}", path.display(), e))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("Error parsing {}: {}", path.display(), e))?;
    Ok(json::to_value(heap, &json, mode))
}

/// Export a JSON document
pub fn run_export(path: &Path, mode: ObjectMode) -> Result<String, String> {
    let mut heap = Heap::new();
    let value = load_document(path, &mut heap, mode)?;
    export(&heap, &value).map_err(|e| e.to_string())
}

/// Outcome of `rehydrate check`
#[derive(Debug)]
pub struct CheckReport {
    pub text: String,
    /// Objects created while replaying
    pub objects: usize,
    pub isomorphic: bool,
}

/// Export a JSON document, replay it into a fresh heap and compare
pub fn run_check(path: &Path, mode: ObjectMode) -> Result<CheckReport, String> {
    let mut heap = Heap::new();
    let value = load_document(path, &mut heap, mode)?;
    let text = export(&heap, &value).map_err(|e| e.to_string())?;

    let mut fresh = Heap::new();
    let copy = replay(&mut fresh, &text).map_err(|e| e.to_string())?;
    let isomorphic = heap.isomorphic(&value, &fresh, &copy);
    info!(
        "Checked {}: {} bytes, isomorphic={}",
        path.display(),
        text.len(),
        isomorphic
    );
    Ok(CheckReport {
        text,
        objects: fresh.len(),
        isomorphic,
    })
}
