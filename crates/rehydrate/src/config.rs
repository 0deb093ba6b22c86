//! Export configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use rehydrate::{ExportOptions, export_with};
//!
//! // Always pass the data argument, even when it is `[]`
//! let options = ExportOptions::new().with_empty_data(true);
//! let text = export_with(&heap, &value, &options)?;
//! ```

/// Options for one export call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Write `$h.fill(obj)` instead of `$h.fill(obj,[])` when an object has
    /// no data to restore
    pub omit_empty_data: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            omit_empty_data: true,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the data argument of populate calls even when it is empty
    pub fn with_empty_data(mut self, emit: bool) -> Self {
        self.omit_empty_data = !emit;
        self
    }
}
