//! CLI configuration (`rehydrate.toml`)
//!
//! ```toml
//! [json]
//! objects = "records"   # or "mappings" (default)
//!
//! [log]
//! level = "debug"       # default "info"
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "rehydrate.toml";

/// How JSON objects enter the value graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectMode {
    /// Plain keyed collections
    #[default]
    Mappings,
    /// Anonymous record objects
    Records,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JsonConfig {
    pub objects: ObjectMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level for the `rehydrate` crates; `RUST_LOG` still applies
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub json: JsonConfig,
    pub log: LogConfig,
}

impl CliConfig {
    /// Parse config from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Load from an explicit path, else from `rehydrate.toml` in `dir` if
    /// present, else defaults
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, String> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    return Ok(CliConfig::default());
                }
                candidate
            }
        };
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Error reading config {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }
}
