use crate::arena::ArenaCapacity;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the arena is pre-sized before a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CapacityHint {
    /// Estimate row counts from the input length
    #[default]
    Auto,
    /// Reserve exactly these row counts up front
    Explicit(ArenaCapacity),
}

impl CapacityHint {
    pub fn resolve(self, bytes: usize) -> ArenaCapacity {
        match self {
            CapacityHint::Auto => ArenaCapacity::estimate(bytes),
            CapacityHint::Explicit(capacity) => capacity,
        }
    }
}

/// Options that control how diff text is parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Strip git's `a/` and `b/` path prefixes (default: true)
    #[serde(default = "default_true")]
    pub strip_path_prefixes: bool,

    /// Decode C-style quoted paths (default: true)
    #[serde(default = "default_true")]
    pub unquote_paths: bool,

    /// Keep a `\r` before `\n` as part of line content (default: false)
    #[serde(default)]
    pub keep_carriage_returns: bool,

    /// Store diagnostics on the result rather than only counting them (default: true)
    #[serde(default = "default_true")]
    pub collect_diagnostics: bool,

    /// Arena pre-sizing (default: auto)
    #[serde(default)]
    pub capacity: CapacityHint,
}

fn default_true() -> bool {
    true
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strip_path_prefixes: true,
            unquote_paths: true,
            keep_carriage_returns: false,
            collect_diagnostics: true,
            capacity: CapacityHint::Auto,
        }
    }
}

impl ParseOptions {
    /// Load options from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
