//! Condition-code to icon-identifier lookup
//!
//! Weather providers report a numeric condition code; the icon set on disk
//! is keyed by the legacy yahoo/wunderground icon numbers. The mapping
//! lives in a JSON file of the shape
//! `{ "<code>": { "altid": "<icon id>", "description": "..." }, ... }`,
//! is loaded once at startup, and is passed into the display driver by
//! value. A code with no mapping falls back to the "not available" icon;
//! a miss is never an error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{SketchError, SketchResult};

/// Identifier drawn when a condition code has no mapping
pub const FALLBACK_ICON: &str = "3200";

/// One icon-table entry
#[derive(Debug, Clone, Deserialize)]
pub struct IconRecord {
    /// Icon identifier selecting the bitmap file
    pub altid: String,
    /// Human-readable condition name; informational only
    #[serde(default)]
    pub description: Option<String>,
}

/// Immutable condition-code to icon-identifier table
#[derive(Debug, Clone)]
pub struct IconTable {
    records: HashMap<String, IconRecord>,
}

impl IconTable {
    /// Load the table from a JSON mapping file
    pub fn load(path: &Path) -> SketchResult<Self> {
        let contents = fs::read_to_string(path).map_err(|err| SketchError::Resource {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json(&contents).map_err(|err| SketchError::Resource {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    /// Parse the table from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: HashMap<String, IconRecord> = serde_json::from_str(json)?;
        Ok(Self { records })
    }

    /// Build a table from already constructed records
    pub fn from_records(records: HashMap<String, IconRecord>) -> Self {
        Self { records }
    }

    /// Resolve a condition code to an icon identifier. Unknown codes map
    /// to [`FALLBACK_ICON`].
    pub fn lookup(&self, code: &str) -> &str {
        self.records
            .get(code)
            .map(|record| record.altid.as_str())
            .unwrap_or(FALLBACK_ICON)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
