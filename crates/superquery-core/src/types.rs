//! Domain types shared by the compiler, engine and analyzer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One decoded output line. Field order follows the engine's output.
pub type Record = Map<String, Value>;

/// Rendered query text handed to the engine as-is.
pub type CompiledQuery = String;

/// Records produced by one engine run, capped at the configured maximum.
///
/// - `truncated`: the cap was reached while more output remained
/// - `skipped_lines`: lines dropped because they were not JSON objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub records: Vec<Record>,
    pub truncated: bool,
    #[serde(default)]
    pub skipped_lines: usize,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Primitive type tag inferred for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Timestamp,
    Date,
    Array,
    Object,
    Unknown,
}

/// Per-field schema entry. `completeness` is in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub samples: Vec<String>,
    pub completeness: f64,
}

/// Per-field quality entry as reported next to the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldQuality {
    pub completeness: f64,
    pub sample_values: Vec<String>,
}

/// One object returned by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: String,
    pub etag: String,
    pub storage_class: String,
    pub s3_url: String,
}

/// Outcome of validating a locator against the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocatorStatus {
    Object {
        bucket: String,
        key: String,
        size: u64,
        content_type: String,
    },
    Prefix {
        bucket: String,
        prefix: String,
        sample_objects: Vec<String>,
    },
    Invalid {
        error: String,
    },
}

impl LocatorStatus {
    pub fn is_valid(&self) -> bool {
        !matches!(self, LocatorStatus::Invalid { .. })
    }
}

/// Whether a caller identity could be resolved for the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
