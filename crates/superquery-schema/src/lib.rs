//! superquery-schema
//!
//! Field-level schema and completeness from a small sample of records.
//! A field's type is taken from the first value seen for it and is not
//! reconciled against later records.

pub mod infer;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use superquery_core::types::{FieldQuality, FieldSchema, FieldType, Record};

pub use infer::{infer_type, sample_text};

/// Records inspected per analysis.
pub const SAMPLE_RECORDS: usize = 10;
/// Example values kept per field.
pub const MAX_SAMPLES: usize = 3;

pub const NO_SAMPLE_DATA: &str = "No valid sample data provided";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QualitySummary {
    Unavailable { error: String },
    Fields(BTreeMap<String, FieldQuality>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaAnalysis {
    pub schema: BTreeMap<String, FieldSchema>,
    pub quality: QualitySummary,
}

impl SchemaAnalysis {
    fn unavailable() -> Self {
        Self {
            schema: BTreeMap::new(),
            quality: QualitySummary::Unavailable { error: NO_SAMPLE_DATA.to_string() },
        }
    }
}

#[derive(Debug)]
struct FieldStats {
    field_type: FieldType,
    samples: Vec<String>,
    nulls: usize,
    total: usize,
}

impl FieldStats {
    fn new(first: &Value) -> Self {
        Self { field_type: infer_type(first), samples: Vec::new(), nulls: 0, total: 0 }
    }

    fn observe(&mut self, value: &Value) {
        self.total += 1;
        if value.is_null() {
            self.nulls += 1;
            return;
        }
        if self.samples.len() < MAX_SAMPLES {
            let text = sample_text(value);
            if !self.samples.contains(&text) {
                self.samples.push(text);
            }
        }
    }

    /// Non-null share of observations, as one division (`2.0 / 3.0`, not `1.0 - 1.0 / 3.0`).
    fn completeness(&self) -> f64 {
        (self.total - self.nulls) as f64 / self.total.max(1) as f64
    }
}

fn summarize<'a>(records: impl Iterator<Item = &'a Record>) -> SchemaAnalysis {
    let mut stats: BTreeMap<String, FieldStats> = BTreeMap::new();
    for record in records {
        for (field, value) in record {
            stats
                .entry(field.clone())
                .or_insert_with(|| FieldStats::new(value))
                .observe(value);
        }
    }

    let quality = stats
        .iter()
        .map(|(field, s)| {
            (field.clone(), FieldQuality { completeness: s.completeness(), sample_values: s.samples.clone() })
        })
        .collect();
    let schema = stats
        .into_iter()
        .map(|(field, s)| {
            let completeness = s.completeness();
            (field, FieldSchema { field_type: s.field_type, samples: s.samples, completeness })
        })
        .collect::<BTreeMap<_, _>>();
    tracing::debug!(fields = schema.len(), "sample analyzed");
    SchemaAnalysis { schema, quality: QualitySummary::Fields(quality) }
}

/// Analyze the first [`SAMPLE_RECORDS`] records.
pub fn analyze(records: &[Record]) -> SchemaAnalysis {
    if records.is_empty() {
        return SchemaAnalysis::unavailable();
    }
    summarize(records.iter().take(SAMPLE_RECORDS))
}

/// Analyze an arbitrary JSON sample. Anything but a non-empty array is
/// degenerate; array elements that are not objects are ignored.
pub fn analyze_json(sample: &Value) -> SchemaAnalysis {
    match sample {
        Value::Array(items) if !items.is_empty() => {
            summarize(items.iter().take(SAMPLE_RECORDS).filter_map(Value::as_object))
        }
        _ => {
            tracing::warn!("schema analysis skipped: sample is not a non-empty list");
            SchemaAnalysis::unavailable()
        }
    }
}
