use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use superquery_core::types::FieldType;

static TIMESTAMP_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("type pattern"),
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("type pattern"),
    ]
});

static DATE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("type pattern"),
        Regex::new(r"^\d{2}/\d{2}/\d{4}").expect("type pattern"),
    ]
});

/// Type tag for a single value. Strings are checked against timestamp shapes
/// before date shapes; only the prefix has to match.
pub fn infer_type(value: &Value) -> FieldType {
    match value {
        Value::Null => FieldType::Null,
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Integer,
        Value::Number(_) => FieldType::Float,
        Value::String(s) if TIMESTAMP_PATTERNS.iter().any(|re| re.is_match(s)) => FieldType::Timestamp,
        Value::String(s) if DATE_PATTERNS.iter().any(|re| re.is_match(s)) => FieldType::Date,
        Value::String(_) => FieldType::String,
        Value::Array(_) => FieldType::Array,
        Value::Object(_) => FieldType::Object,
    }
}

/// Sample text: strings verbatim, everything else as compact JSON.
pub fn sample_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
