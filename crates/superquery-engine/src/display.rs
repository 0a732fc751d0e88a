//! Human-readable rendering of result sets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use superquery_core::types::ResultSet;

const COLUMN_WIDTH: usize = 15;
const CLIPPED_WIDTH: usize = 12;
const MAX_DISPLAY_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStatistics {
    pub total_records: usize,
    pub truncated: bool,
    pub fields: Vec<String>,
    pub field_count: usize,
}

/// Record count and the field set of the first record.
pub fn statistics(result: &ResultSet) -> QueryStatistics {
    let fields: Vec<String> = result
        .records
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();
    QueryStatistics {
        total_records: result.len(),
        truncated: result.truncated,
        field_count: fields.len(),
        fields,
    }
}

/// Fixed-width table of the first 20 records. Columns come from the first
/// record in encounter order; values missing from later records render blank.
pub fn format_table(result: &ResultSet) -> String {
    let Some(first) = result.records.first() else {
        return "No results found.".to_string();
    };
    let headers: Vec<&String> = first.keys().collect();

    let header_row = headers.iter().map(|h| pad(h)).collect::<Vec<_>>().join(" | ");
    let separator = "-".repeat(header_row.chars().count());
    let mut lines = vec![header_row, separator];

    for record in result.records.iter().take(MAX_DISPLAY_ROWS) {
        let row = headers
            .iter()
            .map(|h| pad(&clip(record.get(h.as_str()).map(cell).unwrap_or_default())))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(row);
    }
    if result.len() > MAX_DISPLAY_ROWS {
        lines.push(format!("... and {} more rows", result.len() - MAX_DISPLAY_ROWS));
    }
    lines.join("\n")
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn clip(value: String) -> String {
    if value.chars().count() > COLUMN_WIDTH {
        let head: String = value.chars().take(CLIPPED_WIDTH).collect();
        format!("{head}...")
    } else {
        value
    }
}

fn pad(value: &str) -> String {
    format!("{value:<width$}", width = COLUMN_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use superquery_core::types::Record;

    fn record(v: Value) -> Record {
        match v {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    fn result(records: Vec<Record>) -> ResultSet {
        ResultSet { records, truncated: false, skipped_lines: 0 }
    }

    #[test]
    fn empty_result_message() {
        assert_eq!(format_table(&result(vec![])), "No results found.");
    }

    #[test]
    fn header_follows_first_record_order() {
        let rs = result(vec![record(json!({"zeta": 1, "alpha": "x"}))]);
        let table = format_table(&rs);
        let mut lines = table.lines();
        assert_eq!(lines.next(), Some("zeta            | alpha          "));
        assert_eq!(lines.next().map(|l| l.chars().all(|c| c == '-')), Some(true));
        assert_eq!(lines.next(), Some("1               | x              "));
    }

    #[test]
    fn long_values_are_clipped() {
        let rs = result(vec![record(json!({"name": "abcdefghijklmnopqrstuvwxyz"}))]);
        assert!(format_table(&rs).contains("abcdefghijkl..."));
    }

    #[test]
    fn overflow_rows_are_counted() {
        let records = (0..25).map(|i| record(json!({"n": i}))).collect();
        let table = format_table(&result(records));
        assert_eq!(table.lines().count(), 2 + 20 + 1);
        assert!(table.ends_with("... and 5 more rows"));
    }

    #[test]
    fn statistics_report_fields() {
        let mut rs = result(vec![record(json!({"a": 1, "b": null}))]);
        rs.truncated = true;
        let stats = statistics(&rs);
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.fields, vec!["a", "b"]);
        assert_eq!(stats.field_count, 2);
        assert!(stats.truncated);
        assert_eq!(statistics(&result(vec![])).field_count, 0);
    }
}
