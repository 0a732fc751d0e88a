//! Line-delimited JSON decoding with a record cap.

use serde_json::Value;

use superquery_core::types::{Record, ResultSet};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Accumulates records line by line.
///
/// Lines that are not JSON objects are logged and skipped. Once `max_records`
/// records are held, the next non-blank line marks the set truncated and asks
/// the caller to stop reading.
#[derive(Debug)]
pub struct JsonLinesCollector {
    max_records: usize,
    records: Vec<Record>,
    truncated: bool,
    skipped_lines: usize,
}

impl JsonLinesCollector {
    pub fn new(max_records: usize) -> Self {
        Self { max_records, records: Vec::new(), truncated: false, skipped_lines: 0 }
    }

    pub fn push(&mut self, line: &[u8]) -> Flow {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Flow::Continue;
        }
        if self.records.len() >= self.max_records {
            self.truncated = true;
            tracing::warn!(max_records = self.max_records, "Result set truncated");
            return Flow::Stop;
        }
        match serde_json::from_slice::<Value>(line) {
            Ok(Value::Object(record)) => self.records.push(record),
            Ok(_) => {
                self.skipped_lines += 1;
                tracing::warn!(line = %preview(line), "Skipping result line that is not a JSON object");
            }
            Err(e) => {
                self.skipped_lines += 1;
                tracing::warn!(error = %e, line = %preview(line), "Failed to parse line as JSON");
            }
        }
        Flow::Continue
    }

    pub fn finish(self) -> ResultSet {
        ResultSet { records: self.records, truncated: self.truncated, skipped_lines: self.skipped_lines }
    }
}

/// Decode a complete output buffer.
pub fn parse_output(output: &[u8], max_records: usize) -> ResultSet {
    let mut collector = JsonLinesCollector::new(max_records);
    for line in output.split(|b| *b == b'\n') {
        if collector.push(line) == Flow::Stop {
            break;
        }
    }
    collector.finish()
}

fn preview(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.into_owned()
    }
}
