//! superquery-compiler
//!
//! Turns business questions into SuperSQL text by matching them against a
//! fixed, prioritized table of intent templates. Compilation never fails:
//! anything unrecognized becomes a bounded `HEAD <limit>` query.

pub mod intent;
pub mod keywords;
pub mod normalize;

use chrono::{Local, NaiveDate};
use superquery_core::types::CompiledQuery;

pub use intent::{classify_normalized, Classification, Intent, IntentKind, TimeUnit};
pub use keywords::AggregateFn;
pub use normalize::normalize_field;

/// Compile `text` against `locator`, anchoring relative days to the local date.
pub fn compile(text: &str, locator: &str, limit: usize) -> CompiledQuery {
    compile_on(text, locator, limit, Local::now().date_naive())
}

/// Compile with an explicit reference date for "today"/"yesterday".
pub fn compile_on(text: &str, locator: &str, limit: usize, today: NaiveDate) -> CompiledQuery {
    match classify(text) {
        Some(intent) => intent.render(locator, limit, today),
        None => {
            tracing::warn!(query = text, "No pattern matched for query, using fallback");
            fallback_query(locator, limit)
        }
    }
}

/// Recognize the intent of `text`, or `None` when compilation would fall back.
pub fn classify(text: &str) -> Option<Intent> {
    let phrase = text.trim().to_lowercase();
    match classify_normalized(&phrase) {
        Classification::Matched(intent) => Some(intent),
        Classification::Incomplete(kind) => {
            tracing::debug!(?kind, "intent matched without enough entities");
            None
        }
        Classification::NoMatch => None,
    }
}

/// First `limit` records, unfiltered.
pub fn fallback_query(locator: &str, limit: usize) -> CompiledQuery {
    format!("FROM '{locator}' | HEAD {limit}")
}
