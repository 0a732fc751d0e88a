//! Keyword tables driving the heuristic parts of the compiler.
//!
//! All matching here is plain substring containment on lowercased text, so
//! `"maximum"` hits `max` and `"admin"` hits `min`. Unmatched text falls back
//! to `sum` for aggregations and to the verbatim condition for filters.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Sum,
    Avg,
    Max,
    Min,
    Count,
}

impl AggregateFn {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Max => "max",
            AggregateFn::Min => "min",
            AggregateFn::Count => "count",
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First rule with any keyword contained in the text wins.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub function: AggregateFn,
}

/// Applied to the whole question for explicit aggregation phrasing.
pub const PHRASE_FUNCTIONS: &[KeywordRule] = &[
    KeywordRule { keywords: &["average", "avg", "mean"], function: AggregateFn::Avg },
    KeywordRule {
        keywords: &["sum", "total", "revenue", "sales", "amount"],
        function: AggregateFn::Sum,
    },
    KeywordRule { keywords: &["max", "maximum", "highest"], function: AggregateFn::Max },
    KeywordRule { keywords: &["min", "minimum", "lowest"], function: AggregateFn::Min },
    KeywordRule { keywords: &["count", "number"], function: AggregateFn::Count },
];

/// Applied to a normalized metric field name (top-N, time series).
pub const METRIC_FUNCTIONS: &[KeywordRule] = &[
    KeywordRule { keywords: &["count", "number", "total_records"], function: AggregateFn::Count },
    KeywordRule {
        keywords: &["revenue", "sales", "amount", "total", "sum"],
        function: AggregateFn::Sum,
    },
    KeywordRule { keywords: &["average", "avg", "mean"], function: AggregateFn::Avg },
    KeywordRule { keywords: &["max", "maximum", "highest"], function: AggregateFn::Max },
    KeywordRule { keywords: &["min", "minimum", "lowest"], function: AggregateFn::Min },
];

pub const DEFAULT_FUNCTION: AggregateFn = AggregateFn::Sum;

pub fn infer_function(text: &str, rules: &[KeywordRule]) -> AggregateFn {
    let text = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| text.contains(k)))
        .map_or(DEFAULT_FUNCTION, |rule| rule.function)
}

/// Maps a keyword in a filter condition to a canned predicate.
#[derive(Debug, Clone, Copy)]
pub struct FilterRule {
    pub keyword: &'static str,
    pub predicate: &'static str,
}

pub const FILTER_PREDICATES: &[FilterRule] = &[
    FilterRule { keyword: "error", predicate: "status = 'error' OR level = 'error'" },
    FilterRule { keyword: "success", predicate: "status = 'success'" },
    FilterRule { keyword: "api", predicate: "service LIKE '%api%'" },
];

/// Best-effort: unrecognized conditions are passed through lowercased and may
/// not be a valid predicate for the engine.
pub fn filter_predicate(condition: &str) -> String {
    let condition = condition.trim().to_lowercase();
    FILTER_PREDICATES
        .iter()
        .find(|rule| condition.contains(rule.keyword))
        .map_or(condition.clone(), |rule| rule.predicate.to_string())
}

/// Operation clause of a filtering question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Count,
    Show,
}

pub fn parse_operation(operation: &str) -> Operation {
    let operation = operation.to_lowercase();
    if operation.contains("count") {
        Operation::Count
    } else if operation.contains("show") || operation.contains("list") {
        Operation::Show
    } else {
        Operation::Count
    }
}

/// Relative time windows recognized in counting questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeWindow {
    Today,
    Yesterday,
    Last24Hours,
}

pub const RELATIVE_WINDOWS: &[(&str, RelativeWindow)] = &[
    ("today", RelativeWindow::Today),
    ("yesterday", RelativeWindow::Yesterday),
    ("last 24 hours", RelativeWindow::Last24Hours),
];

pub fn detect_window(text: &str) -> Option<RelativeWindow> {
    let text = text.to_lowercase();
    RELATIVE_WINDOWS
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, window)| *window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_pick_functions() {
        assert_eq!(infer_function("revenue", METRIC_FUNCTIONS), AggregateFn::Sum);
        assert_eq!(infer_function("count", METRIC_FUNCTIONS), AggregateFn::Count);
        assert_eq!(infer_function("average_time", METRIC_FUNCTIONS), AggregateFn::Avg);
        assert_eq!(infer_function("max_value", METRIC_FUNCTIONS), AggregateFn::Max);
        assert_eq!(infer_function("min_price", METRIC_FUNCTIONS), AggregateFn::Min);
        assert_eq!(infer_function("latency", METRIC_FUNCTIONS), AggregateFn::Sum);
    }

    #[test]
    fn phrase_precedence_prefers_avg_over_sum() {
        assert_eq!(infer_function("average total sales by region", PHRASE_FUNCTIONS), AggregateFn::Avg);
        assert_eq!(infer_function("total orders by region", PHRASE_FUNCTIONS), AggregateFn::Sum);
        assert_eq!(infer_function("number of users by plan", PHRASE_FUNCTIONS), AggregateFn::Count);
        assert_eq!(infer_function("latency by host", PHRASE_FUNCTIONS), AggregateFn::Sum);
    }

    #[test]
    fn filter_vocabulary_and_passthrough() {
        assert_eq!(filter_predicate("Errors only"), "status = 'error' OR level = 'error'");
        assert_eq!(filter_predicate("successful calls"), "status = 'success'");
        assert_eq!(filter_predicate("the API gateway"), "service LIKE '%api%'");
        assert_eq!(filter_predicate(" Region = 'EU' "), "region = 'eu'");
    }

    #[test]
    fn operations_default_to_count() {
        assert_eq!(parse_operation("count requests"), Operation::Count);
        assert_eq!(parse_operation("show me logs"), Operation::Show);
        assert_eq!(parse_operation("list users"), Operation::Show);
        assert_eq!(parse_operation("requests"), Operation::Count);
    }

    #[test]
    fn windows_are_detected() {
        assert_eq!(detect_window("orders today"), Some(RelativeWindow::Today));
        assert_eq!(detect_window("signups yesterday"), Some(RelativeWindow::Yesterday));
        assert_eq!(detect_window("errors in the last 24 hours"), Some(RelativeWindow::Last24Hours));
        assert_eq!(detect_window("orders"), None);
    }
}
