//! Intent templates and entity extraction.
//!
//! Templates are tried in [`PRIORITY`] order; within a template the first
//! matching pattern decides. Patterns use named groups so every surface form
//! of a category feeds the same extractor:
//!
//! - `n`, `dimension`, `metric` for top-N
//! - `metric` plus `unit` or `adverb` for time series
//! - `operation`, `context`, `condition` for filtering
//! - `metric`, `dimension` for aggregation
//! - `entity` for counting
//!
//! A pattern that matches but lacks a group its category needs yields no
//! intent, and the caller falls back to the bounded default query.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::keywords::{
    detect_window, filter_predicate, infer_function, parse_operation, AggregateFn, Operation,
    RelativeWindow, METRIC_FUNCTIONS, PHRASE_FUNCTIONS,
};
use crate::normalize::normalize_field;

/// Timestamp column assumed by time-bucketed and relative-day queries.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    TopN,
    TimeSeries,
    Filtering,
    Aggregation,
    Counting,
}

/// Categories in the order they are tried.
pub const PRIORITY: [IntentKind; 5] = [
    IntentKind::TopN,
    IntentKind::TimeSeries,
    IntentKind::Filtering,
    IntentKind::Aggregation,
    IntentKind::Counting,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "hour" | "hourly" => Some(TimeUnit::Hour),
            "day" | "daily" => Some(TimeUnit::Day),
            "week" | "weekly" => Some(TimeUnit::Week),
            "month" | "monthly" => Some(TimeUnit::Month),
            "year" | "yearly" => Some(TimeUnit::Year),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
            TimeUnit::Year => "year",
        }
    }
}

/// A recognized question with its extracted entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    TopN {
        n: u64,
        dimension: String,
        metric: String,
        function: AggregateFn,
    },
    TimeSeries {
        metric: String,
        unit: TimeUnit,
        timestamp_field: String,
        function: AggregateFn,
    },
    Filtering {
        operation: Operation,
        context: String,
        predicate: String,
    },
    Aggregation {
        metric: String,
        dimension: String,
        function: AggregateFn,
    },
    Counting {
        window: Option<RelativeWindow>,
        group_by: Option<String>,
    },
}

pub struct IntentTemplate {
    pub kind: IntentKind,
    pub patterns: Vec<Regex>,
    pub template: &'static str,
}

fn compile_patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|src| Regex::new(src).expect("intent pattern"))
        .collect()
}

static TEMPLATES: LazyLock<Vec<IntentTemplate>> = LazyLock::new(|| {
    PRIORITY
        .iter()
        .map(|&kind| IntentTemplate { kind, patterns: compile_patterns(kind.pattern_sources()), template: kind.template_source() })
        .collect()
});

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex"));

static TRAILING_GROUP_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bby\s+(?P<field>.+)$").expect("group-by regex"));

/// The process-wide template table, in priority order.
pub fn templates() -> &'static [IntentTemplate] {
    &TEMPLATES
}

/// Table entry for `kind`.
pub fn template_for(kind: IntentKind) -> &'static IntentTemplate {
    &templates()[kind.rank()]
}

impl IntentKind {
    /// Position in [`PRIORITY`].
    fn rank(self) -> usize {
        match self {
            IntentKind::TopN => 0,
            IntentKind::TimeSeries => 1,
            IntentKind::Filtering => 2,
            IntentKind::Aggregation => 3,
            IntentKind::Counting => 4,
        }
    }

    fn pattern_sources(self) -> &'static [&'static str] {
        match self {
            IntentKind::TopN => &[
                r"top\s+(?P<n>\d+)\s+(?P<dimension>.+?)\s+by\s+(?P<metric>.+)",
                r"(?P<n>\d+)\s+highest\s+(?P<dimension>.+?)\s+by\s+(?P<metric>.+)",
                r"best\s+(?P<n>\d+)\s+(?P<dimension>.+?)\s+by\s+(?P<metric>.+)",
            ],
            IntentKind::TimeSeries => &[
                r"(?P<metric>.+?)\s+by\s+(?P<unit>day|week|month|year|hour)s?\b",
                r"(?P<adverb>daily|weekly|monthly|yearly|hourly)\s+(?P<metric>.+)",
                r"(?P<metric>.+?)\s+over\s+time",
            ],
            IntentKind::Filtering => &[
                r"(?P<operation>.+?)\s+from\s+(?P<context>.+?)\s+where\s+(?P<condition>.+)",
                r"(?P<operation>.+?)\s+where\s+(?P<condition>.+)",
                r"(?P<operation>.+?)\s+for\s+(?P<condition>.+)",
            ],
            IntentKind::Aggregation => &[
                r"average\s+(?P<metric>.+?)\s+by\s+(?P<dimension>.+)",
                r"avg\s+(?P<metric>.+?)\s+by\s+(?P<dimension>.+)",
                r"mean\s+(?P<metric>.+?)\s+by\s+(?P<dimension>.+)",
                r"sum\s+(?P<metric>.+?)\s+by\s+(?P<dimension>.+)",
                r"total\s+(?P<metric>.+?)\s+by\s+(?P<dimension>.+)",
            ],
            IntentKind::Counting => &[
                r"how\s+many\s+(?P<entity>.+)",
                r"count\s+(?P<entity>.+)",
                r"number\s+of\s+(?P<entity>.+)",
            ],
        }
    }

    fn template_source(self) -> &'static str {
        match self {
            IntentKind::TopN => {
                "FROM '{locator}' | SUMMARIZE {function}({metric}) BY {dimension} | ORDER BY {function}({metric}) DESC | HEAD {n}"
            }
            IntentKind::TimeSeries => {
                "FROM '{locator}' | SUMMARIZE {function}({metric}) BY date_trunc('{unit}', {timestamp_field}) | ORDER BY date_trunc('{unit}', {timestamp_field})"
            }
            IntentKind::Filtering => "FROM '{locator}' | WHERE {predicate} | {operation}",
            IntentKind::Aggregation => "FROM '{locator}' | SUMMARIZE {function}({metric}) BY {dimension}",
            IntentKind::Counting => "FROM '{locator}' | {filter_clause}SUMMARIZE count(){group_by}",
        }
    }

    /// Build an intent from a match. `phrase` is the whole normalized question.
    fn extract(self, caps: &Captures<'_>, phrase: &str) -> Option<Intent> {
        let group = |name: &str| caps.name(name).map(|m| m.as_str());
        let field = |name: &str| group(name).map(normalize_field).filter(|f| !f.is_empty());

        match self {
            IntentKind::TopN => {
                let n = group("n")?.parse().ok()?;
                let dimension = field("dimension")?;
                let metric = field("metric")?;
                let function = infer_function(&metric, METRIC_FUNCTIONS);
                Some(Intent::TopN { n, dimension, metric, function })
            }
            IntentKind::TimeSeries => {
                let unit = group("unit").or_else(|| group("adverb")).and_then(TimeUnit::parse)?;
                let metric = field("metric")?;
                let function = infer_function(&metric, METRIC_FUNCTIONS);
                Some(Intent::TimeSeries {
                    metric,
                    unit,
                    timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
                    function,
                })
            }
            IntentKind::Filtering => {
                let operation = parse_operation(group("operation")?);
                let context = group("context")?.trim().to_string();
                let predicate = filter_predicate(group("condition")?);
                if predicate.is_empty() {
                    return None;
                }
                Some(Intent::Filtering { operation, context, predicate })
            }
            IntentKind::Aggregation => {
                let metric = field("metric")?;
                let dimension = field("dimension")?;
                let function = infer_function(phrase, PHRASE_FUNCTIONS);
                Some(Intent::Aggregation { metric, dimension, function })
            }
            IntentKind::Counting => {
                let entity = group("entity")?;
                let window = detect_window(entity);
                let group_by = TRAILING_GROUP_BY
                    .captures(entity)
                    .and_then(|c| c.name("field"))
                    .map(|m| normalize_field(m.as_str()))
                    .filter(|f| !f.is_empty());
                Some(Intent::Counting { window, group_by })
            }
        }
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::TopN { .. } => IntentKind::TopN,
            Intent::TimeSeries { .. } => IntentKind::TimeSeries,
            Intent::Filtering { .. } => IntentKind::Filtering,
            Intent::Aggregation { .. } => IntentKind::Aggregation,
            Intent::Counting { .. } => IntentKind::Counting,
        }
    }

    /// Render against `locator`. `limit` caps listing operations and `today`
    /// anchors relative-day filters.
    pub fn render(&self, locator: &str, limit: usize, today: NaiveDate) -> String {
        let template = template_for(self.kind()).template;
        let vars: Vec<(&str, String)> = match self {
            Intent::TopN { n, dimension, metric, function } => vec![
                ("function", function.to_string()),
                ("metric", metric.clone()),
                ("dimension", dimension.clone()),
                ("n", n.to_string()),
            ],
            Intent::TimeSeries { metric, unit, timestamp_field, function } => vec![
                ("function", function.to_string()),
                ("metric", metric.clone()),
                ("unit", unit.as_str().to_string()),
                ("timestamp_field", timestamp_field.clone()),
            ],
            Intent::Filtering { operation, predicate, .. } => vec![
                ("predicate", predicate.clone()),
                (
                    "operation",
                    match operation {
                        Operation::Count => "SUMMARIZE count()".to_string(),
                        Operation::Show => format!("HEAD {limit}"),
                    },
                ),
            ],
            Intent::Aggregation { metric, dimension, function } => vec![
                ("function", function.to_string()),
                ("metric", metric.clone()),
                ("dimension", dimension.clone()),
            ],
            Intent::Counting { window, group_by } => vec![
                ("filter_clause", window.map(|w| window_clause(w, today)).unwrap_or_default()),
                ("group_by", group_by.as_ref().map(|g| format!(" BY {g}")).unwrap_or_default()),
            ],
        };
        substitute(template, locator, &vars)
    }
}

fn window_clause(window: RelativeWindow, today: NaiveDate) -> String {
    let ts = DEFAULT_TIMESTAMP_FIELD;
    match window {
        RelativeWindow::Today => format!("WHERE date({ts}) = '{}' | ", today.format("%Y-%m-%d")),
        RelativeWindow::Yesterday => {
            let day = today.pred_opt().unwrap_or(today);
            format!("WHERE date({ts}) = '{}' | ", day.format("%Y-%m-%d"))
        }
        RelativeWindow::Last24Hours => format!("WHERE {ts} > now() - interval '24 hours' | "),
    }
}

/// Single pass over the template so substituted values are never rescanned.
fn substitute(template: &str, locator: &str, vars: &[(&str, String)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            if name == "locator" {
                return locator.to_string();
            }
            vars.iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.clone())
        })
        .into_owned()
}

/// Outcome of scanning the template table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched(Intent),
    /// A pattern of `kind` matched but its captures were insufficient.
    Incomplete(IntentKind),
    NoMatch,
}

/// Scan templates in priority order. Input is expected trimmed and lowercased.
pub fn classify_normalized(phrase: &str) -> Classification {
    for template in templates() {
        if let Some(caps) = template.patterns.iter().find_map(|p| p.captures(phrase)) {
            tracing::debug!(kind = ?template.kind, phrase, "intent pattern matched");
            return match template.kind.extract(&caps, phrase) {
                Some(intent) => Classification::Matched(intent),
                None => Classification::Incomplete(template.kind),
            };
        }
    }
    Classification::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    #[test]
    fn table_follows_priority() {
        let kinds: Vec<IntentKind> = templates().iter().map(|t| t.kind).collect();
        assert_eq!(kinds, PRIORITY);
        for kind in PRIORITY {
            assert_eq!(template_for(kind).kind, kind);
        }
        assert!(templates().iter().all(|t| !t.patterns.is_empty()));
    }

    #[test]
    fn adverb_form_maps_to_unit() {
        match classify_normalized("daily active users") {
            Classification::Matched(Intent::TimeSeries { metric, unit, .. }) => {
                assert_eq!(metric, "active_users");
                assert_eq!(unit, TimeUnit::Day);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn over_time_lacks_unit() {
        assert_eq!(classify_normalized("revenue over time"), Classification::Incomplete(IntentKind::TimeSeries));
    }

    #[test]
    fn filtering_needs_context_clause() {
        assert_eq!(classify_normalized("show logs where errors"), Classification::Incomplete(IntentKind::Filtering));
        match classify_normalized("show logs from gateway where errors") {
            Classification::Matched(Intent::Filtering { operation, context, predicate }) => {
                assert_eq!(operation, Operation::Show);
                assert_eq!(context, "gateway");
                assert_eq!(predicate, "status = 'error' OR level = 'error'");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn yesterday_uses_previous_day() {
        let Classification::Matched(intent) = classify_normalized("how many signups yesterday") else {
            panic!("counting intent expected");
        };
        let q = intent.render("s3://b/users/*", 100, day());
        assert_eq!(q, "FROM 's3://b/users/*' | WHERE date(timestamp) = '2024-02-29' | SUMMARIZE count()");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let intent = Intent::Aggregation {
            metric: "x".into(),
            dimension: "y".into(),
            function: AggregateFn::Sum,
        };
        let q = intent.render("s3://b/{metric}/*", 10, day());
        assert_eq!(q, "FROM 's3://b/{metric}/*' | SUMMARIZE sum(x) BY y");
    }
}
