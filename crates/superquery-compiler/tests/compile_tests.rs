use chrono::NaiveDate;

use superquery_compiler::{classify, compile, compile_on, normalize_field, AggregateFn, Intent, IntentKind};

const SALES: &str = "s3://b/sales/*";

fn fixed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
}

#[test]
fn top_n_customers_by_revenue() {
    let q = compile("top 5 customers by revenue", SALES, 100);
    assert_eq!(
        q,
        "FROM 's3://b/sales/*' | SUMMARIZE sum(revenue) BY customers | ORDER BY sum(revenue) DESC | HEAD 5"
    );
}

#[test]
fn alternate_top_n_surface_forms() {
    assert!(compile("10 highest stores by sales", SALES, 100).ends_with("DESC | HEAD 10"));
    assert!(compile("best 3 products by units sold", SALES, 100).contains("BY products"));
}

#[test]
fn top_n_wins_over_aggregation() {
    let text = "top 5 average order value by region";
    assert_eq!(classify(text).map(|i| i.kind()), Some(IntentKind::TopN));
    let q = compile(text, SALES, 100);
    assert!(q.contains("HEAD 5"), "row-count clause expected: {q}");
    assert!(q.contains("DESC"));
}

#[test]
fn revenue_by_month_is_time_series() {
    let q = compile("revenue by month", SALES, 100);
    assert_eq!(
        q,
        "FROM 's3://b/sales/*' | SUMMARIZE sum(revenue) BY date_trunc('month', timestamp) | ORDER BY date_trunc('month', timestamp)"
    );
}

#[test]
fn plural_time_units_resolve_to_singular() {
    let q = compile("revenue by months", SALES, 100);
    assert_eq!(
        q,
        "FROM 's3://b/sales/*' | SUMMARIZE sum(revenue) BY date_trunc('month', timestamp) | ORDER BY date_trunc('month', timestamp)"
    );
    assert!(compile("revenue by days", SALES, 100).contains("date_trunc('day', timestamp)"));
    assert!(compile("orders by weeks", SALES, 100).contains("date_trunc('week', timestamp)"));
    assert_eq!(compile("revenue by daytime", SALES, 100), "FROM 's3://b/sales/*' | HEAD 100");
}

#[test]
fn orders_today_is_counted_for_the_day() {
    let q = compile_on("how many orders today", "s3://b/orders/*", 100, fixed_day());
    assert_eq!(q, "FROM 's3://b/orders/*' | WHERE date(timestamp) = '2024-06-15' | SUMMARIZE count()");
}

#[test]
fn counting_with_trailing_group_by() {
    let q = compile_on("number of errors in the last 24 hours by service", "s3://b/logs/*", 100, fixed_day());
    assert_eq!(
        q,
        "FROM 's3://b/logs/*' | WHERE timestamp > now() - interval '24 hours' | SUMMARIZE count() BY service"
    );
}

#[test]
fn plain_count_has_no_filter() {
    let q = compile("count users", "s3://b/users/*", 100);
    assert_eq!(q, "FROM 's3://b/users/*' | SUMMARIZE count()");
}

#[test]
fn aggregation_infers_function_from_phrase() {
    let q = compile("Average response time by endpoint", "s3://b/logs/*", 100);
    assert_eq!(q, "FROM 's3://b/logs/*' | SUMMARIZE avg(response_time) BY endpoint");
    match classify("total sales by region") {
        Some(Intent::Aggregation { function, metric, dimension }) => {
            assert_eq!(function, AggregateFn::Sum);
            assert_eq!(metric, "sales");
            assert_eq!(dimension, "region");
        }
        other => panic!("expected aggregation, got {other:?}"),
    }
}

#[test]
fn filtering_with_known_and_unknown_conditions() {
    let q = compile("count requests from gateway where api", "s3://b/logs/*", 50);
    assert_eq!(q, "FROM 's3://b/logs/*' | WHERE service LIKE '%api%' | SUMMARIZE count()");

    let q = compile("list events from audit where Region = 'EU'", "s3://b/logs/*", 50);
    assert_eq!(q, "FROM 's3://b/logs/*' | WHERE region = 'eu' | HEAD 50");
}

#[test]
fn unmatched_and_incomplete_phrases_fall_back() {
    assert_eq!(compile("errors from API service", "s3://b/logs/*", 100), "FROM 's3://b/logs/*' | HEAD 100");
    assert_eq!(compile("revenue over time", SALES, 25), "FROM 's3://b/sales/*' | HEAD 25");
    assert_eq!(compile("revenue for acme", SALES, 7), "FROM 's3://b/sales/*' | HEAD 7");
    assert_eq!(compile("top 5 the by revenue", SALES, 9), "FROM 's3://b/sales/*' | HEAD 9");
    assert_eq!(compile("", SALES, 1), "FROM 's3://b/sales/*' | HEAD 1");
}

#[test]
fn output_is_non_empty_and_contains_locator() {
    let locators = ["s3://b/sales/*", "s3://weird bucket/it's/here.json", "s3://x/{n}"];
    let questions = [
        "top 5 customers by revenue",
        "revenue by month",
        "how many orders today",
        "show logs from app where error",
        "sum amount by account",
        "what is the meaning of life",
        "   ",
    ];
    for locator in locators {
        for question in questions {
            let q = compile(question, locator, 100);
            assert!(!q.is_empty());
            assert!(q.contains(locator), "{q} should contain {locator}");
        }
    }
}

#[test]
fn normalization_is_idempotent_on_extracted_fields() {
    for phrase in ["top 3 The Best Customers by Net Revenue ($)", "daily active users", "sum gross amount by sales rep"] {
        if let Some(Intent::TopN { dimension, metric, .. }) = classify(phrase) {
            assert_eq!(normalize_field(&dimension), dimension);
            assert_eq!(normalize_field(&metric), metric);
        }
    }
    assert_eq!(normalize_field("net_revenue"), "net_revenue");
}

#[test]
fn intent_serializes_with_tag() {
    let intent = classify("top 5 customers by revenue").expect("intent");
    let v = serde_json::to_value(&intent).expect("serialize");
    assert_eq!(v["intent"], "top_n");
    assert_eq!(v["n"], 5);
    assert_eq!(v["function"], "sum");
}
