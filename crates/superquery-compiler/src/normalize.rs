use std::sync::LazyLock;

use regex::Regex;

static STOP_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(the|a|an|of|by|for|from|with)\b").expect("stop word regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]").expect("charset regex"));

/// Turn a free-text phrase into a field name: stop words dropped, whitespace
/// collapsed to `_`, lowercased, restricted to `[a-z0-9_]`.
///
/// Applied until stable, so normalizing a normalized name is a no-op.
pub fn normalize_field(raw: &str) -> String {
    let mut current = clean_once(raw);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let without_stop_words = STOP_WORDS.replace_all(&lowered, "");
    let joined = WHITESPACE.replace_all(without_stop_words.trim(), "_");
    DISALLOWED.replace_all(&joined, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_common_phrases() {
        assert_eq!(normalize_field("the customer name"), "customer_name");
        assert_eq!(normalize_field("response time"), "response_time");
        assert_eq!(normalize_field("API calls"), "api_calls");
        assert_eq!(normalize_field("  revenue  "), "revenue");
        assert_eq!(normalize_field("customer's region!"), "customers_region");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["the customer name", "t.he", "Orders per Day", "a", "x -- y", "Ünïcode field", ""] {
            let once = normalize_field(raw);
            assert_eq!(normalize_field(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn stop_word_only_input_is_empty() {
        assert_eq!(normalize_field("the"), "");
        assert_eq!(normalize_field("t.he"), "");
    }
}
