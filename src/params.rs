use std::collections::HashMap;

use mongodb::bson::{doc, Document};

/// Control parameters consumed by pagination, sorting, and aggregation.
/// Anything else in the query string becomes an equality filter.
pub const RESERVED_KEYS: [&str; 7] = [
    "page",
    "limit",
    "sortBy",
    "sortOrder",
    "groupBy",
    "aggregates",
    "interval",
];

/// Default page size for the generic pagination helper. The listing endpoint
/// applies its own default (10) before pagination ever sees the value.
const DEFAULT_PAGE_SIZE: i64 = 50;

/// Typed view of a request's query string.
///
/// Resolution never fails: malformed numbers fall back to their defaults and
/// out-of-range values are clamped. Masking caller mistakes this way is a
/// deliberate policy choice, asserted in the tests below.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub page: i64,
    pub limit: i64,
    pub sort_by: String,
    pub sort_order: String,
    pub group_by: String,
    pub aggregates: String,
    pub interval: String,
    pub filters: HashMap<String, String>,
}

/// Resolve raw query pairs into control parameters plus residual filters.
/// Repeated keys are folded in order, so the last occurrence wins.
pub fn resolve_query(pairs: &[(String, String)], default_limit: i64) -> ResolvedQuery {
    let mut raw: HashMap<&str, &str> = HashMap::new();
    for (key, value) in pairs {
        raw.insert(key, value);
    }

    let page = raw
        .get("page")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let limit = raw
        .get("limit")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|l| *l >= 1)
        .unwrap_or(default_limit);

    let get_or = |key: &str, default: &str| raw.get(key).map_or_else(|| default.into(), |v| v.to_string());

    let filters = pairs
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    ResolvedQuery {
        page,
        limit,
        sort_by: get_or("sortBy", "createdAt"),
        sort_order: get_or("sortOrder", "asc"),
        group_by: get_or("groupBy", ""),
        aggregates: get_or("aggregates", "count"),
        interval: get_or("interval", "day"),
        filters,
    }
}

/// Translate (page, limit) into (skip, per_page): `skip = (page - 1) * limit`.
/// Out-of-range inputs are clamped rather than rejected.
pub fn pagination(page: i64, limit: i64) -> (i64, i64) {
    let page = if page < 1 { 1 } else { page };
    let limit = if limit < 1 { DEFAULT_PAGE_SIZE } else { limit };

    ((page - 1) * limit, limit)
}

/// Build the sort document: only the literal "desc" sorts descending.
pub fn build_sort(sort_by: &str, sort_order: &str) -> Document {
    let direction = if sort_order == "desc" { -1 } else { 1 };

    doc! { sort_by: direction }
}

/// Build an equality-only filter from the residual parameters. Values stay
/// strings: no coercion, no range or set operators. An empty residual set
/// produces an empty document, which matches every event.
pub fn build_filter(filters: &HashMap<String, String>) -> Document {
    let mut filter = Document::new();
    for (key, value) in filters {
        filter.insert(key.clone(), value.clone());
    }
    filter
}

/// `$dateToString` format for a grouping interval. Total: unknown intervals
/// fall back to the daily format.
///
/// `%U` is Mongo's week of year: zero-padded, weeks start on Sunday, and the
/// days before the first Sunday of the year are week 00. Not ISO 8601 — the
/// labels still order chronologically because every field is fixed width.
pub fn time_format(interval: &str) -> &'static str {
    match interval {
        "hour" => "%Y-%m-%d-%H",
        "day" => "%Y-%m-%d",
        "week" => "%Y-%U",
        "month" => "%Y-%m",
        _ => "%Y-%m-%d",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_query_defaults() {
        let q = resolve_query(&[], 10);

        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert_eq!(q.sort_by, "createdAt");
        assert_eq!(q.sort_order, "asc");
        assert_eq!(q.group_by, "");
        assert_eq!(q.aggregates, "count");
        assert_eq!(q.interval, "day");
        assert!(q.filters.is_empty());
    }

    #[test]
    fn test_resolve_query_malformed_numbers_fall_back_silently() {
        let q = resolve_query(&pairs(&[("page", "abc"), ("limit", "1.5")]), 10);

        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
    }

    #[test]
    fn test_resolve_query_clamps_out_of_range_page_and_limit() {
        // page=0&limit=-5 must behave exactly like page=1&limit=<default>
        let q = resolve_query(&pairs(&[("page", "0"), ("limit", "-5")]), 10);

        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
    }

    #[test]
    fn test_resolve_query_residual_filters_exclude_reserved_keys_only() {
        let q = resolve_query(
            &pairs(&[
                ("page", "2"),
                ("limit", "25"),
                ("sortBy", "name"),
                ("sortOrder", "desc"),
                ("groupBy", "action"),
                ("aggregates", "sum"),
                ("interval", "month"),
                ("action", "signup"),
                ("country", "DE"),
            ]),
            10,
        );

        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.filters["action"], "signup");
        assert_eq!(q.filters["country"], "DE");
    }

    #[test]
    fn test_resolve_query_repeated_key_last_occurrence_wins() {
        let q = resolve_query(
            &pairs(&[("action", "signup"), ("action", "login"), ("page", "2"), ("page", "3")]),
            10,
        );

        assert_eq!(q.filters["action"], "login");
        assert_eq!(q.page, 3);
    }

    #[test]
    fn test_pagination_formula() {
        assert_eq!(pagination(1, 10), (0, 10));
        assert_eq!(pagination(3, 10), (20, 10));
        assert_eq!(pagination(2, 7), (7, 7));
    }

    #[test]
    fn test_pagination_clamps_to_generic_defaults() {
        assert_eq!(pagination(0, 10), (0, 10));
        assert_eq!(pagination(-3, 10), (0, 10));
        // the generic helper default is 50, distinct from the listing endpoint's 10
        assert_eq!(pagination(2, 0), (50, 50));
        assert_eq!(pagination(1, -1), (0, 50));
    }

    #[test]
    fn test_build_sort_directions() {
        assert_eq!(build_sort("name", "desc"), doc! { "name": -1 });
        assert_eq!(build_sort("name", "asc"), doc! { "name": 1 });
        // anything that is not the literal "desc" sorts ascending
        assert_eq!(build_sort("name", "DESC"), doc! { "name": 1 });
        assert_eq!(build_sort("createdAt", "descending"), doc! { "createdAt": 1 });
    }

    #[test]
    fn test_build_filter_equality_only() {
        let mut filters = HashMap::new();
        filters.insert("action".to_string(), "signup".to_string());
        filters.insert("count".to_string(), "42".to_string());

        let filter = build_filter(&filters);
        assert_eq!(filter.get_str("action").unwrap(), "signup");
        // numeric-looking values stay strings
        assert_eq!(filter.get_str("count").unwrap(), "42");
    }

    #[test]
    fn test_build_filter_empty_matches_everything() {
        assert!(build_filter(&HashMap::new()).is_empty());
    }

    #[test]
    fn test_time_format_is_total() {
        assert_eq!(time_format("hour"), "%Y-%m-%d-%H");
        assert_eq!(time_format("day"), "%Y-%m-%d");
        assert_eq!(time_format("week"), "%Y-%U");
        assert_eq!(time_format("month"), "%Y-%m");
        assert_eq!(time_format("year"), "%Y-%m-%d");
        assert_eq!(time_format(""), "%Y-%m-%d");
    }
}
