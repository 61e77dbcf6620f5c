use actix_web::{web, HttpResponse, Responder};
use serde_json::{json, Value};

use crate::db::{EventRepo, RepoError};
use crate::params::{build_filter, build_sort, resolve_query};

/// Default page size at the listing boundary. Deliberately smaller than the
/// generic pagination fallback in `params`.
const DEFAULT_EVENTS_LIMIT: i64 = 10;

type QueryPairs = web::Query<Vec<(String, String)>>;

fn success(message: &str, data: Value) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": message, "data": data }))
}

fn failure(message: &str, err: &RepoError) -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "message": message,
        "error": err.to_string(),
    }))
}

/// GET /api/v1/events
/// page, limit, sortBy, sortOrder are control parameters; every other query
/// parameter is an equality filter on the event documents.
pub async fn get_events(repo: web::Data<EventRepo>, query: QueryPairs) -> impl Responder {
    let q = resolve_query(&query, DEFAULT_EVENTS_LIMIT);
    let filter = build_filter(&q.filters);
    let sort = build_sort(&q.sort_by, &q.sort_order);

    match repo.query_events(filter, sort, q.page, q.limit).await {
        Ok(events) => success(
            "Events retrieved successfully",
            json!({
                "page": q.page,
                "limit": q.limit,
                "events": events,
            }),
        ),
        Err(e) => {
            tracing::error!("get_events: {e}");
            failure("Failed to fetch events", &e)
        }
    }
}

/// GET /api/v1/events/stats
/// Groups by the literal value of `groupBy` and accumulates per `aggregates`
/// (count, sum, avg; unknown operators count).
pub async fn get_stats(repo: web::Data<EventRepo>, query: QueryPairs) -> impl Responder {
    let q = resolve_query(&query, DEFAULT_EVENTS_LIMIT);
    let filter = build_filter(&q.filters);

    match repo.aggregate_stats(filter, &q.group_by, &q.aggregates).await {
        Ok(stats) => success(
            "Stats retrieved successfully",
            json!({
                "groupBy": q.group_by,
                "aggregates": q.aggregates,
                "stats": stats,
            }),
        ),
        Err(e) => {
            tracing::error!("get_stats: {e}");
            failure("Failed to fetch stats", &e)
        }
    }
}

/// GET /api/v1/events/timeseries
/// Buckets by the creation timestamp truncated to `interval`
/// (hour, day, week, month; unknown intervals bucket daily).
pub async fn get_timeseries(repo: web::Data<EventRepo>, query: QueryPairs) -> impl Responder {
    let q = resolve_query(&query, DEFAULT_EVENTS_LIMIT);
    let filter = build_filter(&q.filters);

    match repo
        .aggregate_time_series(filter, &q.interval, &q.aggregates)
        .await
    {
        Ok(time_series) => success(
            "Time series retrieved successfully",
            json!({
                "interval": q.interval,
                "aggregates": q.aggregates,
                "timeSeries": time_series,
            }),
        ),
        Err(e) => {
            tracing::error!("get_timeseries: {e}");
            failure("Failed to fetch time series", &e)
        }
    }
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
