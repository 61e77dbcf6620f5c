use std::future::Future;
use std::time::Duration;

use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::FindOptions;
use mongodb::{Client, Collection};
use thiserror::Error;
use tokio::time::timeout;

use crate::config::Config;
use crate::models::{AggregateRow, Event};
use crate::params::{pagination, time_format};

/// Ceiling for a single store call. Listing and both aggregation paths share
/// the same bound; a request that cannot finish inside it fails terminally.
pub const STORE_CALL_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("failed to {op}: {source}")]
    Database {
        op: &'static str,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("{op} timed out after {}s", STORE_CALL_TIMEOUT.as_secs())]
    Timeout { op: &'static str },
}

/// Connect to MongoDB and verify the deployment answers a ping.
pub async fn connect(cfg: &Config) -> Result<Client, RepoError> {
    let client = Client::with_uri_str(&cfg.db_uri)
        .await
        .map_err(|source| RepoError::Database {
            op: "connect to MongoDB",
            source,
        })?;

    let db = client.database(&cfg.db_name);
    let ping = db.run_command(doc! { "ping": 1 }, None);
    match timeout(CONNECT_TIMEOUT, ping).await {
        Ok(Ok(_)) => Ok(client),
        Ok(Err(source)) => Err(RepoError::Database {
            op: "ping MongoDB",
            source,
        }),
        Err(_) => Err(RepoError::Timeout {
            op: "ping MongoDB",
        }),
    }
}

/// Read-only access to the events collection. Cheap to clone; the driver
/// pools connections internally, so one repo is shared across all workers.
#[derive(Clone)]
pub struct EventRepo {
    events: Collection<Event>,
}

impl EventRepo {
    pub fn new(events: Collection<Event>) -> Self {
        Self { events }
    }

    /// Paginated, sorted, filtered listing. One find call, no total count.
    pub async fn query_events(
        &self,
        filter: Document,
        sort: Document,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Event>, RepoError> {
        let (skip, per_page) = pagination(page, limit);
        let opts = FindOptions::builder()
            .sort(sort)
            .skip(skip as u64)
            .limit(per_page)
            .build();

        bounded("fetch events", async {
            let cursor = self.events.find(filter, opts).await?;
            cursor.try_collect().await
        })
        .await
    }

    /// Group events by the literal value of `group_by` and accumulate per the
    /// requested operator. Missing fields group under the null key.
    pub async fn aggregate_stats(
        &self,
        filter: Document,
        group_by: &str,
        aggregates: &str,
    ) -> Result<Vec<AggregateRow>, RepoError> {
        self.run_pipeline("fetch stats", stats_pipeline(&filter, group_by, aggregates))
            .await
    }

    /// Group events by their creation timestamp truncated to `interval` and
    /// accumulate per the requested operator.
    pub async fn aggregate_time_series(
        &self,
        filter: Document,
        interval: &str,
        aggregates: &str,
    ) -> Result<Vec<AggregateRow>, RepoError> {
        self.run_pipeline(
            "fetch time series",
            time_series_pipeline(&filter, interval, aggregates),
        )
        .await
    }

    async fn run_pipeline(
        &self,
        op: &'static str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<AggregateRow>, RepoError> {
        bounded(op, async {
            let cursor = self.events.aggregate(pipeline, None).await?;
            let docs: Vec<Document> = cursor.try_collect().await?;
            docs.into_iter()
                .map(|d| bson::from_document(d).map_err(mongodb::error::Error::from))
                .collect()
        })
        .await
    }
}

/// Run one store call under the shared timeout. No retries: whatever comes
/// back, success or failure, is the final outcome for this request.
async fn bounded<T, F>(op: &'static str, fut: F) -> Result<T, RepoError>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    match timeout(STORE_CALL_TIMEOUT, fut).await {
        Ok(result) => result.map_err(|source| RepoError::Database { op, source }),
        Err(_) => Err(RepoError::Timeout { op }),
    }
}

/// The accumulator document for a `$group` stage. Unknown operators fall back
/// to counting, the same as an explicit "count".
fn accumulator(aggregates: &str) -> Document {
    match aggregates {
        "sum" => doc! { "$sum": "$value" },
        "avg" => doc! { "$avg": "$value" },
        // "count" and anything unrecognized
        _ => doc! { "$sum": 1 },
    }
}

/// match (only when the filter is non-empty) -> group by field -> sort by key.
pub fn stats_pipeline(filter: &Document, group_by: &str, aggregates: &str) -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(3);
    if !filter.is_empty() {
        pipeline.push(doc! { "$match": filter.clone() });
    }
    pipeline.push(doc! {
        "$group": {
            "_id": format!("${group_by}"),
            "value": accumulator(aggregates),
        }
    });
    pipeline.push(doc! { "$sort": { "_id": 1 } });
    pipeline
}

/// Same shape as [`stats_pipeline`], but the group key is the creation
/// timestamp rendered through `$dateToString` at the interval's granularity.
/// Labels are fixed width, so the ascending sort is chronological.
pub fn time_series_pipeline(filter: &Document, interval: &str, aggregates: &str) -> Vec<Document> {
    let mut pipeline = Vec::with_capacity(3);
    if !filter.is_empty() {
        pipeline.push(doc! { "$match": filter.clone() });
    }
    pipeline.push(doc! {
        "$group": {
            "_id": {
                "$dateToString": {
                    "format": time_format(interval),
                    "date": "$created_at",
                }
            },
            "value": accumulator(aggregates),
        }
    });
    pipeline.push(doc! { "$sort": { "_id": 1 } });
    pipeline
}
