use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{oid::ObjectId, serde_helpers, Bson, Document};
use serde::{Deserialize, Serialize};

/// An event document: store-assigned id, open-schema property bag, timestamps.
/// Decoded straight from BSON; serializes to the API shape (hex id, RFC 3339 dates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(
        rename(deserialize = "_id"),
        serialize_with = "serde_helpers::serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,

    #[serde(default)]
    pub properties: Document,

    #[serde(deserialize_with = "chrono_datetime_as_bson_datetime::deserialize")]
    pub created_at: DateTime<Utc>,

    #[serde(deserialize_with = "chrono_datetime_as_bson_datetime::deserialize")]
    pub updated_at: DateTime<Utc>,
}

/// One row out of a `$group` stage: the bucket key under `_id` (a field value,
/// a time label, or null for an absent field) and the accumulated `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(rename = "_id")]
    pub key: Bson,
    pub value: Bson,
}
