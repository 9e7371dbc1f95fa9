use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};

/// Outcome of a credential upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialWrite {
    /// First value stored under this key (version 1).
    Inserted,
    /// Value changed; version was incremented.
    Updated,
    /// Same value already stored; nothing written.
    Unchanged,
}

/// Outcome of merging one cookie sub-value into the stored composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieMerge {
    /// No composite cookie stored yet; store left untouched.
    NoComposite,
    Merged,
    Unchanged,
}

/// Outcome of recording one decoded post observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Identity row was created by this call (first decode of the post).
    pub post_inserted: bool,
    /// Snapshot was appended (false when (post, capture time) already existed).
    pub snapshot_inserted: bool,
}

/// Raw call to append to the request log.
#[derive(Debug, Clone)]
pub struct NewCall {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    /// Request headers as a JSON object
    pub headers: serde_json::Value,
    /// UTF-8 request body; non-UTF-8 bodies are stored as NULL
    pub request_body: Option<String>,
    /// UTF-8 response body; non-UTF-8 bodies are stored as NULL
    pub body: Option<String>,
}

/// Row of the raw call log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    /// Request headers; `Null` when the column is empty
    pub headers: serde_json::Value,
    pub request_body: Option<String>,
    pub body: Option<String>,
}

/// Filter applied when loading calls for flow analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallQuery {
    /// Case-insensitive URL substring (SQL `LIKE`)
    pub url_contains: String,
    pub status: Option<u16>,
    /// Only calls strictly after this instant
    pub since: Option<DateTime<Utc>>,
}

/// Leaderboard row: a post ranked by number of snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPost {
    pub post_id: String,
    pub username: String,
    /// Following flag at the latest capture
    pub following: bool,
    pub observation_count: i64,
    /// Likes at the latest capture
    pub likes: i64,
    pub created_at: Option<String>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub age_hours: f64,
    pub likes: i64,
}

/// Likes-versus-age points of every sufficiently observed post of one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSeries {
    pub username: String,
    pub points: Vec<SeriesPoint>,
}

pub(crate) fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    xtap_types::parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp: {}", raw).into(),
        )
    })
}

pub(crate) fn json_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(serde_json::Value::Null),
        Some(raw) => serde_json::from_str(&raw).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
        }),
    }
}

pub(crate) fn optional_timestamp_at(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(_) => timestamp_at(row, idx).map(Some),
    }
}
