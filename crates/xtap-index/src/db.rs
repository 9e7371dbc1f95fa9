use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use xtap_types::{
    Credential, CredentialKey, EngagementSnapshot, Post, PostWithEngagement, SnapshotPoint,
};

use crate::records::{
    AuthorSeries, CallQuery, CallRecord, CookieMerge, CredentialWrite, NewCall, RecordOutcome,
    TopPost,
};
use crate::{Error, Result, queries, schema};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the capture database.
///
/// `Send + Sync`: observations may be delivered from many threads, each
/// logical update runs in its own transaction under the connection lock.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;
        schema::init_schema(&conn)?;

        tracing::debug!(path = %db_path.display(), "opened capture database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Query("database handle poisoned by a panicked writer".to_string()))
    }

    // Credential operations
    //
    // Read-modify-write updates begin IMMEDIATE: the write lock is held from
    // the first read, and other writers wait on the busy timeout.

    pub fn upsert_credential(
        &self,
        key: CredentialKey,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<CredentialWrite> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = queries::credential::upsert(&tx, key, value, now)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Merge one cookie sub-value into the stored composite, read-modify-write
    /// in a single transaction.
    pub fn merge_cookie(&self, name: &str, value: &str, now: DateTime<Utc>) -> Result<CookieMerge> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = queries::credential::merge_cookie(&tx, name, value, now)?;
        tx.commit()?;
        Ok(outcome)
    }

    pub fn get_credential(&self, key: CredentialKey) -> Result<Option<Credential>> {
        let conn = self.lock()?;
        queries::credential::get(&conn, key)
    }

    pub fn list_credentials(&self) -> Result<Vec<Credential>> {
        let conn = self.lock()?;
        queries::credential::list(&conn)
    }

    // Post and engagement operations

    /// Insert the post identity if absent and append the snapshot, atomically.
    pub fn record(&self, post: &Post, snapshot: &EngagementSnapshot) -> Result<RecordOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let post_inserted = queries::post::insert_if_absent(&tx, post, snapshot.captured_at)?;
        let snapshot_inserted = queries::engagement::insert(&tx, snapshot)?;
        tx.commit()?;

        Ok(RecordOutcome {
            post_inserted,
            snapshot_inserted,
        })
    }

    pub fn insert_post_if_absent(&self, post: &Post, first_seen_at: DateTime<Utc>) -> Result<bool> {
        let conn = self.lock()?;
        queries::post::insert_if_absent(&conn, post, first_seen_at)
    }

    pub fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let conn = self.lock()?;
        queries::post::get(&conn, post_id)
    }

    pub fn latest_snapshot(&self, post_id: &str) -> Result<Option<EngagementSnapshot>> {
        let conn = self.lock()?;
        queries::engagement::latest(&conn, post_id)
    }

    /// Snapshot history with age and rates derived against the post's creation time
    pub fn history(&self, post_id: &str) -> Result<Vec<SnapshotPoint>> {
        let conn = self.lock()?;
        let created_at = queries::post::get(&conn, post_id)?.and_then(|p| p.created_at);
        let snapshots = queries::engagement::history(&conn, post_id)?;

        Ok(snapshots
            .iter()
            .map(|s| SnapshotPoint::derive(s, created_at.as_deref()))
            .collect())
    }

    pub fn recent_posts(&self, limit: usize) -> Result<Vec<PostWithEngagement>> {
        let conn = self.lock()?;
        queries::post::recent(&conn, limit)
    }

    pub fn posts_by_author(&self, username: &str) -> Result<Vec<PostWithEngagement>> {
        let conn = self.lock()?;
        queries::post::by_author(&conn, username)
    }

    pub fn top_by_observation_count(&self, limit: usize) -> Result<Vec<TopPost>> {
        let conn = self.lock()?;
        queries::post::top_by_observation_count(&conn, limit)
    }

    pub fn engagement_series(
        &self,
        min_observations: usize,
        max_age_hours: f64,
    ) -> Result<Vec<AuthorSeries>> {
        let conn = self.lock()?;
        queries::engagement::series(&conn, min_observations, max_age_hours)
    }

    // Raw call log

    pub fn append_call(&self, call: &NewCall) -> Result<bool> {
        let conn = self.lock()?;
        queries::call::append(&conn, call)
    }

    pub fn load_calls(&self, query: &CallQuery) -> Result<Vec<CallRecord>> {
        let conn = self.lock()?;
        queries::call::load(&conn, query)
    }

    pub fn latest_call_body(
        &self,
        url_contains: &str,
        status: Option<u16>,
    ) -> Result<Option<String>> {
        let conn = self.lock()?;
        queries::call::latest_body(&conn, url_contains, status)
    }

    pub fn count_calls(&self) -> Result<i64> {
        let conn = self.lock()?;
        queries::call::count(&conn)
    }
}
