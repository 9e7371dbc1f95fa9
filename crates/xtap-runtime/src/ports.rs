use chrono::{DateTime, Utc};
use xtap_index::{
    CallQuery, CallRecord, CookieMerge, CredentialWrite, Database, NewCall, RecordOutcome,
};
use xtap_types::{CredentialKey, EngagementSnapshot, Post};

// Store ports used by the host-facing components. The capture database
// implements all of them; tests substitute failing or recording fakes.

pub trait CredentialStore {
    fn upsert_credential(
        &self,
        key: CredentialKey,
        value: &str,
        now: DateTime<Utc>,
    ) -> xtap_index::Result<CredentialWrite>;

    fn merge_cookie(
        &self,
        name: &str,
        value: &str,
        now: DateTime<Utc>,
    ) -> xtap_index::Result<CookieMerge>;
}

pub trait EngagementStore {
    fn record(&self, post: &Post, snapshot: &EngagementSnapshot)
    -> xtap_index::Result<RecordOutcome>;
}

pub trait CallLog {
    fn append_call(&self, call: &NewCall) -> xtap_index::Result<bool>;

    fn load_calls(&self, query: &CallQuery) -> xtap_index::Result<Vec<CallRecord>>;

    /// Most recent JSON body for a URL, optionally restricted to one status
    fn latest_call_body(
        &self,
        url_contains: &str,
        status: Option<u16>,
    ) -> xtap_index::Result<Option<String>>;
}

impl CredentialStore for Database {
    fn upsert_credential(
        &self,
        key: CredentialKey,
        value: &str,
        now: DateTime<Utc>,
    ) -> xtap_index::Result<CredentialWrite> {
        Database::upsert_credential(self, key, value, now)
    }

    fn merge_cookie(
        &self,
        name: &str,
        value: &str,
        now: DateTime<Utc>,
    ) -> xtap_index::Result<CookieMerge> {
        Database::merge_cookie(self, name, value, now)
    }
}

impl EngagementStore for Database {
    fn record(
        &self,
        post: &Post,
        snapshot: &EngagementSnapshot,
    ) -> xtap_index::Result<RecordOutcome> {
        Database::record(self, post, snapshot)
    }
}

impl CallLog for Database {
    fn append_call(&self, call: &NewCall) -> xtap_index::Result<bool> {
        Database::append_call(self, call)
    }

    fn load_calls(&self, query: &CallQuery) -> xtap_index::Result<Vec<CallRecord>> {
        Database::load_calls(self, query)
    }

    fn latest_call_body(
        &self,
        url_contains: &str,
        status: Option<u16>,
    ) -> xtap_index::Result<Option<String>> {
        Database::latest_call_body(self, url_contains, status)
    }
}
