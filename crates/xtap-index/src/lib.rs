// SQLite capture store
// Credentials, post identities, engagement snapshots and the raw call log

mod db;
mod error;
mod queries;
mod records;
mod schema;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use queries::call::fingerprint;
pub use records::{
    AuthorSeries, CallQuery, CallRecord, CookieMerge, CredentialWrite, NewCall, RecordOutcome,
    SeriesPoint, TopPost,
};
pub use schema::SCHEMA_VERSION;
