pub mod credentials;
pub mod explore;
pub mod flows;
pub mod ingest;
pub mod init;
pub mod posts;
pub mod trend;
