use std::fmt;

/// Result type for xtap-decode operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the decode layer.
///
/// Only raised when a body is not a JSON document at all; shape mismatches
/// inside a document are skipped, not reported.
#[derive(Debug)]
pub enum Error {
    /// Body is not valid JSON
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
