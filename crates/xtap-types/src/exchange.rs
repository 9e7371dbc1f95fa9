use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::HeaderMap;

/// One observed request/response pair as delivered by the host runtime.
///
/// The request side is complete when `handle_request` is called; response
/// fields are filled in before `handle_response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub request_headers: HeaderMap,
    #[serde(default)]
    pub response_headers: HeaderMap,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "body")]
    pub request_body: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "body")]
    pub response_body: Option<Vec<u8>>,
}

impl Exchange {
    pub fn new(method: &str, url: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            method: method.to_string(),
            url: url.to_string(),
            status: None,
            request_headers: HeaderMap::new(),
            response_headers: HeaderMap::new(),
            request_body: None,
            response_body: None,
        }
    }

    /// Response body as text; `None` when absent or not valid UTF-8
    pub fn response_text(&self) -> Option<&str> {
        self.response_body
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Request body as text; `None` when absent or not valid UTF-8
    pub fn request_text(&self) -> Option<&str> {
        self.request_body
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn url_contains_any<S: AsRef<str>>(&self, markers: &[S]) -> bool {
        markers.iter().any(|m| self.url.contains(m.as_ref()))
    }
}

/// Bodies are written as text when they are UTF-8 and as a byte array otherwise
mod body {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(body: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match body {
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Repr::Text(text.to_string()).serialize(serializer),
                Err(_) => Repr::Bytes(bytes.clone()).serialize(serializer),
            },
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Ok(Option::<Repr>::deserialize(deserializer)?.map(|repr| match repr {
            Repr::Text(text) => text.into_bytes(),
            Repr::Bytes(bytes) => bytes,
        }))
    }
}
