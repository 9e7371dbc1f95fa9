use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Names under which harvested authentication material is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKey {
    /// Bearer `authorization` request header
    Authorization,
    /// `x-csrf-token` request header
    CsrfToken,
    /// `x-client-uuid` request header
    ClientUuid,
    /// Composite `cookie` header (see `CookieMap`)
    Cookie,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 4] = [
        CredentialKey::Authorization,
        CredentialKey::CsrfToken,
        CredentialKey::ClientUuid,
        CredentialKey::Cookie,
    ];

    /// Storage key, identical to the request header name it is read from
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::Authorization => "authorization",
            CredentialKey::CsrfToken => "x-csrf-token",
            CredentialKey::ClientUuid => "x-client-uuid",
            CredentialKey::Cookie => "cookie",
        }
    }

    /// Header credentials that are copied verbatim from a request
    pub fn header_keys() -> [CredentialKey; 3] {
        [
            CredentialKey::Authorization,
            CredentialKey::CsrfToken,
            CredentialKey::ClientUuid,
        ]
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CredentialKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown credential key: {}", s))
    }
}

/// Stored credential with its version history marker.
///
/// `version` starts at 1 and only increases when the value changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub key: CredentialKey,
    pub value: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}
