use chrono::{DateTime, Utc};
use serde::Serialize;
use xtap_index::{CookieMerge, CredentialWrite};
use xtap_types::{CookieMap, CredentialKey, HeaderMap, parse_set_cookie};

use crate::config::HarvestConfig;
use crate::ports::CredentialStore;
use crate::{Error, Result};

/// What one observation contributed to the credential store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    /// Credentials inserted or changed
    pub saved: Vec<CredentialKey>,
    /// Credentials seen with the value already stored
    pub unchanged: Vec<CredentialKey>,
    /// Cookie sub-keys merged into the stored composite
    pub merged: Vec<String>,
    /// Material seen but not stored, with the reason
    pub skipped: Vec<String>,
}

impl HarvestReport {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
            && self.unchanged.is_empty()
            && self.merged.is_empty()
            && self.skipped.is_empty()
    }
}

/// Extracts authentication material from observed traffic.
///
/// Holds no session state between observations; every update is a single
/// store transaction.
#[derive(Debug, Clone)]
pub struct Harvester {
    required_cookies: Vec<String>,
    rotating_cookie: String,
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new(&HarvestConfig::default())
    }
}

impl Harvester {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            required_cookies: config.required_cookies.clone(),
            rotating_cookie: config.rotating_cookie.clone(),
        }
    }

    /// Harvest header credentials and the composite cookie from request headers.
    ///
    /// Every credential is attempted; the first store error is returned after
    /// the remaining ones have been tried.
    pub fn harvest_request<S: CredentialStore + ?Sized>(
        &self,
        store: &S,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<HarvestReport> {
        let mut report = HarvestReport::default();
        let mut first_error: Option<Error> = None;

        for key in CredentialKey::header_keys() {
            let Some(value) = headers.get(key.as_str()).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match store.upsert_credential(key, value, now) {
                Ok(outcome) => record_write(&mut report, key, outcome),
                Err(err) => {
                    tracing::warn!(credential = %key, error = %err, "failed to store credential");
                    first_error.get_or_insert(err.into());
                }
            }
        }

        if let Some(header) = headers.get(CredentialKey::Cookie.as_str()) {
            let cookies = CookieMap::parse(header);
            let missing = cookies.missing(&self.required_cookies);
            if missing.is_empty() {
                match store.upsert_credential(CredentialKey::Cookie, &cookies.to_string(), now) {
                    Ok(outcome) => record_write(&mut report, CredentialKey::Cookie, outcome),
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to store cookie composite");
                        first_error.get_or_insert(err.into());
                    }
                }
            } else {
                tracing::debug!(missing = ?missing, "cookie header lacks required sub-keys");
                report
                    .skipped
                    .push(format!("cookie: missing {}", missing.join(", ")));
            }
        }

        finish(report, first_error)
    }

    /// Merge the rotating cookie from `set-cookie` response directives.
    ///
    /// Without a stored composite the directive is skipped and the store left
    /// unchanged.
    pub fn harvest_response<S: CredentialStore + ?Sized>(
        &self,
        store: &S,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<HarvestReport> {
        let mut report = HarvestReport::default();
        let mut first_error: Option<Error> = None;

        for directive in headers.get_all("set-cookie") {
            let Some(cookie) = parse_set_cookie(directive) else {
                continue;
            };
            if cookie.name != self.rotating_cookie {
                continue;
            }
            match store.merge_cookie(&cookie.name, &cookie.value, now) {
                Ok(CookieMerge::Merged) => report.merged.push(cookie.name),
                Ok(CookieMerge::Unchanged) => report.unchanged.push(CredentialKey::Cookie),
                Ok(CookieMerge::NoComposite) => {
                    tracing::debug!(cookie = %cookie.name, "no stored composite to merge into");
                    report
                        .skipped
                        .push(format!("{}: no stored cookie composite", cookie.name));
                }
                Err(err) => {
                    tracing::warn!(cookie = %cookie.name, error = %err, "failed to merge cookie");
                    first_error.get_or_insert(err.into());
                }
            }
        }

        finish(report, first_error)
    }
}

fn record_write(report: &mut HarvestReport, key: CredentialKey, outcome: CredentialWrite) {
    match outcome {
        CredentialWrite::Inserted | CredentialWrite::Updated => report.saved.push(key),
        CredentialWrite::Unchanged => report.unchanged.push(key),
    }
}

fn finish(report: HarvestReport, first_error: Option<Error>) -> Result<HarvestReport> {
    if !report.is_empty() {
        tracing::debug!(
            saved = ?report.saved,
            merged = ?report.merged,
            skipped = ?report.skipped,
            "harvested credentials"
        );
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}
