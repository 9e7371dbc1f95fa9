use serde::Serialize;
use xtap_decode::decode_timeline_str;
use xtap_index::NewCall;
use xtap_types::Exchange;

use crate::config::Config;
use crate::harvester::{HarvestReport, Harvester};
use crate::ports::{CallLog, CredentialStore, EngagementStore};
use crate::{Error, Result};

/// Summary of what one callback did with an exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExchangeReport {
    pub harvest: HarvestReport,
    /// Response appended to the raw call log (false when already logged)
    pub call_logged: bool,
    /// Posts decoded from a timeline response
    pub posts_decoded: usize,
    /// Posts seen for the first time
    pub posts_inserted: usize,
    /// Snapshots appended
    pub snapshots_recorded: usize,
}

/// Callbacks the traffic-interception host invokes for every observed exchange.
///
/// Implementations must tolerate concurrent calls from several host threads.
pub trait ExchangeHandler {
    /// Request side is complete; response fields are not yet populated
    fn handle_request(&self, exchange: &Exchange) -> Result<ExchangeReport>;

    /// Response side is complete
    fn handle_response(&self, exchange: &Exchange) -> Result<ExchangeReport>;
}

/// Host port wiring harvesting, timeline capture and call logging to a store
pub struct Interceptor<S> {
    store: S,
    harvester: Harvester,
    timeline_endpoints: Vec<String>,
    debug: bool,
}

impl<S> Interceptor<S>
where
    S: CredentialStore + EngagementStore + CallLog,
{
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            harvester: Harvester::new(&config.harvest),
            timeline_endpoints: config.timeline.endpoints.clone(),
            debug: config.debug,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn is_timeline(&self, exchange: &Exchange) -> bool {
        exchange.url_contains_any(&self.timeline_endpoints)
    }

    /// Decode and persist every post of a timeline response.
    ///
    /// Posts are recorded independently; the first store error is returned
    /// once all of them have been attempted.
    fn capture_timeline(
        &self,
        exchange: &Exchange,
        report: &mut ExchangeReport,
        first_error: &mut Option<Error>,
    ) {
        let Some(body) = exchange.response_text() else {
            tracing::debug!(url = %exchange.url, "timeline response has no text body");
            return;
        };
        let posts = match decode_timeline_str(body, exchange.timestamp) {
            Ok(posts) => posts,
            Err(err) => {
                tracing::debug!(url = %exchange.url, error = %err, "timeline body is not JSON");
                return;
            }
        };

        report.posts_decoded = posts.len();
        for decoded in &posts {
            if self.debug {
                tracing::info!(
                    post_id = %decoded.post.id,
                    username = %decoded.post.username,
                    age_hours = decoded.age_hours,
                    likes = decoded.counts.likes,
                    like_rate = decoded.rates.likes,
                    "decoded post"
                );
            }
            match self
                .store
                .record(&decoded.post, &decoded.snapshot(exchange.timestamp))
            {
                Ok(outcome) => {
                    report.posts_inserted += usize::from(outcome.post_inserted);
                    report.snapshots_recorded += usize::from(outcome.snapshot_inserted);
                }
                Err(err) => {
                    tracing::warn!(post_id = %decoded.post.id, error = %err, "failed to record post");
                    first_error.get_or_insert(err.into());
                }
            }
        }
    }
}

impl<S> ExchangeHandler for Interceptor<S>
where
    S: CredentialStore + EngagementStore + CallLog,
{
    fn handle_request(&self, exchange: &Exchange) -> Result<ExchangeReport> {
        let harvest =
            self.harvester
                .harvest_request(&self.store, &exchange.request_headers, exchange.timestamp)?;
        if self.debug && !harvest.saved.is_empty() {
            tracing::info!(saved = ?harvest.saved, url = %exchange.url, "stored credentials");
        }
        Ok(ExchangeReport {
            harvest,
            ..Default::default()
        })
    }

    fn handle_response(&self, exchange: &Exchange) -> Result<ExchangeReport> {
        let mut report = ExchangeReport::default();
        let mut first_error: Option<Error> = None;

        match self.harvester.harvest_response(
            &self.store,
            &exchange.response_headers,
            exchange.timestamp,
        ) {
            Ok(harvest) => report.harvest = harvest,
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }

        let call = NewCall {
            timestamp: exchange.timestamp,
            method: exchange.method.clone(),
            url: exchange.url.clone(),
            status: exchange.status,
            headers: exchange.request_headers.to_json(),
            request_body: exchange.request_text().map(str::to_string),
            body: exchange.response_text().map(str::to_string),
        };
        match self.store.append_call(&call) {
            Ok(inserted) => report.call_logged = inserted,
            Err(err) => {
                tracing::warn!(url = %exchange.url, error = %err, "failed to log call");
                first_error.get_or_insert(err.into());
            }
        }

        if self.is_timeline(exchange) {
            self.capture_timeline(exchange, &mut report, &mut first_error);
        }

        tracing::debug!(
            url = %exchange.url,
            status = ?exchange.status,
            posts = report.posts_decoded,
            snapshots = report.snapshots_recorded,
            "handled response"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use xtap_index::{CallQuery, Database};
    use xtap_types::CredentialKey;

    const TIMELINE_BODY: &str = r#"{
        "data": {"home": {"home_timeline_urt": {"instructions": [{
            "type": "TimelineAddEntries",
            "entries": [{
                "entryId": "tweet-1",
                "content": {"itemContent": {
                    "itemType": "TimelineTweet",
                    "tweet_results": {"result": {
                        "rest_id": "1",
                        "core": {"user_results": {"result": {"legacy": {
                            "screen_name": "ferris", "name": "Ferris", "following": true
                        }}}},
                        "legacy": {
                            "full_text": "hello",
                            "created_at": "Sat Feb 01 10:00:00 +0000 2025",
                            "favorite_count": 10,
                            "retweet_count": 5,
                            "reply_count": 1
                        },
                        "views": {"count": "100"}
                    }}
                }}
            }]
        }]}}}
    }"#;

    fn timeline_exchange() -> Exchange {
        let mut exchange = Exchange::new(
            "GET",
            "https://x.com/i/api/graphql/abc/HomeTimeline?variables=%7B%7D",
            Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap(),
        );
        exchange.status = Some(200);
        exchange.response_body = Some(TIMELINE_BODY.as_bytes().to_vec());
        exchange
    }

    #[test]
    fn test_request_harvests_credentials() -> Result<()> {
        let interceptor = Interceptor::new(Database::open_in_memory()?, &Config::default());
        let mut exchange = Exchange::new("GET", "https://x.com/home", Utc::now());
        exchange.request_headers.append("Authorization", "Bearer AAA");
        exchange
            .request_headers
            .append("Cookie", "auth_token=a; ct0=c; gt=1");

        let report = interceptor.handle_request(&exchange)?;

        assert_eq!(
            report.harvest.saved,
            vec![CredentialKey::Authorization, CredentialKey::Cookie]
        );
        assert!(!report.call_logged);
        Ok(())
    }

    #[test]
    fn test_timeline_response_is_recorded_once() -> Result<()> {
        let interceptor = Interceptor::new(Database::open_in_memory()?, &Config::default());
        let exchange = timeline_exchange();

        let first = interceptor.handle_response(&exchange)?;
        assert!(first.call_logged);
        assert_eq!(first.posts_decoded, 1);
        assert_eq!(first.posts_inserted, 1);
        assert_eq!(first.snapshots_recorded, 1);

        let again = interceptor.handle_response(&exchange)?;
        assert!(!again.call_logged);
        assert_eq!(again.posts_decoded, 1);
        assert_eq!(again.snapshots_recorded, 0);

        let db = interceptor.store();
        assert_eq!(db.history("1")?.len(), 1);
        assert_eq!(db.count_calls()?, 1);
        let latest = db.latest_snapshot("1")?.unwrap();
        assert_eq!(latest.counts.likes, 10);
        assert!(latest.following);
        Ok(())
    }

    #[test]
    fn test_non_timeline_response_is_only_logged() -> Result<()> {
        let mut config = Config::default();
        config.timeline.endpoints = vec!["HomeLatestTimeline".to_string()];
        let interceptor = Interceptor::new(Database::open_in_memory()?, &config);

        let report = interceptor.handle_response(&timeline_exchange())?;

        assert!(report.call_logged);
        assert_eq!(report.posts_decoded, 0);
        assert!(interceptor.store().get_post("1")?.is_none());
        Ok(())
    }

    #[test]
    fn test_binary_body_is_logged_as_null() -> Result<()> {
        let interceptor = Interceptor::new(Database::open_in_memory()?, &Config::default());
        let mut exchange = timeline_exchange();
        exchange.response_body = Some(vec![0xff, 0xfe, 0x00]);
        exchange.request_headers.append("X-Csrf-Token", "c0ffee");
        exchange
            .response_headers
            .append("set-cookie", "gt=9; Path=/");

        let report = interceptor.handle_response(&exchange)?;

        assert!(report.call_logged);
        assert_eq!(report.posts_decoded, 0);
        assert_eq!(report.harvest.skipped.len(), 1);

        let calls = interceptor.store().load_calls(&CallQuery {
            url_contains: "HomeTimeline".to_string(),
            status: None,
            since: None,
        })?;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body, None);
        assert_eq!(calls[0].headers["x-csrf-token"], "c0ffee");
        assert!(calls[0].headers.get("set-cookie").is_none());
        Ok(())
    }
}
