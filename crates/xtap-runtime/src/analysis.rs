use chrono::{DateTime, Duration, Utc};
use xtap_decode::{ExploreContent, decode_explore_str};
use xtap_engine::{FlowAnalysis, analyze, build_call};
use xtap_index::CallQuery;
use xtap_types::ApiCall;

use crate::Result;
use crate::config::FlowConfig;
use crate::ports::CallLog;

/// Load assistant calls from the raw call log, newest first.
///
/// `window` limits the load to calls captured within that span before `now`.
pub fn load_api_calls<L: CallLog + ?Sized>(
    log: &L,
    config: &FlowConfig,
    window: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<Vec<ApiCall>> {
    let query = CallQuery {
        url_contains: config.url_filter.clone(),
        status: Some(config.status),
        since: window.map(|w| now - w),
    };
    let calls = log
        .load_calls(&query)?
        .into_iter()
        .map(|record| {
            build_call(
                record.id,
                &record.url,
                record.timestamp,
                record.request_body.as_deref(),
                record.body.as_deref(),
            )
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        filter = %config.url_filter,
        window_secs = window.map(|w| w.num_seconds()),
        loaded = calls.len(),
        "loaded api calls"
    );
    Ok(calls)
}

/// Batch flow analysis over the raw call log
pub fn analyze_flows<L: CallLog + ?Sized>(
    log: &L,
    config: &FlowConfig,
    window: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<FlowAnalysis> {
    let calls = load_api_calls(log, config, window, now)?;
    Ok(analyze(&calls, &config.feature_flags))
}

/// Events and trends from the most recent explore sidebar captured with the
/// configured status and a JSON body.
///
/// A body without the sidebar container yields empty content.
pub fn latest_explore_content<L: CallLog + ?Sized>(
    log: &L,
    config: &FlowConfig,
) -> Result<ExploreContent> {
    let Some(body) = log.latest_call_body(&config.explore_endpoint, Some(config.status))? else {
        return Ok(ExploreContent::default());
    };
    match decode_explore_str(&body) {
        Ok(content) => Ok(content),
        Err(err) => {
            tracing::debug!(error = %err, "explore body is not JSON");
            Ok(ExploreContent::default())
        }
    }
}
