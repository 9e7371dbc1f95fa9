use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use xtap_types::{ApiCall, CallType};

/// URL signatures in match order; the first substring found wins
pub const CALL_SIGNATURES: [(&str, CallType); 8] = [
    ("add_response.json", CallType::AddResponse),
    ("CreateGrokConversation", CallType::CreateConversation),
    ("GrokHome", CallType::Home),
    ("TweetDetail", CallType::TweetDetail),
    ("TweetResultByRestId", CallType::TweetById),
    ("UserTweets", CallType::UserTweets),
    ("ExploreSidebar", CallType::Explore),
    ("BroadcastQuery", CallType::Broadcast),
];

const GRAPHQL_MARKER: &str = "graphql";

/// Classify a call by its URL. Deterministic; `None` for unknown URLs.
pub fn classify(url: &str) -> Option<CallType> {
    CALL_SIGNATURES
        .iter()
        .find(|(signature, _)| url.contains(signature))
        .map(|(_, call_type)| *call_type)
}

/// Build an analysis record from a raw call.
///
/// Conversation and subject-post ids come from the top-level
/// `conversation_id` / `tweet_id` keys of the response body, else the request
/// body. Bodies that are not JSON objects contribute nothing.
pub fn build_call(
    sequence_id: i64,
    url: &str,
    timestamp: DateTime<Utc>,
    request_body: Option<&str>,
    response_body: Option<&str>,
) -> ApiCall {
    let response = response_body.and_then(parse_object);
    let request = request_body.and_then(parse_object);

    let lookup = |key: &str| {
        response
            .as_ref()
            .and_then(|v| id_field(v, key))
            .or_else(|| request.as_ref().and_then(|v| id_field(v, key)))
    };

    ApiCall {
        sequence_id,
        url: url.to_string(),
        timestamp,
        conversation_id: lookup("conversation_id"),
        tweet_id: lookup("tweet_id"),
        call_type: classify(url),
    }
}

fn parse_object(body: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Mean latency from a call of `call_type` to the next call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingStat {
    pub call_type: CallType,
    pub mean_secs: f64,
    pub samples: usize,
}

/// Inter-call timing per call type.
///
/// For each pair of chronologically adjacent calls the latency is attributed
/// to the earlier call's type. Unclassified earlier calls contribute nothing.
pub fn timing_report(calls: &[ApiCall]) -> Vec<TimingStat> {
    let mut ordered: Vec<&ApiCall> = calls.iter().collect();
    ordered.sort_by_key(|c| (c.timestamp, c.sequence_id));

    let mut samples: BTreeMap<CallType, Vec<f64>> = BTreeMap::new();
    for pair in ordered.windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        let Some(call_type) = earlier.call_type else {
            continue;
        };
        let latency = (later.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1000.0;
        samples.entry(call_type).or_default().push(latency.max(0.0));
    }

    samples
        .into_iter()
        .map(|(call_type, latencies)| TimingStat {
            call_type,
            mean_secs: latencies.iter().sum::<f64>() / latencies.len() as f64,
            samples: latencies.len(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub sequence_id: i64,
    pub call_type: CallType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweet_id: Option<String>,
}

/// Classified calls sharing one conversation id, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub conversation_id: String,
    pub steps: Vec<TraceStep>,
}

/// Group calls into per-conversation traces.
///
/// Calls without a conversation id and unclassified calls are left out.
/// Traces are ordered by their first call.
pub fn traces(calls: &[ApiCall]) -> Vec<Trace> {
    let mut grouped: HashMap<&str, Vec<TraceStep>> = HashMap::new();
    for call in calls {
        let (Some(conversation_id), Some(call_type)) = (&call.conversation_id, call.call_type)
        else {
            continue;
        };
        grouped
            .entry(conversation_id.as_str())
            .or_default()
            .push(TraceStep {
                sequence_id: call.sequence_id,
                call_type,
                timestamp: call.timestamp,
                tweet_id: call.tweet_id.clone(),
            });
    }

    let mut traces: Vec<Trace> = grouped
        .into_iter()
        .map(|(conversation_id, mut steps)| {
            steps.sort_by_key(|s| (s.timestamp, s.sequence_id));
            Trace {
                conversation_id: conversation_id.to_string(),
                steps,
            }
        })
        .collect();

    traces.sort_by(|a, b| {
        let first_a = a.steps.first().map(|s| s.timestamp);
        let first_b = b.steps.first().map(|s| s.timestamp);
        first_a
            .cmp(&first_b)
            .then_with(|| a.conversation_id.cmp(&b.conversation_id))
    });
    traces
}

/// Feature flag values carried in GraphQL query strings.
///
/// The value is the literal after `<flag>%22%3A` up to the next `%`, `&` or
/// end of URL; `true` (any case) means enabled. When a flag appears in several
/// calls the most recent one wins.
pub fn feature_flags<S: AsRef<str>>(calls: &[ApiCall], flag_names: &[S]) -> BTreeMap<String, bool> {
    let patterns: Vec<(&str, Regex)> = flag_names
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let pattern = format!("{}%22%3A([^%&]*)", regex::escape(name));
            match Regex::new(&pattern) {
                Ok(re) => Some((name, re)),
                Err(err) => {
                    tracing::warn!(flag = name, error = %err, "invalid feature flag pattern");
                    None
                }
            }
        })
        .collect();

    let mut ordered: Vec<&ApiCall> = calls
        .iter()
        .filter(|c| c.url.contains(GRAPHQL_MARKER))
        .collect();
    ordered.sort_by_key(|c| (c.timestamp, c.sequence_id));

    let mut flags = BTreeMap::new();
    for call in ordered {
        for (name, re) in &patterns {
            if let Some(value) = re.captures(&call.url).and_then(|c| c.get(1)) {
                flags.insert(
                    name.to_string(),
                    value.as_str().eq_ignore_ascii_case("true"),
                );
            }
        }
    }
    flags
}

/// Result of one batch analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAnalysis {
    pub calls: usize,
    pub timings: Vec<TimingStat>,
    pub traces: Vec<Trace>,
    pub feature_flags: BTreeMap<String, bool>,
}

pub fn analyze<S: AsRef<str>>(calls: &[ApiCall], flag_names: &[S]) -> FlowAnalysis {
    let analysis = FlowAnalysis {
        calls: calls.len(),
        timings: timing_report(calls),
        traces: traces(calls),
        feature_flags: feature_flags(calls, flag_names),
    };
    tracing::debug!(
        calls = analysis.calls,
        traces = analysis.traces.len(),
        flags = analysis.feature_flags.len(),
        "flow analysis complete"
    );
    analysis
}
