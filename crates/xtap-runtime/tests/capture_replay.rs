use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use tempfile::TempDir;
use xtap_index::Database;
use xtap_runtime::{
    Config, DATABASE_FILE, ExchangeHandler, FlowConfig, Interceptor, analyze_flows, replay_file,
};
use xtap_types::{CallType, CredentialKey, Exchange};

const SESSION: &str = "tests/samples/session.jsonl";
const POST_ID: &str = "1890000000000000101";

fn open_interceptor(dir: &TempDir) -> anyhow::Result<Interceptor<Database>> {
    let db = Database::open(&dir.path().join(DATABASE_FILE))?;
    Ok(Interceptor::new(db, &Config::default()))
}

#[test]
fn test_replay_populates_store() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let interceptor = open_interceptor(&dir)?;

    let report = replay_file(Path::new(SESSION), &interceptor)?;

    assert_eq!(report.exchanges, 4);
    assert_eq!(report.malformed, 1);
    assert_eq!(report.calls_logged, 4);
    assert_eq!(report.posts_inserted, 1);
    assert_eq!(report.snapshots_recorded, 2);

    let db = interceptor.store();
    let cookie = db.get_credential(CredentialKey::Cookie)?.unwrap();
    assert_eq!(
        cookie.value,
        "auth_token=tok; ct0=c0ffee; gt=1890000000000000999; lang=en"
    );
    assert_eq!(cookie.version, 2);
    assert!(db.get_credential(CredentialKey::CsrfToken)?.is_some());

    let history = db.history(POST_ID)?;
    let likes: Vec<i64> = history.iter().map(|p| p.counts.likes).collect();
    assert_eq!(likes, vec![10, 30]);

    let top = db.top_by_observation_count(5)?;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].username, "ferris");
    assert_eq!(top[0].observation_count, 2);
    assert_eq!(top[0].likes, 30);
    Ok(())
}

#[test]
fn test_replaying_twice_is_idempotent() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let interceptor = open_interceptor(&dir)?;

    replay_file(Path::new(SESSION), &interceptor)?;
    let again = replay_file(Path::new(SESSION), &interceptor)?;

    assert_eq!(again.exchanges, 4);
    assert_eq!(again.calls_logged, 0);
    assert_eq!(again.posts_inserted, 0);
    assert_eq!(again.snapshots_recorded, 0);

    let db = interceptor.store();
    assert_eq!(db.count_calls()?, 4);
    assert_eq!(db.history(POST_ID)?.len(), 2);
    Ok(())
}

#[test]
fn test_flow_analysis_over_replayed_calls() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let interceptor = open_interceptor(&dir)?;
    replay_file(Path::new(SESSION), &interceptor)?;

    let analysis = analyze_flows(interceptor.store(), &FlowConfig::default(), None, Utc::now())?;

    assert_eq!(analysis.calls, 2);
    assert_eq!(analysis.traces.len(), 1);
    let trace = &analysis.traces[0];
    assert_eq!(trace.conversation_id, "1890000000000000500");
    let kinds: Vec<CallType> = trace.steps.iter().map(|s| s.call_type).collect();
    assert_eq!(kinds, vec![CallType::CreateConversation, CallType::AddResponse]);
    assert_eq!(trace.steps[1].tweet_id.as_deref(), Some(POST_ID));

    assert_eq!(analysis.timings.len(), 1);
    assert_eq!(analysis.timings[0].call_type, CallType::CreateConversation);
    assert_eq!(analysis.timings[0].samples, 1);
    assert!((analysis.timings[0].mean_secs - 3.0).abs() < 1e-9);

    assert_eq!(
        analysis.feature_flags.get("grok_share_attachment_enabled"),
        Some(&true)
    );
    assert_eq!(
        analysis.feature_flags.get("grok_image_annotation_enabled"),
        Some(&false)
    );
    assert!(
        !analysis
            .feature_flags
            .contains_key("grok_analyze_post_followups_enabled")
    );
    Ok(())
}

#[test]
fn test_concurrent_delivery_records_once() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let interceptor = Arc::new(open_interceptor(&dir)?);

    let content = std::fs::read_to_string(SESSION)?;
    let exchanges: Vec<Exchange> = content
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    let exchanges = Arc::new(exchanges);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let interceptor = Arc::clone(&interceptor);
            let exchanges = Arc::clone(&exchanges);
            thread::spawn(move || -> xtap_runtime::Result<()> {
                for exchange in exchanges.iter() {
                    interceptor.handle_response(exchange)?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    let db = interceptor.store();
    assert_eq!(db.count_calls()?, 4);
    assert_eq!(db.history(POST_ID)?.len(), 2);
    Ok(())
}
