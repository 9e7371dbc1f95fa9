mod mapper;
mod schema;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use xtap_types::{EngagementCounts, EngagementRates, EngagementSnapshot, Post};

use crate::Result;
use schema::{Instruction, TimelineDocument, TimelineEntry};

pub use mapper::PostBody;

const ADD_ENTRIES: &str = "TimelineAddEntries";

/// A post recovered from a timeline document, with counters as captured
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedPost {
    pub post: Post,
    pub counts: EngagementCounts,
    /// Author is followed by the capturing account
    pub following: bool,
    /// Age at capture, rounded to one decimal (0.0 when the creation time is unknown)
    pub age_hours: f64,
    /// Per-hour rates, rounded to one decimal
    pub rates: EngagementRates,
    #[serde(skip)]
    pub(crate) body: PostBody,
}

impl DecodedPost {
    /// Tagged body/metrics representation the post was decoded from
    pub fn body(&self) -> &PostBody {
        &self.body
    }

    /// Snapshot row for the engagement store (unrounded counters)
    pub fn snapshot(&self, captured_at: DateTime<Utc>) -> EngagementSnapshot {
        EngagementSnapshot {
            post_id: self.post.id.clone(),
            captured_at,
            counts: self.counts,
            following: self.following,
        }
    }
}

/// Decode a home timeline document into posts.
///
/// Returns an empty vector when the document does not have the timeline
/// container. Entries that fail to decode are skipped individually.
pub fn decode_timeline(doc: &Value, captured_at: DateTime<Utc>) -> Vec<DecodedPost> {
    let document = match TimelineDocument::deserialize(doc) {
        Ok(document) => document,
        Err(err) => {
            tracing::debug!(error = %err, "timeline document has unexpected shape");
            return Vec::new();
        }
    };

    let Some(timeline) = document
        .data
        .and_then(|d| d.home)
        .and_then(|h| h.home_timeline_urt)
    else {
        tracing::debug!("document has no home timeline container");
        return Vec::new();
    };

    let mut posts = Vec::new();
    for raw_instruction in &timeline.instructions {
        let instruction = match Instruction::deserialize(raw_instruction) {
            Ok(instruction) => instruction,
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed instruction");
                continue;
            }
        };
        if instruction.kind.as_deref() != Some(ADD_ENTRIES) {
            continue;
        }

        for raw_entry in &instruction.entries {
            let entry = match TimelineEntry::deserialize(raw_entry) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed timeline entry");
                    continue;
                }
            };
            let entry_id = entry.entry_id.clone();
            match mapper::map_entry(entry, captured_at) {
                Ok(post) => posts.push(post),
                Err(reason) => {
                    tracing::debug!(entry_id = ?entry_id, %reason, "timeline entry skipped");
                }
            }
        }
    }

    tracing::debug!(count = posts.len(), "decoded timeline posts");
    posts
}

/// Parse and decode a response body
pub fn decode_timeline_str(body: &str, captured_at: DateTime<Utc>) -> Result<Vec<DecodedPost>> {
    let doc: Value = serde_json::from_str(body)?;
    Ok(decode_timeline(&doc, captured_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn captured_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    fn platform_time(ts: DateTime<Utc>) -> String {
        ts.format(xtap_types::PLATFORM_TIME_FORMAT).to_string()
    }

    fn user(screen_name: &str, following: bool) -> Value {
        json!({
            "user_results": {
                "result": {
                    "legacy": {
                        "screen_name": screen_name,
                        "name": format!("{} display", screen_name),
                        "following": following
                    }
                }
            }
        })
    }

    fn tweet_entry(result: Value) -> Value {
        json!({
            "entryId": "tweet-1",
            "content": {
                "entryType": "TimelineTimelineItem",
                "itemContent": {
                    "itemType": "TimelineTweet",
                    "tweet_results": { "result": result }
                }
            }
        })
    }

    fn document(entries: Vec<Value>) -> Value {
        json!({
            "data": {
                "home": {
                    "home_timeline_urt": {
                        "instructions": [
                            { "type": "TimelineClearCache" },
                            { "type": "TimelineAddEntries", "entries": entries }
                        ]
                    }
                }
            }
        })
    }

    fn standard(id: &str, created_at: &str) -> Value {
        json!({
            "__typename": "Tweet",
            "rest_id": id,
            "core": user("alice", true),
            "views": { "count": "1200", "state": "EnabledWithCount" },
            "legacy": {
                "full_text": "hello timeline",
                "created_at": created_at,
                "favorite_count": 10,
                "retweet_count": 5,
                "reply_count": 2
            }
        })
    }

    #[test]
    fn test_missing_container_yields_empty() {
        assert!(decode_timeline(&json!({}), captured_at()).is_empty());
        assert!(decode_timeline(&json!({"data": {"user": {}}}), captured_at()).is_empty());
        assert!(decode_timeline(&json!({"data": "oops"}), captured_at()).is_empty());
        assert!(decode_timeline(&json!([1, 2, 3]), captured_at()).is_empty());
    }

    #[test]
    fn test_standard_variant_two_hours_old() {
        let created = platform_time(captured_at() - Duration::hours(2));
        let doc = document(vec![tweet_entry(standard("100", &created))]);

        let posts = decode_timeline(&doc, captured_at());
        assert_eq!(posts.len(), 1);

        let post = &posts[0];
        assert_eq!(post.post.id, "100");
        assert_eq!(post.post.username, "alice");
        assert_eq!(post.post.name, "alice display");
        assert!(!post.post.is_long_form);
        assert!(post.following);
        assert_eq!(post.counts.likes, 10);
        assert_eq!(post.counts.views, 1200);
        assert_eq!(post.age_hours, 2.0);
        assert_eq!(post.rates.likes, 5.0);
        assert_eq!(post.rates.retweets, 2.5);
        assert!(matches!(post.body(), PostBody::Standard { .. }));
    }

    #[test]
    fn test_zero_age_uses_floor() {
        let created = platform_time(captured_at());
        let doc = document(vec![tweet_entry(standard("100", &created))]);

        let posts = decode_timeline(&doc, captured_at());
        assert_eq!(posts[0].age_hours, 0.1);
        assert_eq!(posts[0].rates.likes, 100.0);
    }

    #[test]
    fn test_wrapped_result_is_unwrapped() {
        let created = platform_time(captured_at() - Duration::hours(1));
        let doc = document(vec![tweet_entry(json!({
            "__typename": "TweetWithVisibilityResults",
            "tweet": standard("200", &created)
        }))]);

        let posts = decode_timeline(&doc, captured_at());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post.id, "200");
        assert_eq!(posts[0].counts.retweets, 5);
    }

    #[test]
    fn test_long_form_variant_has_zero_counters() {
        let doc = document(vec![tweet_entry(json!({
            "rest_id": "300",
            "core": user("bob", false),
            "note_tweet": {
                "note_tweet_results": { "result": { "text": "a very long post" } }
            }
        }))]);

        let posts = decode_timeline(&doc, captured_at());
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert!(post.post.is_long_form);
        assert_eq!(post.post.text, "a very long post");
        assert_eq!(post.counts, EngagementCounts::default());
        assert_eq!(post.age_hours, 0.0);
        assert_eq!(post.rates.likes, 0.0);
        assert!(!post.following);
    }

    #[test]
    fn test_bad_entries_do_not_abort_siblings() {
        let created = platform_time(captured_at() - Duration::hours(3));
        let doc = document(vec![
            json!("not an object"),
            tweet_entry(json!({ "rest_id": "1", "core": user("carol", false) })),
            tweet_entry(json!({ "rest_id": "2", "legacy": { "full_text": "no author" } })),
            tweet_entry(json!({
                "rest_id": "3",
                "core": user("dave", false),
                "legacy": { "favorite_count": "lots" }
            })),
            json!({
                "entryId": "cursor-top",
                "content": { "entryType": "TimelineTimelineCursor", "value": "abc" }
            }),
            json!({
                "entryId": "who-to-follow",
                "content": { "itemContent": { "itemType": "TimelineUser" } }
            }),
            tweet_entry(standard("4", &created)),
        ]);

        let posts = decode_timeline(&doc, captured_at());
        let ids: Vec<&str> = posts.iter().map(|p| p.post.id.as_str()).collect();
        assert_eq!(ids, vec!["4"]);
    }

    #[test]
    fn test_snapshot_keeps_unrounded_counters() {
        let created = platform_time(captured_at() - Duration::hours(3));
        let doc = document(vec![tweet_entry(standard("100", &created))]);
        let post = decode_timeline(&doc, captured_at()).remove(0);

        let snapshot = post.snapshot(captured_at());
        assert_eq!(snapshot.post_id, "100");
        assert_eq!(snapshot.counts.likes, 10);
        assert_eq!(snapshot.captured_at, captured_at());
        assert!(snapshot.following);
    }

    #[test]
    fn test_decode_str_rejects_non_json() {
        assert!(decode_timeline_str("<html>", captured_at()).is_err());
        assert!(decode_timeline_str("{}", captured_at()).unwrap().is_empty());
    }
}
