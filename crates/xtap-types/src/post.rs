use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EngagementCounts;

/// Identity fields of a captured post. Never mutated after first capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub username: String,
    pub name: String,
    pub text: String,
    /// Platform-native creation timestamp, kept verbatim
    pub created_at: Option<String>,
    pub is_long_form: bool,
}

impl Post {
    pub fn url(&self) -> String {
        format!("https://x.com/{}/status/{}", self.username, self.id)
    }
}

/// Point-in-time reading of a post's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub post_id: String,
    pub captured_at: DateTime<Utc>,
    pub counts: EngagementCounts,
    /// Whether the capturing account followed the author at capture time
    pub following: bool,
}

/// A post joined with its most recent snapshot, if any.
///
/// Posts without snapshots carry zero counters and no capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithEngagement {
    pub post: Post,
    pub first_seen_at: DateTime<Utc>,
    pub counts: EngagementCounts,
    pub captured_at: Option<DateTime<Utc>>,
    pub following: Option<bool>,
    pub observation_count: i64,
}
