use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngagementSnapshot, parse_platform_timestamp, round1};

/// Lower bound applied to post age before any rate division
pub const MIN_AGE_HOURS: f64 = 0.1;

/// Raw engagement counters as reported by the platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
    pub views: i64,
}

/// Counters divided by post age in hours
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementRates {
    pub likes: f64,
    pub retweets: f64,
    pub replies: f64,
    pub views: f64,
}

impl EngagementRates {
    /// Unrounded per-hour rates. `age_hours` is floored at `MIN_AGE_HOURS`,
    /// so a missing creation time (age 0) never divides by zero.
    pub fn from_counts(counts: &EngagementCounts, age_hours: f64) -> Self {
        let age = effective_age(age_hours);
        Self {
            likes: counts.likes as f64 / age,
            retweets: counts.retweets as f64 / age,
            replies: counts.replies as f64 / age,
            views: counts.views as f64 / age,
        }
    }

    /// One-decimal presentation form
    pub fn rounded(&self) -> Self {
        Self {
            likes: round1(self.likes),
            retweets: round1(self.retweets),
            replies: round1(self.replies),
            views: round1(self.views),
        }
    }
}

/// Age of a post in hours at `reference`.
///
/// Returns 0.0 when the creation timestamp is missing or unparsable,
/// otherwise the elapsed time floored at `MIN_AGE_HOURS`.
pub fn age_hours(created_at: Option<&str>, reference: DateTime<Utc>) -> f64 {
    let Some(created) = created_at.and_then(parse_platform_timestamp) else {
        return 0.0;
    };
    let elapsed = (reference - created).num_milliseconds() as f64 / 3_600_000.0;
    elapsed.max(MIN_AGE_HOURS)
}

/// Age used as a rate divisor
pub fn effective_age(age_hours: f64) -> f64 {
    age_hours.max(MIN_AGE_HOURS)
}

/// One entry of a post's engagement history with derived age and rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPoint {
    pub captured_at: DateTime<Utc>,
    pub age_hours: f64,
    pub counts: EngagementCounts,
    pub rates: EngagementRates,
    pub following: bool,
}

impl SnapshotPoint {
    pub fn derive(snapshot: &EngagementSnapshot, created_at: Option<&str>) -> Self {
        let age = age_hours(created_at, snapshot.captured_at);
        Self {
            captured_at: snapshot.captured_at,
            age_hours: round1(age),
            counts: snapshot.counts,
            rates: EngagementRates::from_counts(&snapshot.counts, age).rounded(),
            following: snapshot.following,
        }
    }
}
