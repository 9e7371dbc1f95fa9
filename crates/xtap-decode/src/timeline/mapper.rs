use chrono::{DateTime, Utc};
use std::fmt;
use xtap_types::{EngagementCounts, EngagementRates, Post, age_hours, round1};

use super::DecodedPost;
use super::schema::{TimelineEntry, TweetResult, UserLegacy};

const TIMELINE_TWEET: &str = "TimelineTweet";

/// Body and metrics of a post, by representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBody {
    /// Text and counters from the `legacy` node, views from the sibling `views` node
    Standard {
        text: String,
        created_at: Option<String>,
        counts: EngagementCounts,
    },
    /// Long-form text from `note_tweet`; the payload carries no counters
    LongForm {
        text: String,
        created_at: Option<String>,
    },
}

impl PostBody {
    fn from_result(result: &TweetResult) -> Option<Self> {
        if let Some(legacy) = &result.legacy {
            let counts = EngagementCounts {
                likes: legacy.favorite_count.unwrap_or(0),
                retweets: legacy.retweet_count.unwrap_or(0),
                replies: legacy.reply_count.unwrap_or(0),
                views: result.views.as_ref().and_then(|v| v.count).unwrap_or(0),
            };
            return Some(PostBody::Standard {
                text: legacy.full_text.clone().unwrap_or_default(),
                created_at: non_empty(legacy.created_at.as_deref()),
                counts,
            });
        }

        let text = result
            .note_tweet
            .as_ref()?
            .note_tweet_results
            .as_ref()?
            .result
            .as_ref()?
            .text
            .clone()?;
        Some(PostBody::LongForm {
            text,
            created_at: non_empty(result.created_at.as_deref()),
        })
    }

    pub fn text(&self) -> &str {
        match self {
            PostBody::Standard { text, .. } | PostBody::LongForm { text, .. } => text,
        }
    }

    pub fn created_at(&self) -> Option<&str> {
        match self {
            PostBody::Standard { created_at, .. } | PostBody::LongForm { created_at, .. } => {
                created_at.as_deref()
            }
        }
    }

    pub fn counts(&self) -> EngagementCounts {
        match self {
            PostBody::Standard { counts, .. } => *counts,
            PostBody::LongForm { .. } => EngagementCounts::default(),
        }
    }

    pub fn is_long_form(&self) -> bool {
        matches!(self, PostBody::LongForm { .. })
    }
}

/// Why an entry produced no post
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Skip {
    NotATweet(Option<String>),
    MissingResult,
    MissingAuthor,
    MissingId,
    UnknownBody,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::NotATweet(kind) => write!(
                f,
                "item type {} is not a post",
                kind.as_deref().unwrap_or("<none>")
            ),
            Skip::MissingResult => write!(f, "no tweet_results.result node"),
            Skip::MissingAuthor => write!(f, "no author legacy node"),
            Skip::MissingId => write!(f, "no rest_id"),
            Skip::UnknownBody => write!(f, "neither legacy nor note_tweet body"),
        }
    }
}

pub(crate) fn map_entry(
    entry: TimelineEntry,
    captured_at: DateTime<Utc>,
) -> Result<DecodedPost, Skip> {
    let item = entry
        .content
        .and_then(|c| c.item_content)
        .ok_or(Skip::NotATweet(None))?;

    if item.item_type.as_deref() != Some(TIMELINE_TWEET) {
        return Err(Skip::NotATweet(item.item_type));
    }

    let outer = item
        .tweet_results
        .and_then(|r| r.result)
        .ok_or(Skip::MissingResult)?;
    let outer_id = outer.rest_id.clone();
    let result = match outer.tweet {
        Some(inner) => *inner,
        None => outer,
    };

    let author = author_of(&result).ok_or(Skip::MissingAuthor)?;
    let id = result.rest_id.clone().or(outer_id).ok_or(Skip::MissingId)?;
    let body = PostBody::from_result(&result).ok_or(Skip::UnknownBody)?;

    let counts = body.counts();
    let age = age_hours(body.created_at(), captured_at);

    Ok(DecodedPost {
        post: Post {
            id,
            username: author.screen_name.clone().unwrap_or_default(),
            name: author.name.clone().unwrap_or_default(),
            text: body.text().to_string(),
            created_at: body.created_at().map(str::to_string),
            is_long_form: body.is_long_form(),
        },
        counts,
        following: author.following.unwrap_or(false),
        age_hours: round1(age),
        rates: EngagementRates::from_counts(&counts, age).rounded(),
        body,
    })
}

fn author_of(result: &TweetResult) -> Option<&UserLegacy> {
    result
        .core
        .as_ref()?
        .user_results
        .as_ref()?
        .result
        .as_ref()?
        .legacy
        .as_ref()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}
