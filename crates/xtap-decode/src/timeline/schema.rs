use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// Every step of the traversal is optional: an absent key is `None`, not an
// error. Instructions and entries stay raw and are deserialized one at a time.

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineDocument {
    pub data: Option<TimelineData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineData {
    pub home: Option<HomeContainer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HomeContainer {
    pub home_timeline_urt: Option<TimelineUrt>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimelineUrt {
    #[serde(default)]
    pub instructions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Instruction {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimelineEntry {
    pub entry_id: Option<String>,
    pub content: Option<EntryContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EntryContent {
    pub item_content: Option<ItemContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemContent {
    pub item_type: Option<String>,
    #[serde(rename = "tweet_results")]
    pub tweet_results: Option<TweetResults>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetResults {
    pub result: Option<TweetResult>,
}

/// Post result node. Some post kinds wrap the real node in `tweet`
/// (`TweetWithVisibilityResults`); the mapper unwraps one level.
#[derive(Debug, Deserialize)]
pub(crate) struct TweetResult {
    pub rest_id: Option<String>,
    pub tweet: Option<Box<TweetResult>>,
    pub core: Option<TweetCore>,
    pub legacy: Option<TweetLegacy>,
    pub views: Option<Views>,
    pub note_tweet: Option<NoteTweet>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetCore {
    pub user_results: Option<UserResults>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResults {
    pub result: Option<UserResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResult {
    pub legacy: Option<UserLegacy>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLegacy {
    pub screen_name: Option<String>,
    pub name: Option<String>,
    pub following: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TweetLegacy {
    pub full_text: Option<String>,
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "count")]
    pub favorite_count: Option<i64>,
    #[serde(default, deserialize_with = "count")]
    pub retweet_count: Option<i64>,
    #[serde(default, deserialize_with = "count")]
    pub reply_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Views {
    #[serde(default, deserialize_with = "count")]
    pub count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteTweet {
    pub note_tweet_results: Option<NoteTweetResults>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteTweetResults {
    pub result: Option<NoteTweetResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteTweetResult {
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(i64),
    Text(String),
}

/// Counters arrive either as numbers or as numeric strings (`views.count`)
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<RawCount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCount::Int(n)) => Ok(Some(n)),
        Some(RawCount::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid counter value: {:?}", s))),
    }
}
