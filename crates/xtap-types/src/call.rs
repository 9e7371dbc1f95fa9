use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label for an assistant-related API call, derived from its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    AddResponse,
    CreateConversation,
    Home,
    TweetDetail,
    TweetById,
    UserTweets,
    Explore,
    Broadcast,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::AddResponse => "add_response",
            CallType::CreateConversation => "create_conversation",
            CallType::Home => "home",
            CallType::TweetDetail => "tweet_detail",
            CallType::TweetById => "tweet_by_id",
            CallType::UserTweets => "user_tweets",
            CallType::Explore => "explore",
            CallType::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured call prepared for flow analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCall {
    /// Row id of the raw call log entry
    pub sequence_id: i64,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub conversation_id: Option<String>,
    pub tweet_id: Option<String>,
    /// `None` when the URL matches no known signature
    pub call_type: Option<CallType>,
}
