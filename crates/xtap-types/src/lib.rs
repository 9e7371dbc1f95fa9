pub mod call;
pub mod cookie;
pub mod credential;
pub mod engagement;
pub mod exchange;
pub mod headers;
pub mod post;
mod util;

pub use call::{ApiCall, CallType};
pub use cookie::{CookieMap, SetCookie, parse_set_cookie};
pub use credential::{Credential, CredentialKey};
pub use engagement::{
    EngagementCounts, EngagementRates, MIN_AGE_HOURS, SnapshotPoint, age_hours, effective_age,
};
pub use exchange::Exchange;
pub use headers::HeaderMap;
pub use post::{EngagementSnapshot, Post, PostWithEngagement};
pub use util::*;
