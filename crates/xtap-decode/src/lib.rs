// Document decoders
// Pure functions from a parsed response body to domain records. A record that
// does not match the expected shape is skipped; it never fails the document.

pub mod error;
pub mod explore;
pub mod timeline;

pub use error::{Error, Result};
pub use explore::{ExploreContent, ExploreEvent, ExploreTrend, decode_explore, decode_explore_str};
pub use timeline::{DecodedPost, PostBody, decode_timeline, decode_timeline_str};
