//! Post, page and query descriptor types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a feed query.
///
/// The tag plus its payload fully determines which cache entry a query uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryDescriptor {
    /// All posts, newest first.
    Timeline,
    /// Posts authored by one user.
    User {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Posts whose text matches a search string. Empty text is a valid query.
    Search { text: String },
}

impl QueryDescriptor {
    pub fn user(user_id: impl Into<String>) -> Self {
        QueryDescriptor::User { user_id: user_id.into() }
    }

    pub fn search(text: impl Into<String>) -> Self {
        QueryDescriptor::Search { text: text.into() }
    }

    /// The `kind` tag as it appears on the wire and in cache keys.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryDescriptor::Timeline => "timeline",
            QueryDescriptor::User { .. } => "user",
            QueryDescriptor::Search { .. } => "search",
        }
    }
}

/// Opaque pagination token handed out by the posts service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

/// A post as seen by the current viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,

    /// Derived from a bounded sample of likers, not a full membership check.
    pub viewer_has_liked: bool,

    /// First entry of the liker sample returned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_sample_user_id: Option<String>,
}

impl Post {
    pub(crate) fn like_state(&self) -> LikeState {
        LikeState { viewer_has_liked: self.viewer_has_liked, like_count: self.like_count }
    }

    pub(crate) fn set_like_state(&mut self, state: LikeState) {
        self.viewer_has_liked = state.viewer_has_liked;
        self.like_count = state.like_count;
    }
}

/// The two fields a like/unlike touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LikeState {
    pub viewer_has_liked: bool,
    pub like_count: u64,
}

impl LikeState {
    /// Optimistic state after `intent`, or `None` when the post is already there.
    pub fn apply(self, intent: LikeIntent) -> Option<LikeState> {
        match intent {
            LikeIntent::Like if !self.viewer_has_liked => {
                Some(LikeState { viewer_has_liked: true, like_count: self.like_count + 1 })
            }
            LikeIntent::Unlike if self.viewer_has_liked => {
                Some(LikeState { viewer_has_liked: false, like_count: self.like_count.saturating_sub(1) })
            }
            _ => None,
        }
    }
}

/// One page of a cursor-paginated feed, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub posts: Vec<Post>,
    pub next_cursor: Option<Cursor>,
}

impl Page {
    pub fn new(posts: Vec<Post>, next_cursor: Option<Cursor>) -> Self {
        Self { posts, next_cursor }
    }

    /// Empty page with no continuation.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeIntent {
    Like,
    Unlike,
}

impl LikeIntent {
    /// The intent a like button sends for a post in the given state.
    pub fn toggle_for(viewer_has_liked: bool) -> Self {
        if viewer_has_liked { LikeIntent::Unlike } else { LikeIntent::Like }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeIntent::Like => "like",
            LikeIntent::Unlike => "unlike",
        }
    }
}

impl fmt::Display for LikeIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_serde_shape() {
        let json = serde_json::to_string(&QueryDescriptor::user("u1")).unwrap();
        assert_eq!(json, r#"{"kind":"user","userId":"u1"}"#);

        let json = serde_json::to_string(&QueryDescriptor::Timeline).unwrap();
        assert_eq!(json, r#"{"kind":"timeline"}"#);

        let parsed: QueryDescriptor = serde_json::from_str(r#"{"kind":"search","text":"rust"}"#).unwrap();
        assert_eq!(parsed, QueryDescriptor::search("rust"));
    }

    #[test]
    fn test_like_state_guards_duplicates() {
        let unliked = LikeState { viewer_has_liked: false, like_count: 3 };
        let liked = unliked.apply(LikeIntent::Like).unwrap();
        assert_eq!(liked, LikeState { viewer_has_liked: true, like_count: 4 });
        assert!(liked.apply(LikeIntent::Like).is_none());
        assert!(unliked.apply(LikeIntent::Unlike).is_none());
        assert_eq!(liked.apply(LikeIntent::Unlike), Some(unliked));
    }

    #[test]
    fn test_unlike_never_underflows() {
        let odd = LikeState { viewer_has_liked: true, like_count: 0 };
        assert_eq!(odd.apply(LikeIntent::Unlike).unwrap().like_count, 0);
    }

    #[test]
    fn test_toggle_for() {
        assert_eq!(LikeIntent::toggle_for(true), LikeIntent::Unlike);
        assert_eq!(LikeIntent::toggle_for(false), LikeIntent::Like);
        assert_eq!(LikeIntent::Unlike.to_string(), "unlike");
    }
}
