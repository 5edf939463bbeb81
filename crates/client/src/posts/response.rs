//! Posts API response types and normalization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use murmur_core::{Author, Cursor, Page, Post};

/// Raw page from `GET /posts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPageResponse {
    pub posts: Vec<PostRecord>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Raw post as the API returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: String,
    pub author_id: String,
    pub author: AuthorRecord,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Bounded sample of likers, not the full list.
    #[serde(default)]
    pub liked_by: Vec<LikerRecord>,
    #[serde(rename = "_count", default)]
    pub count: CountRecord,
}

#[derive(Debug, Deserialize)]
pub struct AuthorRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LikerRecord {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRecord {
    #[serde(default)]
    pub liked_by: u64,
}

impl PostRecord {
    /// Normalize for `viewer_id`.
    ///
    /// The viewer counts as having liked the post only when they are the first
    /// entry of the liker sample.
    pub fn into_post(self, viewer_id: Option<&str>) -> Post {
        let like_sample_user_id = self.liked_by.into_iter().next().map(|liker| liker.id);
        let viewer_has_liked = viewer_id.is_some_and(|viewer| like_sample_user_id.as_deref() == Some(viewer));

        Post {
            id: self.id,
            author_id: self.author_id,
            author: Author { name: self.author.name.unwrap_or_default(), id: self.author.id, image: self.author.image },
            text: self.text,
            created_at: self.created_at,
            like_count: self.count.liked_by,
            viewer_has_liked,
            like_sample_user_id,
        }
    }
}

impl PostsPageResponse {
    pub fn into_page(self, viewer_id: Option<&str>) -> Page {
        let posts = self.posts.into_iter().map(|record| record.into_post(viewer_id)).collect();
        Page::new(posts, self.next_cursor.map(Cursor::new))
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}
