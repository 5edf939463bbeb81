//! Posts API request types and validation.

use serde::Serialize;

use murmur_core::{Cursor, LikeIntent, QueryDescriptor};

use crate::posts::PostsApiError;

/// Largest page the API will serve.
pub const MAX_LIMIT: u32 = 100;

/// Query string for `GET /posts`.
///
/// Only the field belonging to the descriptor's kind is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostsQuery {
    pub kind: &'static str,

    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    pub limit: u32,
}

impl PostsQuery {
    pub fn new(descriptor: &QueryDescriptor, cursor: Option<&Cursor>, limit: u32) -> Self {
        let (user_id, text) = match descriptor {
            QueryDescriptor::Timeline => (None, None),
            QueryDescriptor::User { user_id } => (Some(user_id.clone()), None),
            QueryDescriptor::Search { text } => (None, Some(text.clone())),
        };

        Self { kind: descriptor.kind(), user_id, text, cursor: cursor.map(|c| c.as_str().to_string()), limit }
    }

    /// Validate the query parameters.
    ///
    /// An empty search text is allowed; an empty user id is not.
    pub fn validate(&self) -> Result<(), PostsApiError> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(PostsApiError::InvalidRequest(format!("limit must be 1-{MAX_LIMIT}, got {}", self.limit)));
        }

        if self.kind == "user" && self.user_id.as_deref().is_none_or(str::is_empty) {
            return Err(PostsApiError::InvalidRequest("user id cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Body of `POST /posts/{id}/like`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeRequest {
    pub intent: LikeIntent,
}
