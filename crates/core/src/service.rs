//! Contract of the external posts service.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::model::{Cursor, LikeIntent, Page, Post, QueryDescriptor};

/// Paginated posts backend consumed by the feed cache and like mutator.
///
/// Implementations own transport concerns (encoding, timeouts, auth headers).
#[async_trait]
pub trait PostsService: Send + Sync {
    /// Fetch one page for `descriptor`, starting at `cursor` (`None` for the first page).
    ///
    /// An empty result (`posts: []`, `next_cursor: None`) is valid.
    async fn get_posts_paginated(
        &self, descriptor: &QueryDescriptor, cursor: Option<&Cursor>,
    ) -> Result<Page, ServiceError>;

    /// Fetch a single post by id.
    async fn get_post(&self, post_id: &str) -> Result<Post, ServiceError>;

    /// Record the viewer's like intent. Redundant calls must not error.
    async fn set_like(&self, post_id: &str, intent: LikeIntent) -> Result<(), ServiceError>;
}
