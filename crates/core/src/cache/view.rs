//! Read-only snapshot of one entry for rendering.

use serde::Serialize;

use super::entry::{CacheEntry, FetchState};
use super::key::QueryKey;
use crate::model::{Page, Post, QueryDescriptor};

/// Presentation signals for a single query key.
#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub key: QueryKey,
    pub pages: Vec<Page>,
    pub fetch_state: FetchState,
    /// Fetching with nothing fetched yet.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub has_next_page: bool,
    /// A fetch completed and the first page came back empty.
    pub nothing_found: bool,
    /// No fetch has been attempted for this key.
    pub never_fetched: bool,
}

impl FeedView {
    pub(crate) fn from_entry(entry: &CacheEntry) -> Self {
        let is_fetching = entry.fetch_state == FetchState::Fetching;
        let is_error = entry.fetch_state == FetchState::Error;
        let first_page_empty = entry.pages.first().is_some_and(|page| page.posts.is_empty());

        Self {
            key: entry.key.clone(),
            pages: entry.pages.clone(),
            fetch_state: entry.fetch_state,
            is_loading: is_fetching && !entry.has_fetched,
            is_fetching,
            is_error,
            error: entry.last_error.as_ref().map(ToString::to_string),
            has_next_page: entry.has_next_page(),
            nothing_found: entry.has_fetched && first_page_empty && !is_fetching,
            never_fetched: !entry.has_fetched && !is_fetching && !is_error,
        }
    }

    pub(crate) fn absent(descriptor: &QueryDescriptor) -> Self {
        Self {
            key: QueryKey::build(descriptor),
            pages: Vec::new(),
            fetch_state: FetchState::Idle,
            is_loading: false,
            is_fetching: false,
            is_error: false,
            error: None,
            has_next_page: false,
            nothing_found: false,
            never_fetched: true,
        }
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.pages.iter().flat_map(|page| page.posts.iter())
    }

    pub fn post_count(&self) -> usize {
        self.pages.iter().map(|page| page.posts.len()).sum()
    }
}
