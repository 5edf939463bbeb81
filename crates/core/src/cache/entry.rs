//! Per-query-key cache entries.

use serde::Serialize;

use super::key::QueryKey;
use crate::Error;
use crate::model::{Page, Post, QueryDescriptor};

/// Fetch status of a cache entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchState {
    #[default]
    Idle,
    Fetching,
    Error,
}

/// Cached pages for one query key plus its fetch status.
///
/// Pages are kept in fetch order: page 0 is the first page fetched. Only the
/// last page's `next_cursor` may be used to request more.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub(crate) descriptor: QueryDescriptor,
    pub(crate) key: QueryKey,
    pub(crate) pages: Vec<Page>,
    pub(crate) fetch_state: FetchState,
    pub(crate) last_error: Option<Error>,
    pub(crate) has_fetched: bool,
    pub(crate) stale: bool,
    pub(crate) epoch: u64,
    /// Bumped whenever the pages are replaced by a first-page merge.
    pub(crate) revision: u64,
}

impl CacheEntry {
    pub(crate) fn new(descriptor: QueryDescriptor, epoch: u64) -> Self {
        let key = QueryKey::build(&descriptor);
        Self {
            descriptor,
            key,
            pages: Vec::new(),
            fetch_state: FetchState::Idle,
            last_error: None,
            has_fetched: false,
            stale: false,
            epoch,
            revision: 0,
        }
    }

    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Whether any fetch for this entry has completed successfully.
    pub fn has_fetched(&self) -> bool {
        self.has_fetched
    }

    /// Marked by `invalidate`; cleared by the next successful first-page fetch.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// True when the last page carries a cursor.
    pub fn has_next_page(&self) -> bool {
        self.pages.last().is_some_and(|page| page.next_cursor.is_some())
    }

    pub fn post_count(&self) -> usize {
        self.pages.iter().map(|page| page.posts.len()).sum()
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.pages.iter().flat_map(|page| page.posts.iter())
    }

    /// Map `transform` over every cached post in place, keeping page boundaries
    /// and order. Returns the number of posts visited.
    pub fn apply_to_all_pages<F>(&mut self, mut transform: F) -> usize
    where
        F: FnMut(&mut Post),
    {
        let mut visited = 0;
        for post in self.pages.iter_mut().flat_map(|page| page.posts.iter_mut()) {
            transform(post);
            visited += 1;
        }
        visited
    }

    pub(crate) fn contains_post(&self, post_id: &str) -> bool {
        self.posts().any(|post| post.id == post_id)
    }

    pub(crate) fn post_at_mut(&mut self, page: usize, slot: usize) -> Option<&mut Post> {
        self.pages.get_mut(page)?.posts.get_mut(slot)
    }

    /// Enter `Fetching` and return the epoch the result must be merged into.
    pub(crate) fn begin_fetch(&mut self) -> u64 {
        self.fetch_state = FetchState::Fetching;
        self.epoch
    }
}
