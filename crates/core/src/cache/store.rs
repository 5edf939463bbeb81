//! In-memory feed cache keyed by query.
//!
//! All state lives behind one async mutex. Every merge happens inside a single
//! lock hold and the lock is never held across a service call, so no partial
//! update is observable and fetches for different keys run independently.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::entry::{CacheEntry, FetchState};
use super::key::QueryKey;
use super::view::FeedView;
use crate::Error;
use crate::error::ServiceError;
use crate::like::{LikeLedger, LikeMutator};
use crate::model::{Page, Post, QueryDescriptor};
use crate::service::PostsService;

/// Result of a page request that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    /// A page was fetched (or served from cache) and merged.
    Page(Page),
    /// The last cached page has no cursor; nothing was requested.
    NoMorePages,
    /// A fetch for this entry is already running; nothing was requested.
    AlreadyFetching,
    /// The entry was discarded while the request was in flight; the result was dropped.
    Discarded,
}

impl PageFetch {
    pub fn page(&self) -> Option<&Page> {
        match self {
            PageFetch::Page(page) => Some(page),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Merge {
    Replace,
    Append,
}

/// A single post fetched on its own, outside any feed.
#[derive(Debug, Clone)]
pub(crate) struct CachedDetail {
    pub(crate) post: Post,
    pub(crate) revision: u64,
}

/// Mutable state shared by the cache and the like mutator.
#[derive(Debug, Default)]
pub(crate) struct FeedState {
    pub(crate) entries: HashMap<QueryKey, CacheEntry>,
    pub(crate) details: HashMap<String, CachedDetail>,
    pub(crate) likes: LikeLedger,
    next_epoch: u64,
    next_revision: u64,
}

impl FeedState {
    fn entry_mut(&mut self, descriptor: &QueryDescriptor) -> &mut CacheEntry {
        let key = QueryKey::build(descriptor);
        let next_epoch = &mut self.next_epoch;
        self.entries.entry(key).or_insert_with(|| {
            *next_epoch += 1;
            tracing::debug!(kind = descriptor.kind(), "creating cache entry");
            CacheEntry::new(descriptor.clone(), *next_epoch)
        })
    }

    fn next_revision(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }
}

/// Explicitly owned feed cache for one viewer session.
///
/// Cloning is cheap and yields a handle to the same cache.
#[derive(Clone)]
pub struct FeedCacheStore {
    pub(crate) state: Arc<Mutex<FeedState>>,
    service: Arc<dyn PostsService>,
}

impl FeedCacheStore {
    /// Create an empty cache backed by `service`.
    pub fn new(service: Arc<dyn PostsService>) -> Self {
        Self { state: Arc::new(Mutex::new(FeedState::default())), service }
    }

    pub(crate) fn service(&self) -> &dyn PostsService {
        self.service.as_ref()
    }

    /// A like mutator operating on this cache.
    pub fn like_mutator(&self) -> LikeMutator {
        LikeMutator::new(self.clone())
    }

    /// Return the entry for `descriptor`, creating an empty one on first access.
    pub async fn get_or_create(&self, descriptor: &QueryDescriptor) -> CacheEntry {
        self.state.lock().await.entry_mut(descriptor).clone()
    }

    /// Current entry for `descriptor`, if one exists.
    pub async fn entry(&self, descriptor: &QueryDescriptor) -> Option<CacheEntry> {
        self.state.lock().await.entries.get(&QueryKey::build(descriptor)).cloned()
    }

    /// Fetch the first page, replacing any cached pages on success.
    ///
    /// On failure the entry moves to `Error`, cached pages stay available and
    /// `Error::FetchFailed` is returned.
    pub async fn fetch_first_page(&self, descriptor: &QueryDescriptor) -> Result<PageFetch, Error> {
        self.start_first_page(descriptor, false).await
    }

    /// Fetch the page after the last cached one and append it.
    ///
    /// With no pages cached this behaves like [`fetch_first_page`](Self::fetch_first_page).
    pub async fn fetch_next_page(&self, descriptor: &QueryDescriptor) -> Result<PageFetch, Error> {
        let (key, cursor, epoch) = {
            let mut state = self.state.lock().await;
            let entry = state.entry_mut(descriptor);

            if entry.fetch_state == FetchState::Fetching {
                tracing::debug!(key = %entry.key, "fetch already in flight, skipping next page");
                return Ok(PageFetch::AlreadyFetching);
            }

            let cursor = match entry.pages.last() {
                None => None,
                Some(page) => match &page.next_cursor {
                    Some(cursor) => Some(cursor.clone()),
                    None => return Ok(PageFetch::NoMorePages),
                },
            };

            match cursor {
                Some(cursor) => (entry.key.clone(), cursor, entry.begin_fetch()),
                None => {
                    drop(state);
                    return self.fetch_first_page(descriptor).await;
                }
            }
        };

        tracing::debug!(key = %key, cursor = %cursor, "fetching next page");
        let result = self.service.get_posts_paginated(descriptor, Some(&cursor)).await;
        self.complete_fetch(&key, epoch, result, Merge::Append).await
    }

    /// Drop all cached pages for `descriptor` and fetch the first page again.
    ///
    /// Returns `AlreadyFetching` without touching the pages if a fetch is running.
    pub async fn refetch(&self, descriptor: &QueryDescriptor) -> Result<PageFetch, Error> {
        self.start_first_page(descriptor, true).await
    }

    /// Serve the first page from cache when it is fresh, otherwise fetch it.
    pub async fn ensure_first_page(&self, descriptor: &QueryDescriptor) -> Result<PageFetch, Error> {
        {
            let mut state = self.state.lock().await;
            let entry = state.entry_mut(descriptor);
            if entry.has_fetched
                && !entry.stale
                && entry.fetch_state == FetchState::Idle
                && let Some(first) = entry.pages.first()
            {
                tracing::debug!(key = %entry.key, "cache hit");
                return Ok(PageFetch::Page(first.clone()));
            }
            tracing::debug!(key = %entry.key, "cache miss");
        }
        self.fetch_first_page(descriptor).await
    }

    /// Mark the entry stale. Pages remain readable until the next fetch.
    pub async fn invalidate(&self, descriptor: &QueryDescriptor) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.get_mut(&QueryKey::build(descriptor)) {
            entry.stale = true;
        }
    }

    pub async fn invalidate_all(&self) {
        let mut state = self.state.lock().await;
        for entry in state.entries.values_mut() {
            entry.stale = true;
        }
    }

    /// Remove the entry; any in-flight result for it will be dropped.
    ///
    /// Returns whether an entry was removed.
    pub async fn discard(&self, descriptor: &QueryDescriptor) -> bool {
        let key = QueryKey::build(descriptor);
        let removed = self.state.lock().await.entries.remove(&key).is_some();
        if removed {
            tracing::debug!(key = %key, "discarded cache entry");
        }
        removed
    }

    /// Map `transform` over every cached post of one entry.
    ///
    /// Returns `None` if no entry exists for `descriptor`.
    pub async fn apply_to_all_pages<F>(&self, descriptor: &QueryDescriptor, transform: F) -> Option<usize>
    where
        F: FnMut(&mut Post),
    {
        let mut state = self.state.lock().await;
        state
            .entries
            .get_mut(&QueryKey::build(descriptor))
            .map(|entry| entry.apply_to_all_pages(transform))
    }

    /// Presentation signals for `descriptor`.
    pub async fn view(&self, descriptor: &QueryDescriptor) -> FeedView {
        let state = self.state.lock().await;
        match state.entries.get(&QueryKey::build(descriptor)) {
            Some(entry) => FeedView::from_entry(entry),
            None => FeedView::absent(descriptor),
        }
    }

    /// Keys of all live entries, sorted.
    pub async fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<_> = self.state.lock().await.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Fetch a single post and cache it as a detail occurrence.
    pub async fn fetch_post(&self, post_id: &str) -> Result<Post, Error> {
        if post_id.is_empty() {
            return Err(Error::InvalidInput("post id cannot be empty".into()));
        }

        match self.service.get_post(post_id).await {
            Ok(post) => {
                let mut state = self.state.lock().await;
                let revision = state.next_revision();
                state.details.insert(post.id.clone(), CachedDetail { post: post.clone(), revision });
                Ok(post)
            }
            Err(source) => {
                tracing::warn!(post_id, error = %source, "post fetch failed");
                Err(Error::PostFetchFailed { post_id: post_id.to_string(), source })
            }
        }
    }

    /// Cached detail copy of a post, if one was fetched.
    pub async fn cached_post(&self, post_id: &str) -> Option<Post> {
        self.state.lock().await.details.get(post_id).map(|detail| detail.post.clone())
    }

    async fn start_first_page(&self, descriptor: &QueryDescriptor, clear: bool) -> Result<PageFetch, Error> {
        let (key, epoch) = {
            let mut state = self.state.lock().await;
            let entry = state.entry_mut(descriptor);

            if entry.fetch_state == FetchState::Fetching {
                tracing::debug!(key = %entry.key, "fetch already in flight, skipping first page");
                return Ok(PageFetch::AlreadyFetching);
            }
            if clear {
                entry.pages.clear();
            }
            (entry.key.clone(), entry.begin_fetch())
        };

        tracing::debug!(key = %key, refetch = clear, "fetching first page");
        let result = self.service.get_posts_paginated(descriptor, None).await;
        self.complete_fetch(&key, epoch, result, Merge::Replace).await
    }

    async fn complete_fetch(
        &self, key: &QueryKey, epoch: u64, result: Result<Page, ServiceError>, merge: Merge,
    ) -> Result<PageFetch, Error> {
        let mut state = self.state.lock().await;
        let revision = match (&result, merge) {
            (Ok(_), Merge::Replace) => Some(state.next_revision()),
            _ => None,
        };
        let Some(entry) = state.entries.get_mut(key).filter(|entry| entry.epoch == epoch) else {
            tracing::debug!(key = %key, "entry discarded during fetch, dropping result");
            return Ok(PageFetch::Discarded);
        };

        match result {
            Ok(page) => {
                match merge {
                    Merge::Replace => {
                        entry.pages = vec![page.clone()];
                        entry.stale = false;
                    }
                    Merge::Append => entry.pages.push(page.clone()),
                }
                if let Some(revision) = revision {
                    entry.revision = revision;
                }
                entry.fetch_state = FetchState::Idle;
                entry.last_error = None;
                entry.has_fetched = true;
                tracing::debug!(
                    key = %key,
                    posts = page.posts.len(),
                    pages = entry.pages.len(),
                    has_next = page.next_cursor.is_some(),
                    "merged page"
                );
                Ok(PageFetch::Page(page))
            }
            Err(source) => {
                let err = Error::FetchFailed { key: key.clone(), source };
                entry.fetch_state = FetchState::Error;
                entry.last_error = Some(err.clone());
                tracing::warn!(key = %key, error = %err, "page fetch failed, keeping cached pages");
                Err(err)
            }
        }
    }
}
