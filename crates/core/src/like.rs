//! Optimistic like/unlike with rollback.
//!
//! A like is applied to every cached occurrence of the post before the request
//! is sent. Each call gets a generation number per post and records the
//! pre-mutation state of the occurrences it changed, tagged with the revision
//! of the data they were found in. A restore never touches data merged after
//! the snapshot was taken. When a call fails, the
//! closest later generation for the same post decides what happens to that
//! snapshot:
//!
//! - none: the snapshot is written back to the cache
//! - still in flight: the snapshot is handed to it, since its own snapshot was
//!   taken from this call's optimistic value
//! - already succeeded: the snapshot is dropped, the newer value stands

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::Error;
use crate::cache::{FeedCacheStore, QueryKey};
use crate::cache::store::FeedState;
use crate::model::{LikeIntent, LikeState};

/// Where an occurrence of a post lives, and which revision of the data it was seen in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Location {
    Feed { key: QueryKey, epoch: u64, revision: u64, page: usize, slot: usize },
    Detail { revision: u64 },
}

type Snapshot = HashMap<Location, LikeState>;

#[derive(Debug, Default)]
struct PostMutations {
    pending: BTreeMap<u64, Snapshot>,
    succeeded: BTreeSet<u64>,
}

/// In-flight like mutations, tracked per post.
#[derive(Debug, Default)]
pub(crate) struct LikeLedger {
    next_generation: u64,
    posts: HashMap<String, PostMutations>,
}

enum Settlement {
    Restore(Snapshot),
    HandOver,
    Superseded,
}

impl LikeLedger {
    fn begin(&mut self, post_id: &str, snapshot: Snapshot) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.posts.entry(post_id.to_string()).or_default().pending.insert(generation, snapshot);
        generation
    }

    fn succeed(&mut self, post_id: &str, generation: u64) {
        if let Some(record) = self.posts.get_mut(post_id)
            && record.pending.remove(&generation).is_some()
        {
            record.succeeded.insert(generation);
            self.prune(post_id);
        }
    }

    fn fail(&mut self, post_id: &str, generation: u64) -> Settlement {
        let Some(record) = self.posts.get_mut(post_id) else {
            return Settlement::Superseded;
        };
        let Some(snapshot) = record.pending.remove(&generation) else {
            return Settlement::Superseded;
        };

        let next_pending = record.pending.range(generation + 1..).next().map(|(g, _)| *g);
        let next_succeeded = record.succeeded.range(generation + 1..).next().copied();

        let settlement = match (next_pending, next_succeeded) {
            (Some(pending), succeeded) if succeeded.is_none_or(|s| pending < s) => {
                if let Some(newer) = record.pending.get_mut(&pending) {
                    newer.extend(snapshot);
                }
                Settlement::HandOver
            }
            (_, Some(_)) => Settlement::Superseded,
            _ => Settlement::Restore(snapshot),
        };

        self.prune(post_id);
        settlement
    }

    fn prune(&mut self, post_id: &str) {
        if self.posts.get(post_id).is_some_and(|record| record.pending.is_empty()) {
            self.posts.remove(post_id);
        }
    }

    #[cfg(test)]
    fn in_flight(&self, post_id: &str) -> usize {
        self.posts.get(post_id).map_or(0, |record| record.pending.len())
    }
}

impl FeedState {
    /// Apply `intent` to every cached occurrence of `post_id` and return the
    /// prior state of the occurrences that changed.
    fn apply_optimistic(&mut self, post_id: &str, intent: LikeIntent) -> Snapshot {
        let mut snapshot = Snapshot::new();

        for entry in self.entries.values_mut().filter(|entry| entry.contains_post(post_id)) {
            let (epoch, revision) = (entry.epoch, entry.revision);
            for (page_index, page) in entry.pages.iter_mut().enumerate() {
                for (slot, post) in page.posts.iter_mut().enumerate().filter(|(_, post)| post.id == post_id) {
                    let before = post.like_state();
                    if let Some(after) = before.apply(intent) {
                        post.set_like_state(after);
                        let key = entry.key.clone();
                        snapshot.insert(Location::Feed { key, epoch, revision, page: page_index, slot }, before);
                    }
                }
            }
        }

        if let Some(detail) = self.details.get_mut(post_id) {
            let before = detail.post.like_state();
            if let Some(after) = before.apply(intent) {
                detail.post.set_like_state(after);
                snapshot.insert(Location::Detail { revision: detail.revision }, before);
            }
        }

        snapshot
    }

    /// Write a snapshot back.
    ///
    /// Occurrences whose entry was discarded, recreated or refetched since, and
    /// detail copies fetched again since, hold fresher server data and are skipped.
    fn restore(&mut self, post_id: &str, snapshot: Snapshot) -> usize {
        let mut restored = 0;
        for (location, state) in snapshot {
            let post = match location {
                Location::Feed { key, epoch, revision, page, slot } => self
                    .entries
                    .get_mut(&key)
                    .filter(|entry| entry.epoch == epoch && entry.revision == revision)
                    .and_then(|entry| entry.post_at_mut(page, slot)),
                Location::Detail { revision } => self
                    .details
                    .get_mut(post_id)
                    .filter(|detail| detail.revision == revision)
                    .map(|detail| &mut detail.post),
            };
            if let Some(post) = post.filter(|post| post.id == post_id) {
                post.set_like_state(state);
                restored += 1;
            }
        }
        restored
    }

    /// Current like state of the first cached occurrence of `post_id`.
    fn current_like_state(&self, post_id: &str) -> Option<LikeState> {
        if let Some(detail) = self.details.get(post_id) {
            return Some(detail.post.like_state());
        }
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| self.entries.get(key))
            .flat_map(|entry| entry.posts())
            .find(|post| post.id == post_id)
            .map(|post| post.like_state())
    }
}

/// Result of a like/unlike the service accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub post_id: String,
    pub intent: LikeIntent,
    /// Cached occurrences whose state changed (0 for a duplicate intent).
    pub occurrences_mutated: usize,
}

/// Applies like/unlike optimistically to a [`FeedCacheStore`].
#[derive(Clone)]
pub struct LikeMutator {
    store: FeedCacheStore,
}

impl LikeMutator {
    pub fn new(store: FeedCacheStore) -> Self {
        Self { store }
    }

    /// Like or unlike `post_id`.
    ///
    /// The cache is updated before the request is sent. A duplicate intent
    /// (liking an already-liked post) changes nothing locally but is still sent.
    /// On failure the changes owned by this call are rolled back and
    /// `Error::MutationFailed` is returned.
    pub async fn like(&self, post_id: &str, intent: LikeIntent) -> Result<LikeOutcome, Error> {
        if post_id.is_empty() {
            return Err(Error::InvalidInput("post id cannot be empty".into()));
        }

        let (generation, occurrences_mutated) = {
            let mut state = self.store.state.lock().await;
            let snapshot = state.apply_optimistic(post_id, intent);
            let mutated = snapshot.len();
            (state.likes.begin(post_id, snapshot), mutated)
        };
        tracing::debug!(post_id, %intent, generation, occurrences = occurrences_mutated, "applied optimistic like");

        match self.store.service().set_like(post_id, intent).await {
            Ok(()) => {
                self.store.state.lock().await.likes.succeed(post_id, generation);
                tracing::info!(post_id, %intent, generation, "like confirmed");
                Ok(LikeOutcome { post_id: post_id.to_string(), intent, occurrences_mutated })
            }
            Err(source) => {
                let mut state = self.store.state.lock().await;
                match state.likes.fail(post_id, generation) {
                    Settlement::Restore(snapshot) => {
                        let restored = state.restore(post_id, snapshot);
                        tracing::warn!(post_id, %intent, generation, restored, error = %source, "like failed, rolled back");
                    }
                    Settlement::HandOver => {
                        tracing::warn!(post_id, %intent, generation, error = %source, "like failed, newer mutation in flight");
                    }
                    Settlement::Superseded => {
                        tracing::warn!(post_id, %intent, generation, error = %source, "like failed, superseded by newer mutation");
                    }
                }
                Err(Error::MutationFailed { post_id: post_id.to_string(), source })
            }
        }
    }

    /// Send the opposite of the post's cached like state.
    ///
    /// Returns `Error::PostNotCached` if no occurrence of the post is cached.
    pub async fn toggle(&self, post_id: &str) -> Result<LikeOutcome, Error> {
        let current = self.store.state.lock().await.current_like_state(post_id);
        let Some(current) = current else {
            return Err(Error::PostNotCached(post_id.to_string()));
        };
        self.like(post_id, LikeIntent::toggle_for(current.viewer_has_liked)).await
    }
}
