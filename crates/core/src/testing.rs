//! Scripted posts service for unit tests.
//!
//! Responses are queued per (query key, cursor) and per like call. A gated
//! response waits until its [`Gate`] is opened, which lets tests hold a request
//! in flight while they race other operations against it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use crate::cache::QueryKey;
use crate::error::ServiceError;
use crate::model::{Author, Cursor, LikeIntent, Page, Post, QueryDescriptor};
use crate::service::PostsService;

pub(crate) fn post(id: &str, like_count: u64) -> Post {
    post_by(id, "author-1", like_count)
}

pub(crate) fn post_by(id: &str, author_id: &str, like_count: u64) -> Post {
    Post {
        id: id.to_string(),
        author_id: author_id.to_string(),
        author: Author { id: author_id.to_string(), name: format!("{author_id} name"), image: None },
        text: format!("text of {id}"),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        like_count,
        viewer_has_liked: false,
        like_sample_user_id: None,
    }
}

/// Holds one scripted response until opened.
#[derive(Clone)]
pub(crate) struct Gate(Arc<Semaphore>);

impl Gate {
    fn closed() -> Self {
        Self(Arc::new(Semaphore::new(0)))
    }

    pub(crate) fn open(&self) {
        self.0.add_permits(1);
    }

    async fn pass(&self) {
        self.0.acquire().await.unwrap().forget();
    }
}

type Scripted<T> = (Result<T, ServiceError>, Option<Gate>);

#[derive(Default)]
pub(crate) struct ScriptedService {
    pages: Mutex<HashMap<(QueryKey, Option<String>), VecDeque<Scripted<Page>>>>,
    posts: Mutex<HashMap<String, Post>>,
    likes: Mutex<VecDeque<Scripted<()>>>,
    cursors_seen: Mutex<Vec<Option<String>>>,
    page_calls: AtomicUsize,
    like_calls: AtomicUsize,
}

impl ScriptedService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script_page(
        &self, descriptor: &QueryDescriptor, cursor: Option<&str>, result: Result<Page, ServiceError>,
    ) {
        self.push_page(descriptor, cursor, result, None);
    }

    pub(crate) fn script_page_gated(
        &self, descriptor: &QueryDescriptor, cursor: Option<&str>, result: Result<Page, ServiceError>,
    ) -> Gate {
        let gate = Gate::closed();
        self.push_page(descriptor, cursor, result, Some(gate.clone()));
        gate
    }

    pub(crate) fn script_post(&self, post: Post) {
        self.posts.lock().unwrap().insert(post.id.clone(), post);
    }

    pub(crate) fn script_like(&self, result: Result<(), ServiceError>) {
        self.likes.lock().unwrap().push_back((result, None));
    }

    pub(crate) fn script_like_gated(&self, result: Result<(), ServiceError>) -> Gate {
        let gate = Gate::closed();
        self.likes.lock().unwrap().push_back((result, Some(gate.clone())));
        gate
    }

    pub(crate) fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn like_calls(&self) -> usize {
        self.like_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cursors_seen(&self) -> Vec<Option<String>> {
        self.cursors_seen.lock().unwrap().clone()
    }

    pub(crate) async fn wait_for_page_calls(&self, n: usize) {
        while self.page_calls() < n {
            tokio::task::yield_now().await;
        }
    }

    pub(crate) async fn wait_for_like_calls(&self, n: usize) {
        while self.like_calls() < n {
            tokio::task::yield_now().await;
        }
    }

    fn push_page(
        &self, descriptor: &QueryDescriptor, cursor: Option<&str>, result: Result<Page, ServiceError>,
        gate: Option<Gate>,
    ) {
        let key = (QueryKey::build(descriptor), cursor.map(str::to_string));
        self.pages.lock().unwrap().entry(key).or_default().push_back((result, gate));
    }
}

#[async_trait]
impl PostsService for ScriptedService {
    async fn get_posts_paginated(
        &self, descriptor: &QueryDescriptor, cursor: Option<&Cursor>,
    ) -> Result<Page, ServiceError> {
        let cursor = cursor.map(|c| c.as_str().to_string());
        self.cursors_seen.lock().unwrap().push(cursor.clone());
        let scripted = self
            .pages
            .lock()
            .unwrap()
            .get_mut(&(QueryKey::build(descriptor), cursor))
            .and_then(VecDeque::pop_front);
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        let (result, gate) = scripted.unwrap_or_else(|| (Err(ServiceError::NotFound("unscripted page".into())), None));
        if let Some(gate) = gate {
            gate.pass().await;
        }
        result
    }

    async fn get_post(&self, post_id: &str) -> Result<Post, ServiceError> {
        self.posts
            .lock()
            .unwrap()
            .get(post_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(post_id.to_string()))
    }

    async fn set_like(&self, _post_id: &str, _intent: LikeIntent) -> Result<(), ServiceError> {
        let scripted = self.likes.lock().unwrap().pop_front();
        self.like_calls.fetch_add(1, Ordering::SeqCst);

        let (result, gate) = scripted.unwrap_or_else(|| (Err(ServiceError::Http { status: 500 }), None));
        if let Some(gate) = gate {
            gate.pass().await;
        }
        result
    }
}
