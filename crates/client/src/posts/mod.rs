//! HTTP client for the posts API.
//!
//! Implements [`PostsService`] on top of reqwest.
//!
//! ### Endpoints
//!
//! - `GET {base}/posts?kind=..&userId=..&text=..&cursor=..&limit=..` returns
//!   `{ "posts": [...], "nextCursor": string | null }`
//! - `GET {base}/posts/{id}` returns a single post
//! - `POST {base}/posts/{id}/like` with `{ "intent": "like" | "unlike" }`
//!
//! ### Status mapping
//!
//! 401/403 are `Unauthorized`, 404 is `NotFound`, 429 is `RateLimited`, any
//! other non-2xx is `HttpError`. Timeouts come from the reqwest client and are
//! the only timeout policy applied.

pub mod error;
pub mod request;
pub mod response;

pub use error::PostsApiError;
pub use request::{LikeRequest, PostsQuery};
pub use response::{PostRecord, PostsPageResponse};

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use std::time::{Duration, Instant};
use url::Url;

use murmur_core::{AppConfig, Cursor, LikeIntent, Page, Post, PostsService, QueryDescriptor, ServiceError};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "murmur/0.1";

/// Posts API client configuration.
#[derive(Debug, Clone)]
pub struct PostsConfig {
    /// Base URL, e.g. `https://murmur.example/api`.
    pub base_url: String,
    /// Signed-in viewer, used to derive `viewer_has_liked`.
    pub viewer_id: Option<String>,
    /// Posts per page (default: 10).
    pub page_size: u32,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: murmur/0.x).
    pub user_agent: String,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            viewer_id: None,
            page_size: 10,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for PostsConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            viewer_id: config.viewer_id.clone(),
            page_size: config.page_size,
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Posts API client.
#[derive(Debug, Clone)]
pub struct HttpPostsService {
    http: reqwest::Client,
    base_url: Url,
    config: PostsConfig,
}

impl HttpPostsService {
    /// Create a new client with the given configuration.
    pub fn new(config: PostsConfig) -> Result<Self, PostsApiError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| PostsApiError::InvalidConfig(format!("base url {:?}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(PostsApiError::InvalidConfig(format!("base url {:?} cannot be a base", config.base_url)));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .build()
            .map_err(|e| PostsApiError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url, config })
    }

    pub fn config(&self) -> &PostsConfig {
        &self.config
    }

    /// Fetch one page of posts.
    pub async fn fetch_page(
        &self, descriptor: &QueryDescriptor, cursor: Option<&Cursor>,
    ) -> Result<Page, PostsApiError> {
        let query = PostsQuery::new(descriptor, cursor, self.config.page_size);
        query.validate()?;

        let start = Instant::now();
        let url = self.endpoint(&["posts"])?;
        tracing::debug!(kind = query.kind, cursor = ?query.cursor, "fetching posts page");

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?;
        check_status(response.status(), "posts")?;

        let bytes = response.bytes().await?;
        let raw: PostsPageResponse = serde_json::from_slice(&bytes).map_err(|e| PostsApiError::Parse(e.to_string()))?;

        tracing::debug!(
            kind = query.kind,
            posts = raw.posts.len(),
            has_more = raw.has_more(),
            "page fetched in {:?}",
            start.elapsed()
        );

        Ok(raw.into_page(self.config.viewer_id.as_deref()))
    }

    /// Fetch a single post.
    pub async fn fetch_post(&self, post_id: &str) -> Result<Post, PostsApiError> {
        if post_id.is_empty() {
            return Err(PostsApiError::InvalidRequest("post id cannot be empty".to_string()));
        }

        let url = self.endpoint(&["posts", post_id])?;
        let response = self.http.get(url).header(header::ACCEPT, "application/json").send().await?;
        check_status(response.status(), &format!("post {post_id}"))?;

        let bytes = response.bytes().await?;
        let raw: PostRecord = serde_json::from_slice(&bytes).map_err(|e| PostsApiError::Parse(e.to_string()))?;
        Ok(raw.into_post(self.config.viewer_id.as_deref()))
    }

    /// Send a like intent.
    pub async fn send_like(&self, post_id: &str, intent: LikeIntent) -> Result<(), PostsApiError> {
        if post_id.is_empty() {
            return Err(PostsApiError::InvalidRequest("post id cannot be empty".to_string()));
        }

        let url = self.endpoint(&["posts", post_id, "like"])?;
        tracing::debug!(post_id, %intent, "sending like intent");

        let response = self.http.post(url).json(&LikeRequest { intent }).send().await?;
        check_status(response.status(), &format!("post {post_id}"))
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PostsApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PostsApiError::InvalidConfig("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Map a response status to an error, if it is not a success.
fn check_status(status: StatusCode, resource: &str) -> Result<(), PostsApiError> {
    if status.is_success() {
        return Ok(());
    }

    if status == 401 || status == 403 {
        return Err(PostsApiError::Unauthorized);
    }

    if status == 404 {
        return Err(PostsApiError::NotFound(resource.to_string()));
    }

    if status == 429 {
        return Err(PostsApiError::RateLimited);
    }

    Err(PostsApiError::HttpError { status: status.as_u16() })
}

#[async_trait]
impl PostsService for HttpPostsService {
    async fn get_posts_paginated(
        &self, descriptor: &QueryDescriptor, cursor: Option<&Cursor>,
    ) -> Result<Page, ServiceError> {
        self.fetch_page(descriptor, cursor).await.map_err(ServiceError::from)
    }

    async fn get_post(&self, post_id: &str) -> Result<Post, ServiceError> {
        self.fetch_post(post_id).await.map_err(ServiceError::from)
    }

    async fn set_like(&self, post_id: &str, intent: LikeIntent) -> Result<(), ServiceError> {
        self.send_like(post_id, intent).await.map_err(ServiceError::from)
    }
}
