//! Command dispatch for the `murmur` binary.

use std::sync::Arc;

use clap::Subcommand;
use serde_json::{Value, json};
use tracing::{debug, warn};

use murmur_client::{HttpPostsService, PostsConfig};
use murmur_core::{AppConfig, FeedCacheStore, FeedView, LikeIntent, PageFetch, QueryDescriptor};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the global timeline
    Timeline {
        /// Pages to load, starting from the first
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=50))]
        pages: u32,
    },
    /// Show one user's posts
    User {
        user_id: String,
        /// Pages to load, starting from the first
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=50))]
        pages: u32,
    },
    /// Search posts by text
    Search {
        text: String,
        /// Pages to load, starting from the first
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=50))]
        pages: u32,
    },
    /// Show a single post
    Post { post_id: String },
    /// Like a post
    Like { post_id: String },
    /// Remove a like from a post
    Unlike { post_id: String },
}

/// A configured cache and the settings it was built from.
pub struct App {
    config: AppConfig,
    store: FeedCacheStore,
}

impl App {
    /// Build the HTTP posts service and the cache on top of it.
    pub fn new(config: AppConfig) -> Result<Self, CliError> {
        let service = HttpPostsService::new(PostsConfig::from(&config))?;
        let store = FeedCacheStore::new(Arc::new(service));
        Ok(Self { config, store })
    }

    pub async fn run(&self, command: Command) -> Result<Value, CliError> {
        match command {
            Command::Timeline { pages } => self.feed(QueryDescriptor::Timeline, pages).await,
            Command::User { user_id, pages } => self.feed(QueryDescriptor::user(user_id), pages).await,
            Command::Search { text, pages } => self.feed(QueryDescriptor::search(text), pages).await,
            Command::Post { post_id } => Ok(serde_json::to_value(self.store.fetch_post(&post_id).await?)?),
            Command::Like { post_id } => self.like(&post_id, LikeIntent::Like).await,
            Command::Unlike { post_id } => self.like(&post_id, LikeIntent::Unlike).await,
        }
    }

    /// Load the first page, then up to `pages - 1` more.
    ///
    /// A failed later page leaves the pages already loaded in place and is
    /// reported through the view's error field.
    async fn feed(&self, descriptor: QueryDescriptor, pages: u32) -> Result<Value, CliError> {
        self.store.fetch_first_page(&descriptor).await?;

        for _ in 1..pages {
            match self.store.fetch_next_page(&descriptor).await {
                Ok(PageFetch::Page(page)) => debug!(posts = page.posts.len(), "Loaded next page"),
                Ok(PageFetch::NoMorePages | PageFetch::AlreadyFetching | PageFetch::Discarded) => break,
                Err(e) => {
                    warn!(error = %e, "Stopped paging");
                    break;
                }
            }
        }

        let view: FeedView = self.store.view(&descriptor).await;
        Ok(serde_json::to_value(view)?)
    }

    /// Load the post so the optimistic update has an occurrence, then send the intent.
    async fn like(&self, post_id: &str, intent: LikeIntent) -> Result<Value, CliError> {
        self.config.require_viewer_id()?;
        self.store.fetch_post(post_id).await?;

        let outcome = self.store.like_mutator().like(post_id, intent).await?;
        let post = self.store.cached_post(post_id).await;

        Ok(json!({ "outcome": outcome, "post": post }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post_json(id: &str, likes: u64) -> Value {
        json!({
            "id": id,
            "authorId": "u1",
            "author": { "id": "u1", "name": "Ada", "image": null },
            "text": format!("text {id}"),
            "createdAt": "2024-03-01T09:00:00Z",
            "likedBy": [],
            "_count": { "likedBy": likes }
        })
    }

    fn app_for(server: &MockServer, viewer_id: Option<&str>) -> App {
        let config = AppConfig {
            api_base_url: format!("{}/api", server.uri()),
            viewer_id: viewer_id.map(String::from),
            ..Default::default()
        };
        App::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_timeline_loads_requested_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("cursor", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [post_json("p3", 0)],
                "nextCursor": null
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "posts": [post_json("p1", 1), post_json("p2", 2)],
                "nextCursor": "c1"
            })))
            .mount(&server)
            .await;

        let app = app_for(&server, None);
        let view = app.run(Command::Timeline { pages: 5 }).await.unwrap();

        assert_eq!(view["pages"].as_array().unwrap().len(), 2);
        assert_eq!(view["has_next_page"], json!(false));
        assert_eq!(view["fetch_state"], json!("idle"));
    }

    #[tokio::test]
    async fn test_feed_first_page_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let app = app_for(&server, None);
        let err = app.run(Command::Search { text: "rust".into(), pages: 1 }).await.unwrap_err();
        assert!(matches!(err, CliError::Feed(murmur_core::Error::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_like_requires_viewer() {
        let server = MockServer::start().await;
        let app = app_for(&server, None);
        let err = app.run(Command::Like { post_id: "p1".into() }).await.unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn test_like_updates_loaded_post() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post_json("p1", 3)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/posts/p1/like"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let app = app_for(&server, Some("viewer"));
        let result = app.run(Command::Like { post_id: "p1".into() }).await.unwrap();

        assert_eq!(result["outcome"]["intent"], json!("like"));
        assert_eq!(result["outcome"]["occurrences_mutated"], json!(1));
        assert_eq!(result["post"]["like_count"], json!(4));
        assert_eq!(result["post"]["viewer_has_liked"], json!(true));
    }
}
