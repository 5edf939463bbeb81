//! Core types and shared functionality for murmur.
//!
//! This crate provides:
//! - The post/page data model and query descriptors
//! - The paginated feed cache with per-query-key entries
//! - The optimistic like/unlike mutator with rollback
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod like;
pub mod model;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheEntry, FeedCacheStore, FeedView, FetchState, PageFetch, QueryKey};
pub use config::{AppConfig, ConfigError};
pub use error::{Error, ServiceError};
pub use like::{LikeMutator, LikeOutcome};
pub use model::{Author, Cursor, LikeIntent, Page, Post, QueryDescriptor};
pub use service::PostsService;
