//! Client code for murmur.
//!
//! This crate provides the HTTP implementation of the posts service the feed
//! cache consumes, including the wire format and viewer-like derivation.

pub mod posts;

pub use posts::{HttpPostsService, PostsApiError, PostsConfig, PostsQuery};
