//! Unified error types for murmur.
//!
//! `ServiceError` describes what went wrong talking to the posts service.
//! `Error` is what the cache and the like mutator hand back to callers; none of
//! these are fatal and each one is local to a single query key or mutation.

use crate::cache::QueryKey;

/// Failures reported by a [`PostsService`](crate::PostsService) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Connection-level failure (DNS, refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The transport gave up waiting.
    #[error("request timeout")]
    Timeout,

    /// Non-success HTTP status not covered by a more specific variant.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// Session missing or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Too many requests.
    #[error("rate limited")]
    RateLimited,

    /// The requested post does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The request was rejected before it was sent (bad parameters or client setup).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Unified error type for the feed cache and like mutator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A page fetch failed. Cached pages for the key are left untouched.
    #[error("FETCH_FAILED: {key}: {source}")]
    FetchFailed { key: QueryKey, source: ServiceError },

    /// Fetching a single post failed.
    #[error("FETCH_FAILED: post {post_id}: {source}")]
    PostFetchFailed { post_id: String, source: ServiceError },

    /// A like/unlike was rejected. The optimistic change has been rolled back.
    #[error("MUTATION_FAILED: post {post_id}: {source}")]
    MutationFailed { post_id: String, source: ServiceError },

    /// The post is not present in any cached entry.
    #[error("POST_NOT_CACHED: {0}")]
    PostNotCached(String),

    /// Invalid input parameters (e.g., empty post id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl Error {
    /// The underlying service failure, if this error came from the posts service.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Error::FetchFailed { source, .. }
            | Error::PostFetchFailed { source, .. }
            | Error::MutationFailed { source, .. } => Some(source),
            Error::PostNotCached(_) | Error::InvalidInput(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryDescriptor;

    #[test]
    fn test_error_display() {
        let err = Error::FetchFailed { key: QueryKey::build(&QueryDescriptor::Timeline), source: ServiceError::Timeout };
        assert!(err.to_string().contains("FETCH_FAILED"));
        assert!(err.to_string().contains("timeout"));

        let err = Error::MutationFailed { post_id: "p1".into(), source: ServiceError::Http { status: 500 } };
        assert!(err.to_string().contains("MUTATION_FAILED"));
        assert!(err.to_string().contains("p1"));
    }

    #[test]
    fn test_service_error_accessor() {
        let err = Error::MutationFailed { post_id: "p1".into(), source: ServiceError::RateLimited };
        assert_eq!(err.service_error(), Some(&ServiceError::RateLimited));
        assert!(Error::PostNotCached("p1".into()).service_error().is_none());
    }
}
