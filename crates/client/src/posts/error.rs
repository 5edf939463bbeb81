//! Posts API client error types.

use std::sync::Arc;

use murmur_core::ServiceError;

/// Errors from the posts API client.
#[derive(Debug, thiserror::Error)]
pub enum PostsApiError {
    /// Client configuration is unusable (bad base URL, TLS setup).
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Request parameters failed validation before sending.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Session missing or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PostsApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PostsApiError::Timeout
        } else if err.is_decode() {
            PostsApiError::Parse(err.to_string())
        } else {
            PostsApiError::Network(Arc::new(err))
        }
    }
}

impl From<PostsApiError> for ServiceError {
    fn from(err: PostsApiError) -> Self {
        match err {
            PostsApiError::Unauthorized => ServiceError::Unauthorized,
            PostsApiError::NotFound(what) => ServiceError::NotFound(what),
            PostsApiError::RateLimited => ServiceError::RateLimited,
            PostsApiError::HttpError { status } => ServiceError::Http { status },
            PostsApiError::Timeout => ServiceError::Timeout,
            PostsApiError::Parse(msg) => ServiceError::Parse(msg),
            PostsApiError::Network(e) => ServiceError::Network(e.to_string()),
            PostsApiError::InvalidConfig(msg) | PostsApiError::InvalidRequest(msg) => ServiceError::InvalidRequest(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostsApiError::HttpError { status: 502 };
        assert!(err.to_string().contains("502"));

        let err = PostsApiError::InvalidRequest("limit".to_string());
        assert!(err.to_string().contains("invalid request"));
    }

    #[test]
    fn test_into_service_error() {
        assert_eq!(ServiceError::from(PostsApiError::RateLimited), ServiceError::RateLimited);
        assert_eq!(ServiceError::from(PostsApiError::HttpError { status: 500 }), ServiceError::Http { status: 500 });
        assert_eq!(
            ServiceError::from(PostsApiError::NotFound("post p1".into())),
            ServiceError::NotFound("post p1".into())
        );
    }

    #[test]
    fn test_validation_failure_is_not_a_transport_error() {
        let err = ServiceError::from(PostsApiError::InvalidRequest("user id cannot be empty".into()));
        assert_eq!(err, ServiceError::InvalidRequest("user id cannot be empty".into()));
        assert!(!err.to_string().contains("network"));
    }
}
