//! Cache key generation for feed queries.

use serde::Serialize;
use serde_json::json;
use std::fmt;

use crate::model::QueryDescriptor;

/// Stable identity of a cache entry, derived from a [`QueryDescriptor`].
///
/// Rendered as a JSON array `["posts", kind, payload]`. The kind is its own
/// element so two variants never collide, whatever their payloads contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QueryKey(String);

impl QueryKey {
    /// Build the key for a descriptor. Pure and total.
    pub fn build(descriptor: &QueryDescriptor) -> Self {
        let payload = match descriptor {
            QueryDescriptor::Timeline => json!({}),
            QueryDescriptor::User { user_id } => json!({ "userId": user_id }),
            QueryDescriptor::Search { text } => json!({ "text": text }),
        };
        Self(json!(["posts", descriptor.kind(), payload]).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&QueryDescriptor> for QueryKey {
    fn from(descriptor: &QueryDescriptor) -> Self {
        Self::build(descriptor)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = QueryKey::build(&QueryDescriptor::user("u1"));
        let key2 = QueryKey::build(&QueryDescriptor::user("u1"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_format() {
        assert_eq!(QueryKey::build(&QueryDescriptor::Timeline).as_str(), r#"["posts","timeline",{}]"#);
        assert_eq!(QueryKey::build(&QueryDescriptor::user("u1")).as_str(), r#"["posts","user",{"userId":"u1"}]"#);
        assert_eq!(QueryKey::build(&QueryDescriptor::search("")).as_str(), r#"["posts","search",{"text":""}]"#);
    }

    #[test]
    fn test_key_different_payload() {
        assert_ne!(
            QueryKey::build(&QueryDescriptor::search("rust")),
            QueryKey::build(&QueryDescriptor::search("rust "))
        );
        assert_ne!(QueryKey::build(&QueryDescriptor::user("a")), QueryKey::build(&QueryDescriptor::user("b")));
    }

    #[test]
    fn test_key_different_kind_same_payload() {
        let descriptors = [
            QueryDescriptor::Timeline,
            QueryDescriptor::user(""),
            QueryDescriptor::search(""),
            QueryDescriptor::user("timeline"),
            QueryDescriptor::search("timeline"),
            QueryDescriptor::user("x"),
            QueryDescriptor::search("x"),
        ];
        for (i, a) in descriptors.iter().enumerate() {
            for b in &descriptors[i + 1..] {
                assert_ne!(QueryKey::build(a), QueryKey::build(b), "{a:?} collided with {b:?}");
            }
        }
    }

    #[test]
    fn test_key_escapes_payload() {
        let tricky = QueryDescriptor::search(r#"a"},{"userId":"b"#);
        let plain = QueryDescriptor::user("b");
        assert_ne!(QueryKey::build(&tricky), QueryKey::build(&plain));
    }
}
