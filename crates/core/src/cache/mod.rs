//! In-memory paginated feed cache.
//!
//! One entry per query key, each holding the pages fetched so far in order.
//! It supports:
//!
//! - Stable keys derived from the closed `QueryDescriptor` enum
//! - First-page, next-page and refetch operations with a single in-flight fetch per entry
//! - Stale-but-available pages when a fetch fails
//! - Invalidation and discarding of unreachable keys

pub mod entry;
pub mod key;
pub mod store;
pub mod view;

pub use crate::Error;

pub use entry::{CacheEntry, FetchState};
pub use key::QueryKey;
pub use store::{FeedCacheStore, PageFetch};
pub use view::FeedView;
