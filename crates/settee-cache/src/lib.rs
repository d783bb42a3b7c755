//! Time-bounded caching of view results.
//!
//! View queries are cached under a key derived from the collection URI,
//! the view name and a hash of the query parameters. Entries expire after a
//! TTL and are never invalidated by writes.

pub mod backend;
pub mod error;
pub mod view;

pub use backend::{CacheBackend, InMemoryCache};
pub use error::{CacheError, CacheResult};
pub use view::{cached_view, view_cache_key, DEFAULT_VIEW_TTL};
