//! Transactional bulk-write buffer.
//!
//! A [`BulkWriteBuffer`] collects saves and deletes of documents and turns
//! them into one all-or-nothing bulk write per collection. Scopes nest: a
//! call chain can share one buffer and only the outermost scope commits,
//! and only if nothing inside it failed.
//!
//! ```ignore
//! let mut buffer = BulkWriteBuffer::new(store);
//! buffer.scope(|tx| {
//!     for doc in docs {
//!         tx.save(doc);
//!     }
//!     save_related(tx)
//! })?;
//! ```

pub mod buffer;
pub mod error;
pub mod invalidate;

pub use buffer::{BulkWriteBuffer, CommitSummary, ScopeExit};
pub use error::{TxnError, TxnResult};
pub use invalidate::{CacheInvalidator, NoOpInvalidator};
