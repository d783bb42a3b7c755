//! Helpers for applications built on a CouchDB-style document database.
//!
//! This is the main entry point. [`Settee`] wires a store, its
//! configuration, a view cache and a cache invalidator together; the
//! individual crates are re-exported for direct use.

pub mod client;
pub mod error;

pub use client::Settee;
pub use error::{SetteeError, SetteeResult};

pub use settee_bulk as bulk;
pub use settee_cache as cache;
pub use settee_queue as queue;
pub use settee_util as util;
pub use settee_web as web;

// Re-export key types
pub use settee_store::{
    DocumentStore, InMemoryDocumentStore, StoreConfig, ViewRow, WriteMode, WriteResult,
};
pub use settee_txn::{BulkWriteBuffer, CacheInvalidator, CommitSummary, NoOpInvalidator, ScopeExit};
pub use settee_types::{ClearCaches, Collection, DocId, Document, FromDocument, Record};
