//! Document storage interface for settee.
//!
//! The database itself is an external service. This crate defines the
//! surface the rest of settee needs from it, plus an in-memory backend
//! used for tests and embedding.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store with revisions,
//!   all-or-nothing batches, map-function views and fault injection
//!
//! # Design Rules
//!
//! 1. An all-or-nothing bulk write either applies every document or none.
//! 2. Every successful write produces a new revision; a stale revision is a
//!    conflict.
//! 3. Deletes are tombstones: the document stays addressable by revision
//!    but is no longer returned by reads.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;
pub mod types;
pub mod view;

pub use config::{StoreConfig, DEFAULT_QUORUM_COUNT};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
pub use types::{ReadOptions, WriteMode, WriteOptions, WriteResult};
pub use view::{collate, ViewRow};
