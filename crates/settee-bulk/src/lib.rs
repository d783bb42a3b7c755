//! Bulk document helpers.
//!
//! Long-running maintenance jobs touch thousands of documents. These
//! helpers work in fixed-size chunks, retry transport failures with a fixed
//! delay, and never swallow a failed write.
//!
//! - [`get_docs`] / [`iter_docs`] / [`iter_docs_with_retry`]: keyed fetches
//! - [`iter_bulk_delete`] and friends: fetch-then-tombstone in chunks
//! - [`soft_delete_docs`]: mark documents deleted by renaming their type
//! - [`apply_update`]: read-modify-write that retries on conflicts
//! - [`design_docs`] / [`view_names`]: list design documents and views

pub mod delete;
pub mod design;
pub mod error;
pub mod fetch;
pub mod retry;
pub mod update;

pub use delete::{
    iter_bulk_delete, iter_bulk_delete_with_callback,
    iter_bulk_delete_with_doc_type_verification, safe_delete, soft_delete_docs,
    BulkDeleteOptions, DocOrId, DELETED_SUFFIX, SOFT_DELETE_CHUNK_SIZE,
};
pub use design::{design_docs, view_names, DesignDoc};
pub use error::{BulkError, BulkResult};
pub use fetch::{
    get_docs, iter_docs, iter_docs_with_retry, wrapped_docs, DocIter, DocPass,
    DEFAULT_CHUNK_SIZE,
};
pub use retry::RetryPolicy;
pub use update::{apply_update, DEFAULT_MAX_TRIES};
