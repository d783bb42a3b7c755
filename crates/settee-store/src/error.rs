use settee_types::{Collection, DocId, TypeError};

use crate::types::WriteResult;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested document does not exist (or is a tombstone).
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: DocId },

    /// The document's revision is stale.
    #[error("document update conflict: {id}")]
    Conflict { id: DocId },

    /// An all-or-nothing batch could not be applied in full.
    #[error("bulk write to {collection} rejected: {} document(s) failed", .failures.len())]
    BatchRejected {
        collection: Collection,
        failures: Vec<WriteResult>,
    },

    /// The database could not be reached or the request failed in transit.
    #[error("transport error: {0}")]
    Transport(String),

    /// No view with this name exists in the collection.
    #[error("unknown view {view} in {collection}")]
    UnknownView { collection: Collection, view: String },

    /// No extra database is configured under this name.
    #[error("no database configured for {0:?}")]
    UnknownDatabase(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Transport("reset".into()).is_transient());
        assert!(!StoreError::Conflict { id: "a".into() }.is_transient());
        assert!(!StoreError::Config("bad".into()).is_transient());
    }

    #[test]
    fn batch_rejected_message_counts_failures() {
        let err = StoreError::BatchRejected {
            collection: "db".into(),
            failures: vec![WriteResult::failed("a".into(), "conflict")],
        };
        assert_eq!(err.to_string(), "bulk write to db rejected: 1 document(s) failed");
    }
}
