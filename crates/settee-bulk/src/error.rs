use settee_store::{StoreError, WriteResult};
use settee_types::{Collection, DocId, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// A fetched document is not of the type the caller asked to process.
    #[error("expected doc type {expected}, got {}", .actual.as_deref().unwrap_or("none"))]
    DocTypeMismatch {
        expected: String,
        actual: Option<String>,
    },

    /// Some documents of a non-atomic bulk write failed.
    #[error("{} document(s) failed to write to {collection}", .failures.len())]
    WriteFailures {
        collection: Collection,
        failures: Vec<WriteResult>,
    },

    #[error("document update conflict on {id}: max retries ({attempts}) reached")]
    ConflictRetriesExhausted { id: DocId, attempts: u32 },
}

pub type BulkResult<T> = Result<T, BulkError>;

/// Turn per-document failures of a non-atomic write into an error.
pub(crate) fn check_results(collection: &Collection, results: Vec<WriteResult>) -> BulkResult<()> {
    let failures: Vec<WriteResult> = results.into_iter().filter(|r| !r.is_ok()).collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(BulkError::WriteFailures {
            collection: collection.clone(),
            failures,
        })
    }
}
