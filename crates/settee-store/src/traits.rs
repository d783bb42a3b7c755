use serde_json::Value;
use settee_types::{Collection, DocId, Document};

use crate::error::{StoreError, StoreResult};
use crate::types::{ReadOptions, WriteMode, WriteOptions, WriteResult};
use crate::view::ViewRow;

/// Document database collaborator.
///
/// All implementations must satisfy these invariants:
/// - `bulk_save` with [`WriteMode::AllOrNothing`] applies every document or
///   returns [`StoreError::BatchRejected`] having applied none.
/// - `bulk_save` with [`WriteMode::NonAtomic`] reports per-document
///   outcomes and only fails as a whole on transport errors.
/// - Reads never return tombstoned documents.
/// - Returned documents carry their current `_rev` and their collection.
pub trait DocumentStore: Send + Sync {
    /// Base URI of a collection, used to key caches.
    fn uri(&self, collection: &Collection) -> String;

    /// Read one document. `Ok(None)` if missing or deleted.
    fn get(
        &self,
        collection: &Collection,
        id: &DocId,
        options: &ReadOptions,
    ) -> StoreResult<Option<Document>>;

    /// Keyed multi-get: the subset of `ids` that exist, in request order.
    fn get_many(&self, collection: &Collection, ids: &[DocId]) -> StoreResult<Vec<Document>>;

    /// Submit a batch of documents (saves and tombstones) in one request.
    fn bulk_save(
        &self,
        collection: &Collection,
        docs: &[Document],
        mode: WriteMode,
    ) -> StoreResult<Vec<WriteResult>>;

    /// Identifiers in `[start, end]`, in ascending order, excluding tombstones.
    fn list_ids(&self, collection: &Collection, start: &str, end: &str)
        -> StoreResult<Vec<DocId>>;

    /// Query a view (`"design/view"`) with CouchDB-style parameters.
    fn view(&self, collection: &Collection, view: &str, params: &Value)
        -> StoreResult<Vec<ViewRow>>;

    /// Save a single document, surfacing a stale revision as
    /// [`StoreError::Conflict`].
    fn save(&self, doc: &Document, _options: &WriteOptions) -> StoreResult<WriteResult> {
        let mut results =
            self.bulk_save(doc.collection(), std::slice::from_ref(doc), WriteMode::NonAtomic)?;
        let result = results
            .pop()
            .ok_or_else(|| StoreError::Transport("empty bulk response".into()))?;
        match result.error.as_deref() {
            None => Ok(result),
            Some("conflict") => Err(StoreError::Conflict { id: result.id }),
            Some(other) => Err(StoreError::Transport(other.to_string())),
        }
    }

    /// Tombstone a document by identifier.
    fn delete(
        &self,
        collection: &Collection,
        id: &DocId,
        options: &WriteOptions,
    ) -> StoreResult<()> {
        let mut doc = self
            .get(collection, id, &ReadOptions::default())?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.clone(),
                id: id.clone(),
            })?;
        doc.mark_deleted();
        self.save(&doc, options).map(|_| ())
    }

    /// Tombstone many documents in one non-atomic request.
    fn bulk_delete(
        &self,
        collection: &Collection,
        docs: &[Document],
    ) -> StoreResult<Vec<WriteResult>> {
        let tombstones: Vec<Document> = docs
            .iter()
            .cloned()
            .map(|mut d| {
                d.mark_deleted();
                d
            })
            .collect();
        self.bulk_save(collection, &tombstones, WriteMode::NonAtomic)
    }
}
