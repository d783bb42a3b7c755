use std::time::Duration;

use settee_store::{DocumentStore, StoreConfig, StoreError, WriteMode};
use settee_types::{Collection, DocId, Document};
use tracing::{debug, info};

use crate::error::{check_results, BulkError, BulkResult};
use crate::fetch::{get_docs, DEFAULT_CHUNK_SIZE};
use crate::retry::RetryPolicy;

/// Appended to a document's type when it is soft-deleted.
pub const DELETED_SUFFIX: &str = "-Deleted";

pub const SOFT_DELETE_CHUNK_SIZE: usize = 50;

/// Tuning for [`iter_bulk_delete`].
#[derive(Clone, Copy, Debug)]
pub struct BulkDeleteOptions {
    pub chunk_size: usize,
    /// Pause between chunks to spare a busy server.
    pub wait_time: Option<Duration>,
    /// Applied to each chunk fetch; deletes themselves are not retried.
    pub retry: RetryPolicy,
}

impl Default for BulkDeleteOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            wait_time: None,
            retry: RetryPolicy::none(),
        }
    }
}

/// Fetch and tombstone `ids` chunk by chunk. Returns the number deleted.
pub fn iter_bulk_delete(
    store: &dyn DocumentStore,
    collection: &Collection,
    ids: &[DocId],
    options: &BulkDeleteOptions,
) -> BulkResult<usize> {
    iter_bulk_delete_with_callback(store, collection, ids, options, |_| Ok(()))
}

/// Like [`iter_bulk_delete`], calling `callback` on each fetched document
/// before its chunk is deleted. A callback error aborts before the chunk
/// is written.
pub fn iter_bulk_delete_with_callback<F>(
    store: &dyn DocumentStore,
    collection: &Collection,
    ids: &[DocId],
    options: &BulkDeleteOptions,
    mut callback: F,
) -> BulkResult<usize>
where
    F: FnMut(&Document) -> BulkResult<()>,
{
    let mut total = 0;
    let mut chunks = ids.chunks(options.chunk_size.max(1)).peekable();
    while let Some(chunk) = chunks.next() {
        let docs = options.retry.run(|| get_docs(store, collection, chunk))?;
        for doc in &docs {
            callback(doc)?;
        }
        if !docs.is_empty() {
            let results = store.bulk_delete(collection, &docs)?;
            check_results(collection, results)?;
            total += docs.len();
            debug!(%collection, deleted = docs.len(), total, "deleted chunk");
        }
        if let (Some(wait), true) = (options.wait_time, chunks.peek().is_some()) {
            std::thread::sleep(wait);
        }
    }
    info!(%collection, requested = ids.len(), deleted = total, "bulk delete finished");
    Ok(total)
}

/// Bulk delete that refuses to touch documents of any type but `doc_type`.
pub fn iter_bulk_delete_with_doc_type_verification(
    store: &dyn DocumentStore,
    collection: &Collection,
    ids: &[DocId],
    doc_type: &str,
    options: &BulkDeleteOptions,
) -> BulkResult<usize> {
    iter_bulk_delete_with_callback(store, collection, ids, options, |doc| {
        if doc.doc_type() == Some(doc_type) {
            Ok(())
        } else {
            Err(BulkError::DocTypeMismatch {
                expected: doc_type.to_string(),
                actual: doc.doc_type().map(str::to_string),
            })
        }
    })
}

/// Mark documents of `doc_type` deleted by renaming their type, leaving
/// them readable. Documents of other types are skipped.
///
/// Returns the number of documents rewritten.
pub fn soft_delete_docs(
    store: &dyn DocumentStore,
    collection: &Collection,
    docs: &[Document],
    doc_type: &str,
) -> BulkResult<usize> {
    let deleted_type = format!("{doc_type}{DELETED_SUFFIX}");
    let mut total = 0;
    for chunk in docs.chunks(SOFT_DELETE_CHUNK_SIZE) {
        let renamed: Vec<Document> = chunk
            .iter()
            .filter(|doc| doc.doc_type() == Some(doc_type))
            .cloned()
            .map(|mut doc| {
                doc.set_doc_type(deleted_type.as_str());
                doc
            })
            .collect();
        if renamed.is_empty() {
            continue;
        }
        let results = store.bulk_save(collection, &renamed, WriteMode::NonAtomic)?;
        check_results(collection, results)?;
        total += renamed.len();
    }
    debug!(%collection, doc_type, soft_deleted = total, "soft delete finished");
    Ok(total)
}

/// A document or just its identifier.
#[derive(Clone, Debug)]
pub enum DocOrId {
    Doc(Document),
    Id(DocId),
}

impl DocOrId {
    pub fn id(&self) -> Option<&DocId> {
        match self {
            DocOrId::Doc(doc) => doc.id(),
            DocOrId::Id(id) => (!id.is_empty()).then_some(id),
        }
    }
}

impl From<Document> for DocOrId {
    fn from(doc: Document) -> Self {
        DocOrId::Doc(doc)
    }
}

impl From<DocId> for DocOrId {
    fn from(id: DocId) -> Self {
        DocOrId::Id(id)
    }
}

impl From<&str> for DocOrId {
    fn from(id: &str) -> Self {
        DocOrId::Id(DocId::from(id))
    }
}

/// Delete a document with the quorum write options from `config`.
pub fn safe_delete(
    store: &dyn DocumentStore,
    config: &StoreConfig,
    collection: &Collection,
    target: impl Into<DocOrId>,
) -> BulkResult<()> {
    let target = target.into();
    let id = target.id().cloned().ok_or_else(|| StoreError::NotFound {
        collection: collection.clone(),
        id: DocId::new(""),
    })?;
    store.delete(collection, &id, &config.safe_write_options())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use settee_store::{
        InMemoryDocumentStore, ReadOptions, StoreResult, ViewRow, WriteOptions, WriteResult,
    };
    use std::sync::Mutex;

    fn coll() -> Collection {
        Collection::from("cases")
    }

    fn seed(store: &InMemoryDocumentStore, docs: &[(&str, &str)]) -> Vec<Document> {
        let docs: Vec<Document> = docs
            .iter()
            .map(|(id, ty)| Document::new(coll()).with_id(*id).with_doc_type(*ty))
            .collect();
        store.bulk_save(&coll(), &docs, WriteMode::NonAtomic).unwrap();
        store.get_many(&coll(), &docs.iter().filter_map(|d| d.id().cloned()).collect::<Vec<_>>()).unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<DocId> {
        raw.iter().map(|s| DocId::from(*s)).collect()
    }

    // -----------------------------------------------------------------------
    // iter_bulk_delete
    // -----------------------------------------------------------------------

    #[test]
    fn deletes_in_chunks_and_counts_found_docs() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[("a", "Case"), ("b", "Case"), ("c", "Case")]);
        let options = BulkDeleteOptions {
            chunk_size: 2,
            ..Default::default()
        };

        let deleted =
            iter_bulk_delete(&store, &coll(), &ids(&["a", "b", "c", "missing"]), &options).unwrap();
        assert_eq!(deleted, 3);
        assert!(store.is_empty(&coll()));
        assert!(store.is_tombstoned(&coll(), &DocId::from("b")));
    }

    #[test]
    fn callback_sees_every_doc_and_can_abort() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[("a", "Case"), ("b", "Case")]);

        let mut seen = Vec::new();
        iter_bulk_delete_with_callback(
            &store,
            &coll(),
            &ids(&["a"]),
            &BulkDeleteOptions::default(),
            |doc| {
                seen.push(doc.id().cloned());
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(seen, vec![Some(DocId::from("a"))]);

        let err = iter_bulk_delete_with_doc_type_verification(
            &store,
            &coll(),
            &ids(&["b"]),
            "Form",
            &BulkDeleteOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BulkError::DocTypeMismatch { ref expected, ref actual }
                if expected == "Form" && actual.as_deref() == Some("Case")
        ));
        // Nothing from the aborted chunk was deleted.
        assert_eq!(store.len(&coll()), 1);
    }

    #[test]
    fn fetch_retry_applies_per_chunk() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[("a", "Case")]);
        store.fail_next_reads(1);

        let options = BulkDeleteOptions {
            retry: RetryPolicy::fixed(2, Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(iter_bulk_delete(&store, &coll(), &ids(&["a"]), &options).unwrap(), 1);

        seed(&store, &[("b", "Case")]);
        store.fail_next_reads(1);
        let err = iter_bulk_delete(&store, &coll(), &ids(&["b"]), &BulkDeleteOptions::default());
        assert!(matches!(err, Err(BulkError::Store(StoreError::Transport(_)))));
    }

    // -----------------------------------------------------------------------
    // soft_delete_docs
    // -----------------------------------------------------------------------

    #[test]
    fn soft_delete_renames_only_matching_types() {
        let store = InMemoryDocumentStore::new();
        let docs = seed(&store, &[("a", "Case"), ("b", "Form"), ("c", "Case")]);

        let count = soft_delete_docs(&store, &coll(), &docs, "Case").unwrap();
        assert_eq!(count, 2);

        let a = store.get(&coll(), &DocId::from("a"), &ReadOptions::default()).unwrap().unwrap();
        let b = store.get(&coll(), &DocId::from("b"), &ReadOptions::default()).unwrap().unwrap();
        assert_eq!(a.doc_type(), Some("Case-Deleted"));
        assert_eq!(b.doc_type(), Some("Form"));
    }

    #[test]
    fn soft_delete_reports_stale_revisions() {
        let store = InMemoryDocumentStore::new();
        let docs = seed(&store, &[("a", "Case")]);
        soft_delete_docs(&store, &coll(), &docs, "Case").unwrap();

        // Second run with the same stale revision conflicts.
        let mut stale = docs[0].clone();
        stale.set_doc_type("Case");
        let err = soft_delete_docs(&store, &coll(), &[stale], "Case").unwrap_err();
        assert!(matches!(err, BulkError::WriteFailures { ref failures, .. } if failures.len() == 1));
    }

    #[test]
    fn soft_delete_spans_multiple_chunks() {
        let store = InMemoryDocumentStore::new();
        let raw: Vec<String> = (0..120).map(|i| format!("d{i}")).collect();
        let spec: Vec<(&str, &str)> = raw.iter().map(|id| (id.as_str(), "Case")).collect();
        let docs = seed(&store, &spec);

        assert_eq!(soft_delete_docs(&store, &coll(), &docs, "Case").unwrap(), 120);
        assert_eq!(store.committed_batches().len(), 1 + 3);
    }

    // -----------------------------------------------------------------------
    // safe_delete
    // -----------------------------------------------------------------------

    /// Delegating store that records the write options it saw.
    struct Recording {
        inner: InMemoryDocumentStore,
        quorums: Mutex<Vec<Option<u32>>>,
    }

    impl DocumentStore for Recording {
        fn uri(&self, collection: &Collection) -> String {
            self.inner.uri(collection)
        }
        fn get(&self, c: &Collection, id: &DocId, o: &ReadOptions) -> StoreResult<Option<Document>> {
            self.inner.get(c, id, o)
        }
        fn get_many(&self, c: &Collection, ids: &[DocId]) -> StoreResult<Vec<Document>> {
            self.inner.get_many(c, ids)
        }
        fn bulk_save(&self, c: &Collection, d: &[Document], m: WriteMode) -> StoreResult<Vec<WriteResult>> {
            self.inner.bulk_save(c, d, m)
        }
        fn list_ids(&self, c: &Collection, s: &str, e: &str) -> StoreResult<Vec<DocId>> {
            self.inner.list_ids(c, s, e)
        }
        fn view(&self, c: &Collection, v: &str, p: &Value) -> StoreResult<Vec<ViewRow>> {
            self.inner.view(c, v, p)
        }
        fn save(&self, doc: &Document, options: &WriteOptions) -> StoreResult<WriteResult> {
            self.quorums.lock().unwrap().push(options.quorum);
            self.inner.save(doc, options)
        }
    }

    fn clustered() -> StoreConfig {
        StoreConfig::from_toml_str(
            r#"
            url = "https://acct.cloudant.com/settee"
            server_root = "acct.cloudant.com"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn safe_delete_uses_quorum_on_clustered_servers() {
        let store = Recording {
            inner: InMemoryDocumentStore::new(),
            quorums: Mutex::new(Vec::new()),
        };
        let doc = Document::from_json(coll(), json!({"_id": "a"})).unwrap();
        store.bulk_save(&coll(), &[doc.clone()], WriteMode::NonAtomic).unwrap();

        safe_delete(&store, &clustered(), &coll(), "a").unwrap();
        assert_eq!(*store.quorums.lock().unwrap(), vec![Some(3)]);
        assert!(store.inner.is_tombstoned(&coll(), &DocId::from("a")));

        let err = safe_delete(&store, &StoreConfig::default(), &coll(), doc).unwrap_err();
        assert!(matches!(err, BulkError::Store(StoreError::NotFound { .. })));
    }

    #[test]
    fn safe_delete_requires_an_id() {
        let store = InMemoryDocumentStore::new();
        let err = safe_delete(&store, &StoreConfig::default(), &coll(), Document::new(coll()));
        assert!(matches!(err, Err(BulkError::Store(StoreError::NotFound { .. }))));
    }
}
