use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use settee_types::{Collection, DocId, Document};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::DocumentStore;
use crate::types::{ReadOptions, WriteMode, WriteResult};
use crate::view::{apply_params, ViewRow};

/// Map function backing an in-memory view: emits `(key, value)` pairs.
pub type MapFn = Arc<dyn Fn(&Document) -> Vec<(Value, Value)> + Send + Sync>;

#[derive(Clone, Debug)]
struct StoredDoc {
    rev: String,
    deleted: bool,
    doc: Document,
}

type Partition = BTreeMap<DocId, StoredDoc>;

/// In-memory, HashMap-based document store.
///
/// Intended for tests and embedding. Collections are kept behind a
/// `RwLock`; documents are cloned on read and write. Revisions follow the
/// `"<generation>-<hash>"` shape and stale revisions are conflicts.
///
/// The store can be told to fail the next N reads or writes with a
/// transport error, and it records every applied batch so callers can
/// assert on exactly what reached storage.
pub struct InMemoryDocumentStore {
    base_uri: String,
    collections: RwLock<HashMap<Collection, Partition>>,
    views: RwLock<HashMap<(Collection, String), MapFn>>,
    batches: RwLock<Vec<(Collection, Vec<Document>)>>,
    failing_reads: AtomicUsize,
    failing_writes: AtomicUsize,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_base_uri("memory://settee")
    }

    /// Create a store whose collection URIs are rooted at `base_uri`.
    pub fn with_base_uri(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            collections: RwLock::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
            batches: RwLock::new(Vec::new()),
            failing_reads: AtomicUsize::new(0),
            failing_writes: AtomicUsize::new(0),
        }
    }

    /// Register a view named `"design/view"` backed by a map function.
    pub fn register_view<F>(&self, collection: &Collection, name: &str, map: F)
    where
        F: Fn(&Document) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        self.views
            .write()
            .expect("lock poisoned")
            .insert((collection.clone(), name.to_string()), Arc::new(map));
    }

    /// Fail the next `count` reads (`get`, `get_many`) with a transport error.
    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` bulk writes with a transport error.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Every batch applied so far, in order, as submitted.
    pub fn committed_batches(&self) -> Vec<(Collection, Vec<Document>)> {
        self.batches.read().expect("lock poisoned").clone()
    }

    /// Number of live (non-deleted) documents in a collection.
    pub fn len(&self, collection: &Collection) -> usize {
        self.collections
            .read()
            .expect("lock poisoned")
            .get(collection)
            .map(|p| p.values().filter(|s| !s.deleted).count())
            .unwrap_or(0)
    }

    /// Returns `true` if the collection has no live documents.
    pub fn is_empty(&self, collection: &Collection) -> bool {
        self.len(collection) == 0
    }

    /// Returns `true` if the identifier is stored as a tombstone.
    pub fn is_tombstoned(&self, collection: &Collection, id: &DocId) -> bool {
        self.collections
            .read()
            .expect("lock poisoned")
            .get(collection)
            .and_then(|p| p.get(id))
            .map(|s| s.deleted)
            .unwrap_or(false)
    }

    fn take_fault(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn live(partition: &Partition, id: &DocId) -> Option<Document> {
        partition
            .get(id)
            .filter(|s| !s.deleted)
            .map(|s| s.doc.clone())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn next_rev(previous: Option<&str>, doc: &Document) -> String {
    let generation = previous
        .and_then(|rev| rev.split('-').next())
        .and_then(|g| g.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    let digest = blake3::hash(doc.to_json().to_string().as_bytes());
    format!("{generation}-{}", &hex::encode(digest.as_bytes())[..32])
}

/// Apply one document against a partition, checking its revision.
fn apply_one(partition: &mut Partition, collection: &Collection, doc: &Document) -> WriteResult {
    let id = doc.id().cloned().unwrap_or_else(DocId::generate);
    let existing = partition.get(&id);
    let fresh = match existing {
        None => doc.rev().is_none(),
        Some(s) if s.deleted => doc.rev().is_none() || doc.rev() == Some(s.rev.as_str()),
        Some(s) => doc.rev() == Some(s.rev.as_str()),
    };
    if !fresh {
        return WriteResult::failed(id, "conflict");
    }

    let rev = next_rev(existing.map(|s| s.rev.as_str()), doc);
    let mut stored = doc.clone();
    stored.set_collection(collection.clone());
    stored.set_id(id.clone());
    stored.set_rev(rev.clone());
    partition.insert(
        id.clone(),
        StoredDoc {
            rev: rev.clone(),
            deleted: doc.is_deleted(),
            doc: stored,
        },
    );
    WriteResult::ok(id, rev)
}

impl DocumentStore for InMemoryDocumentStore {
    fn uri(&self, collection: &Collection) -> String {
        format!("{}/{}", self.base_uri, collection)
    }

    fn get(
        &self,
        collection: &Collection,
        id: &DocId,
        _options: &ReadOptions,
    ) -> StoreResult<Option<Document>> {
        if Self::take_fault(&self.failing_reads) {
            return Err(StoreError::Transport("injected read failure".into()));
        }
        let map = self.collections.read().expect("lock poisoned");
        Ok(map.get(collection).and_then(|p| Self::live(p, id)))
    }

    fn get_many(&self, collection: &Collection, ids: &[DocId]) -> StoreResult<Vec<Document>> {
        if Self::take_fault(&self.failing_reads) {
            return Err(StoreError::Transport("injected read failure".into()));
        }
        let map = self.collections.read().expect("lock poisoned");
        let Some(partition) = map.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(ids.iter().filter_map(|id| Self::live(partition, id)).collect())
    }

    fn bulk_save(
        &self,
        collection: &Collection,
        docs: &[Document],
        mode: WriteMode,
    ) -> StoreResult<Vec<WriteResult>> {
        if Self::take_fault(&self.failing_writes) {
            return Err(StoreError::Transport("injected write failure".into()));
        }

        let mut map = self.collections.write().expect("lock poisoned");
        let partition = map.entry(collection.clone()).or_default();

        let results = match mode {
            WriteMode::AllOrNothing => {
                let mut staged = partition.clone();
                let results: Vec<WriteResult> = docs
                    .iter()
                    .map(|doc| apply_one(&mut staged, collection, doc))
                    .collect();
                let failures: Vec<WriteResult> =
                    results.iter().filter(|r| !r.is_ok()).cloned().collect();
                if !failures.is_empty() {
                    debug!(%collection, failed = failures.len(), "all-or-nothing batch rejected");
                    return Err(StoreError::BatchRejected {
                        collection: collection.clone(),
                        failures,
                    });
                }
                *partition = staged;
                results
            }
            WriteMode::NonAtomic => docs
                .iter()
                .map(|doc| apply_one(partition, collection, doc))
                .collect(),
        };

        self.batches
            .write()
            .expect("lock poisoned")
            .push((collection.clone(), docs.to_vec()));
        debug!(%collection, docs = docs.len(), ?mode, "bulk write applied");
        Ok(results)
    }

    fn list_ids(
        &self,
        collection: &Collection,
        start: &str,
        end: &str,
    ) -> StoreResult<Vec<DocId>> {
        let map = self.collections.read().expect("lock poisoned");
        let Some(partition) = map.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(partition
            .iter()
            .filter(|(id, s)| !s.deleted && id.as_str() >= start && id.as_str() <= end)
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn view(
        &self,
        collection: &Collection,
        view: &str,
        params: &Value,
    ) -> StoreResult<Vec<ViewRow>> {
        let map_fn = self
            .views
            .read()
            .expect("lock poisoned")
            .get(&(collection.clone(), view.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::UnknownView {
                collection: collection.clone(),
                view: view.to_string(),
            })?;
        let include_docs = params
            .get("include_docs")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let map = self.collections.read().expect("lock poisoned");
        let mut rows = Vec::new();
        if let Some(partition) = map.get(collection) {
            for (id, stored) in partition.iter().filter(|(_, s)| !s.deleted) {
                for (key, value) in map_fn(&stored.doc) {
                    rows.push(ViewRow {
                        id: Some(id.clone()),
                        key,
                        value,
                        doc: include_docs.then(|| stored.doc.to_json()),
                    });
                }
            }
        }
        Ok(apply_params(rows, params))
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collections = self.collections.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryDocumentStore")
            .field("base_uri", &self.base_uri)
            .field("collection_count", &collections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WriteOptions;
    use serde_json::json;

    fn coll() -> Collection {
        Collection::from("users")
    }

    fn doc(id: &str, name: &str) -> Document {
        Document::from_json(coll(), json!({"_id": id, "name": name})).unwrap()
    }

    fn seed(store: &InMemoryDocumentStore, docs: &[Document]) {
        store.bulk_save(&coll(), docs, WriteMode::NonAtomic).unwrap();
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn save_then_get_assigns_revision() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "ada")]);

        let got = store
            .get(&coll(), &"a".into(), &ReadOptions::default())
            .unwrap()
            .expect("should exist");
        assert_eq!(got.get("name"), Some(&json!("ada")));
        assert!(got.rev().unwrap().starts_with("1-"));
        assert_eq!(got.collection(), &coll());
    }

    #[test]
    fn documents_without_id_get_one() {
        let store = InMemoryDocumentStore::new();
        let results = store
            .bulk_save(&coll(), &[Document::new(coll())], WriteMode::NonAtomic)
            .unwrap();
        assert!(results[0].is_ok());
        assert_eq!(results[0].id.as_str().len(), 32);
        assert_eq!(store.len(&coll()), 1);
    }

    #[test]
    fn update_requires_current_revision() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "ada")]);

        let stale = store
            .save(&doc("a", "grace"), &WriteOptions::default())
            .unwrap_err();
        assert!(matches!(stale, StoreError::Conflict { .. }));

        let mut current = store
            .get(&coll(), &"a".into(), &ReadOptions::default())
            .unwrap()
            .unwrap();
        current.insert("name", "grace").unwrap();
        let result = store.save(&current, &WriteOptions::default()).unwrap();
        assert!(result.rev.unwrap().starts_with("2-"));
    }

    #[test]
    fn get_many_returns_found_subset_in_request_order() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "1"), doc("b", "2"), doc("c", "3")]);

        let ids: Vec<DocId> = vec!["c".into(), "zz".into(), "a".into()];
        let found = store.get_many(&coll(), &ids).unwrap();
        let got: Vec<_> = found.iter().map(|d| d.id().unwrap().as_str()).collect();
        assert_eq!(got, vec!["c", "a"]);
    }

    #[test]
    fn get_many_on_unknown_collection_is_empty() {
        let store = InMemoryDocumentStore::new();
        assert!(store.get_many(&"nope".into(), &["a".into()]).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    #[test]
    fn all_or_nothing_rejects_whole_batch() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "ada")]);

        // "a" is stale (no rev), "b" would be fine on its own.
        let err = store
            .bulk_save(&coll(), &[doc("b", "bob"), doc("a", "x")], WriteMode::AllOrNothing)
            .unwrap_err();
        match err {
            StoreError::BatchRejected { failures, .. } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].id.as_str(), "a");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.len(&coll()), 1);
        assert_eq!(store.committed_batches().len(), 1);
    }

    #[test]
    fn non_atomic_applies_what_it_can() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "ada")]);

        let results = store
            .bulk_save(&coll(), &[doc("b", "bob"), doc("a", "x")], WriteMode::NonAtomic)
            .unwrap();
        assert!(results[0].is_ok());
        assert_eq!(results[1].error.as_deref(), Some("conflict"));
        assert_eq!(store.len(&coll()), 2);
    }

    #[test]
    fn tombstones_are_hidden_from_reads() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "ada"), doc("b", "bob")]);

        store
            .delete(&coll(), &"a".into(), &WriteOptions::default())
            .unwrap();
        assert!(store.is_tombstoned(&coll(), &"a".into()));
        assert!(store
            .get(&coll(), &"a".into(), &ReadOptions::default())
            .unwrap()
            .is_none());
        assert_eq!(store.list_ids(&coll(), "", "\u{fff0}").unwrap(), vec![DocId::from("b")]);
    }

    #[test]
    fn deleting_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .delete(&coll(), &"ghost".into(), &WriteOptions::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn bulk_delete_uses_fetched_revisions() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "1"), doc("b", "2")]);
        let fetched = store.get_many(&coll(), &["a".into(), "b".into()]).unwrap();

        let results = store.bulk_delete(&coll(), &fetched).unwrap();
        assert!(results.iter().all(WriteResult::is_ok));
        assert!(store.is_empty(&coll()));
    }

    // -----------------------------------------------------------------------
    // Ranges and views
    // -----------------------------------------------------------------------

    #[test]
    fn list_ids_is_inclusive_range() {
        let store = InMemoryDocumentStore::new();
        seed(
            &store,
            &[doc("_design/app", ""), doc("_design/zz", ""), doc("user-1", "")],
        );
        let ids = store.list_ids(&coll(), "_design/", "_design/zzzz").unwrap();
        assert_eq!(ids, vec![DocId::from("_design/app"), DocId::from("_design/zz")]);
    }

    #[test]
    fn views_emit_sorted_rows() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "zed"), doc("b", "amy")]);
        store.register_view(&coll(), "users/by_name", |d| {
            d.get("name")
                .map(|n| vec![(n.clone(), json!(1))])
                .unwrap_or_default()
        });

        let rows = store.view(&coll(), "users/by_name", &json!({})).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.key.clone()).collect();
        assert_eq!(keys, vec![json!("amy"), json!("zed")]);
        assert!(rows[0].doc.is_none());

        let with_docs = store
            .view(&coll(), "users/by_name", &json!({"include_docs": true, "limit": 1}))
            .unwrap();
        assert_eq!(with_docs.len(), 1);
        assert_eq!(with_docs[0].doc.as_ref().unwrap()["_id"], json!("b"));
    }

    #[test]
    fn unknown_view_is_an_error() {
        let store = InMemoryDocumentStore::new();
        let err = store.view(&coll(), "nope/nope", &json!({})).unwrap_err();
        assert!(matches!(err, StoreError::UnknownView { .. }));
    }

    // -----------------------------------------------------------------------
    // Fault injection
    // -----------------------------------------------------------------------

    #[test]
    fn injected_read_failures_are_transient_and_bounded() {
        let store = InMemoryDocumentStore::new();
        seed(&store, &[doc("a", "ada")]);
        store.fail_next_reads(2);

        for _ in 0..2 {
            let err = store.get_many(&coll(), &["a".into()]).unwrap_err();
            assert!(err.is_transient());
        }
        assert_eq!(store.get_many(&coll(), &["a".into()]).unwrap().len(), 1);
    }

    #[test]
    fn injected_write_failure_applies_nothing() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_writes(1);
        assert!(store
            .bulk_save(&coll(), &[doc("a", "ada")], WriteMode::AllOrNothing)
            .is_err());
        assert!(store.is_empty(&coll()));
        assert!(store.committed_batches().is_empty());
    }

    #[test]
    fn uri_joins_base_and_collection() {
        let store = InMemoryDocumentStore::with_base_uri("http://db:5984");
        assert_eq!(store.uri(&coll()), "http://db:5984/users");
    }
}
