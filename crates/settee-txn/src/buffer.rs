use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use settee_store::{DocumentStore, WriteMode};
use settee_types::{Collection, DocId, Document, IdGenerator, Record, UuidGenerator};
use tracing::{debug, info, warn};

use crate::error::{TxnError, TxnResult};
use crate::invalidate::CacheInvalidator;

/// How a scope ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeExit {
    Completed,
    Aborted,
}

/// What a commit wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// One bulk write per collection.
    pub batches: usize,
    pub saved: usize,
    pub deleted: usize,
}

/// Buffer of pending saves and deletes, flushed as one all-or-nothing bulk
/// write per collection.
///
/// Within one buffer the last call wins for a given (collection, id): a
/// save replaces an earlier save or delete of the same document, a delete
/// replaces an earlier save or delete. Each collection's batch lists its
/// tombstones before its saves; collections are written in name order.
///
/// The buffer is meant for one logical operation on one thread. Nested
/// scopes share it through `&mut` and only the outermost one commits.
pub struct BulkWriteBuffer<R: Record = Document> {
    store: Arc<dyn DocumentStore>,
    invalidator: Option<Arc<dyn CacheInvalidator>>,
    ids: Arc<dyn IdGenerator>,
    depth: usize,
    to_delete: BTreeMap<Collection, Vec<R>>,
    to_save: BTreeMap<Collection, BTreeMap<DocId, R>>,
}

impl<R: Record> BulkWriteBuffer<R> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            invalidator: None,
            ids: Arc::new(UuidGenerator),
            depth: 0,
            to_delete: BTreeMap::new(),
            to_save: BTreeMap::new(),
        }
    }

    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = Some(invalidator);
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Current scope nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of queued saves plus queued deletes.
    pub fn pending_len(&self) -> usize {
        self.to_save.values().map(BTreeMap::len).sum::<usize>()
            + self.to_delete.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }

    /// Queue a save, assigning an identifier first if the record has none.
    ///
    /// Returns the identifier the record is queued under.
    pub fn save(&mut self, mut record: R) -> DocId {
        let id = match record.id() {
            Some(id) => id.clone(),
            None => {
                let id = self.ids.generate();
                record.set_id(id.clone());
                id
            }
        };
        let collection = record.collection().clone();

        if let Some(deletes) = self.to_delete.get_mut(&collection) {
            deletes.retain(|d| d.id() != Some(&id));
        }
        self.to_save
            .entry(collection)
            .or_default()
            .insert(id.clone(), record);
        id
    }

    /// Queue a delete. No identifier is assigned.
    pub fn delete(&mut self, record: R) {
        let collection = record.collection().clone();
        if let Some(id) = record.id() {
            if let Some(saves) = self.to_save.get_mut(&collection) {
                saves.remove(id);
            }
            if let Some(deletes) = self.to_delete.get_mut(&collection) {
                deletes.retain(|d| d.id() != Some(id));
            }
        }
        self.to_delete.entry(collection).or_default().push(record);
    }

    /// Queue a delete for each record, in order.
    pub fn delete_all<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = R>,
    {
        for record in records {
            self.delete(record);
        }
    }

    /// Queued saves for one collection, or for all collections.
    pub fn preview(&self, collection: Option<&Collection>) -> Vec<&R> {
        match collection {
            Some(c) => self
                .to_save
                .get(c)
                .map(|saves| saves.values().collect())
                .unwrap_or_default(),
            None => self.to_save.values().flat_map(BTreeMap::values).collect(),
        }
    }

    /// Write every pending batch now, regardless of scope depth.
    ///
    /// Pending state is cleared up front: if a batch fails, the error is
    /// returned and the batches not yet written are abandoned.
    pub fn commit(&mut self) -> TxnResult<CommitSummary> {
        let mut to_delete = std::mem::take(&mut self.to_delete);
        let mut to_save = std::mem::take(&mut self.to_save);
        let collections: BTreeSet<Collection> =
            to_delete.keys().chain(to_save.keys()).cloned().collect();

        let mut summary = CommitSummary::default();
        for collection in &collections {
            let mut batch: Vec<R> = to_delete.remove(collection).unwrap_or_default();
            for record in &mut batch {
                record.mark_deleted();
            }
            let deleted = batch.len();
            if let Some(saves) = to_save.remove(collection) {
                batch.extend(saves.into_values());
            }
            if batch.is_empty() {
                continue;
            }

            let mut docs: Vec<Document> = batch.iter().map(Record::to_document).collect();
            debug!(%collection, docs = docs.len(), deleted, "submitting bulk write");
            let results = match self
                .store
                .bulk_save(collection, &docs, WriteMode::AllOrNothing)
            {
                Ok(results) => results,
                Err(e) => {
                    let abandoned = to_delete.values().map(Vec::len).sum::<usize>()
                        + to_save.values().map(BTreeMap::len).sum::<usize>();
                    warn!(%collection, error = %e, abandoned, "bulk write failed");
                    return Err(TxnError::Store(e));
                }
            };
            for (doc, result) in docs.iter_mut().zip(&results) {
                if let Some(rev) = &result.rev {
                    doc.set_id(result.id.clone());
                    doc.set_rev(rev.clone());
                }
            }

            for (record, doc) in batch.iter().zip(&docs) {
                if let Some(caches) = record.cache_clearing() {
                    caches.clear_caches();
                }
                if let Some(invalidator) = &self.invalidator {
                    invalidator.invalidate(doc);
                    if record.is_deleted() {
                        invalidator.invalidate_deleted(doc);
                    }
                }
            }

            summary.batches += 1;
            summary.deleted += deleted;
            summary.saved += batch.len() - deleted;
        }

        info!(
            batches = summary.batches,
            saved = summary.saved,
            deleted = summary.deleted,
            "bulk write buffer committed"
        );
        Ok(summary)
    }

    /// Drop all pending saves and deletes without writing.
    pub fn discard(&mut self) {
        let dropped = self.pending_len();
        self.to_delete.clear();
        self.to_save.clear();
        if dropped > 0 {
            debug!(dropped, "bulk write buffer discarded");
        }
    }

    /// Enter a scope. Returns the new depth.
    pub fn enter(&mut self) -> usize {
        self.depth += 1;
        self.depth
    }

    /// Leave a scope.
    ///
    /// Leaving the outermost scope commits when it completed and discards
    /// pending state when it aborted. Inner scopes only decrement depth, so
    /// an aborted inner scope whose failure is handled by an outer one still
    /// has its writes committed by the outer scope.
    pub fn exit(&mut self, outcome: ScopeExit) -> TxnResult<Option<CommitSummary>> {
        if self.depth == 0 {
            return Err(TxnError::ScopeUnderflow);
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(None);
        }
        match outcome {
            ScopeExit::Completed => self.commit().map(Some),
            ScopeExit::Aborted => {
                self.discard();
                Ok(None)
            }
        }
    }

    /// Run `f` inside a scope, committing on the outermost successful exit.
    ///
    /// An `Err` from `f` is returned unchanged; a commit failure is
    /// converted into `E`.
    pub fn scope<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<TxnError>,
    {
        self.enter();
        let mut guard = ScopeGuard {
            buffer: self,
            armed: true,
        };
        let result = f(&mut *guard.buffer);
        guard.armed = false;
        let outcome = if result.is_ok() {
            ScopeExit::Completed
        } else {
            ScopeExit::Aborted
        };
        guard.buffer.exit(outcome)?;
        result
    }
}

/// Leaves the scope as aborted if the closure unwinds.
struct ScopeGuard<'a, R: Record> {
    buffer: &'a mut BulkWriteBuffer<R>,
    armed: bool,
}

impl<R: Record> Drop for ScopeGuard<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            warn!(depth = self.buffer.depth, "scope unwound, aborting");
            let _ = self.buffer.exit(ScopeExit::Aborted);
        }
    }
}

impl<R: Record> std::fmt::Debug for BulkWriteBuffer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkWriteBuffer")
            .field("depth", &self.depth)
            .field("pending", &self.pending_len())
            .finish()
    }
}
