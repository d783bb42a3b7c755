use std::sync::Arc;

use settee_store::{DocumentStore, StoreResult};
use settee_types::{Collection, DocId, Document, FromDocument};
use settee_util::Restartable;
use tracing::debug;

use crate::error::BulkResult;
use crate::retry::RetryPolicy;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Fetch the documents among `keys` that exist.
///
/// Empty identifiers are dropped; an empty key list makes no request.
pub fn get_docs(
    store: &dyn DocumentStore,
    collection: &Collection,
    keys: &[DocId],
) -> StoreResult<Vec<Document>> {
    let keys: Vec<DocId> = keys.iter().filter(|k| !k.is_empty()).cloned().collect();
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    store.get_many(collection, &keys)
}

/// Fetch and convert documents into a typed model.
pub fn wrapped_docs<R: FromDocument>(
    store: &dyn DocumentStore,
    collection: &Collection,
    keys: &[DocId],
) -> BulkResult<Vec<R>> {
    get_docs(store, collection, keys)?
        .into_iter()
        .map(|doc| R::from_document(doc).map_err(Into::into))
        .collect()
}

/// A restartable chunked fetch: every pass starts from the first chunk.
pub type DocIter<'a> = Restartable<Box<dyn Fn() -> DocPass<'a> + 'a>>;

/// Iterate documents for `ids`, fetching `chunk_size` at a time.
pub fn iter_docs<'a>(
    store: &'a dyn DocumentStore,
    collection: &Collection,
    ids: &[DocId],
    chunk_size: usize,
) -> DocIter<'a> {
    iter_docs_with_retry(store, collection, ids, chunk_size, RetryPolicy::none())
}

/// Like [`iter_docs`], retrying each chunk fetch on transport failures.
///
/// Meant for long-running migrations where a single dropped connection
/// should not end the run.
pub fn iter_docs_with_retry<'a>(
    store: &'a dyn DocumentStore,
    collection: &Collection,
    ids: &[DocId],
    chunk_size: usize,
    retry: RetryPolicy,
) -> DocIter<'a> {
    let collection = collection.clone();
    let ids: Arc<[DocId]> = ids.into();
    let chunk_size = chunk_size.max(1);
    let factory: Box<dyn Fn() -> DocPass<'a> + 'a> = Box::new(move || DocPass {
        store,
        collection: collection.clone(),
        ids: ids.clone(),
        chunk_size,
        retry,
        next_chunk: 0,
        buffered: Vec::new().into_iter(),
        failed: false,
    });
    Restartable::new(factory)
}

/// One pass over a [`DocIter`].
///
/// Yields each found document; a chunk that cannot be fetched yields its
/// error once and ends the pass.
pub struct DocPass<'a> {
    store: &'a dyn DocumentStore,
    collection: Collection,
    ids: Arc<[DocId]>,
    chunk_size: usize,
    retry: RetryPolicy,
    next_chunk: usize,
    buffered: std::vec::IntoIter<Document>,
    failed: bool,
}

impl Iterator for DocPass<'_> {
    type Item = BulkResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.buffered.next() {
                return Some(Ok(doc));
            }
            let start = self.next_chunk * self.chunk_size;
            if self.failed || start >= self.ids.len() {
                return None;
            }
            let end = (start + self.chunk_size).min(self.ids.len());
            self.next_chunk += 1;

            let chunk = &self.ids[start..end];
            match self
                .retry
                .run(|| get_docs(self.store, &self.collection, chunk))
            {
                Ok(docs) => {
                    debug!(collection = %self.collection, requested = chunk.len(), found = docs.len(), "fetched chunk");
                    self.buffered = docs.into_iter();
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}
