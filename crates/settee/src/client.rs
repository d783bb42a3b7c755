use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use settee_bulk::{get_docs, safe_delete, DocOrId};
use settee_cache::{cached_view, CacheBackend, InMemoryCache, DEFAULT_VIEW_TTL};
use settee_store::{DocumentStore, InMemoryDocumentStore, ReadOptions, StoreConfig, ViewRow};
use settee_txn::{BulkWriteBuffer, CacheInvalidator, NoOpInvalidator};
use settee_types::{Collection, DocId, Document, Record};

use crate::error::{SetteeError, SetteeResult};

/// A configured database handle.
///
/// Cheap to clone; clones share the store, cache and invalidator.
#[derive(Clone)]
pub struct Settee {
    store: Arc<dyn DocumentStore>,
    config: StoreConfig,
    cache: Arc<dyn CacheBackend>,
    invalidator: Arc<dyn CacheInvalidator>,
    view_ttl: Duration,
}

impl Settee {
    pub fn new(store: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        Self {
            store,
            config,
            cache: Arc::new(InMemoryCache::new()),
            invalidator: Arc::new(NoOpInvalidator),
            view_ttl: DEFAULT_VIEW_TTL,
        }
    }

    /// A handle over a fresh in-memory store with default configuration.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDocumentStore::new()), StoreConfig::default())
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    pub fn with_view_ttl(mut self, ttl: Duration) -> Self {
        self.view_ttl = ttl;
        self
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The collection for the main database or a named extra database.
    pub fn collection(&self, postfix: Option<&str>) -> SetteeResult<Collection> {
        Ok(self.config.collection(postfix)?)
    }

    /// A new write buffer sharing this handle's store and invalidator.
    pub fn buffer<R: Record>(&self) -> BulkWriteBuffer<R> {
        BulkWriteBuffer::new(self.store.clone()).with_invalidator(self.invalidator.clone())
    }

    /// Run `f` in a write buffer scope; everything it saves or deletes is
    /// committed together when it returns `Ok`.
    pub fn transaction<T, F>(&self, f: F) -> SetteeResult<T>
    where
        F: FnOnce(&mut BulkWriteBuffer<Document>) -> SetteeResult<T>,
    {
        let mut buffer: BulkWriteBuffer<Document> = self.buffer();
        buffer.scope(f)
    }

    /// Read one document with quorum read options on clustered servers.
    pub fn get(&self, collection: &Collection, id: &DocId) -> SetteeResult<Option<Document>> {
        let options: ReadOptions = self.config.safe_read_options();
        Ok(self.store.get(collection, id, &options)?)
    }

    pub fn get_docs(&self, collection: &Collection, ids: &[DocId]) -> SetteeResult<Vec<Document>> {
        Ok(get_docs(self.store(), collection, ids)?)
    }

    /// Query a view through the view cache.
    pub fn view(&self, collection: &Collection, view: &str, params: &Value) -> SetteeResult<Vec<ViewRow>> {
        cached_view(
            self.cache.as_ref(),
            self.store(),
            collection,
            view,
            params,
            self.view_ttl,
        )
        .map_err(SetteeError::from)
    }

    /// Delete with quorum write options on clustered servers.
    pub fn safe_delete(&self, collection: &Collection, target: impl Into<DocOrId>) -> SetteeResult<()> {
        Ok(safe_delete(self.store(), &self.config, collection, target)?)
    }
}

impl std::fmt::Debug for Settee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settee")
            .field("url", &self.config.url)
            .field("view_ttl", &self.view_ttl)
            .finish()
    }
}
