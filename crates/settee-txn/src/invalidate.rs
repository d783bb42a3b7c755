use settee_types::Document;

/// Cache invalidation hooks fired after a batch is durably written.
///
/// Both hooks are fire-and-forget: they cannot fail the commit.
pub trait CacheInvalidator: Send + Sync {
    /// Called once for every document in a committed batch.
    fn invalidate(&self, doc: &Document);

    /// Called once more for every tombstoned document in a committed batch.
    fn invalidate_deleted(&self, doc: &Document);
}

/// Invalidator that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpInvalidator;

impl CacheInvalidator for NoOpInvalidator {
    fn invalidate(&self, _doc: &Document) {}

    fn invalidate_deleted(&self, _doc: &Document) {}
}
