//! The [`Record`] trait: what a bulk write needs to know about a document.

use crate::document::Document;
use crate::error::TypeError;
use crate::id::{Collection, DocId};

/// Optional capability for records that hold their own caches.
///
/// Called once after the record has been durably written or tombstoned.
pub trait ClearCaches {
    fn clear_caches(&self);
}

/// Anything that can be queued into a bulk write.
///
/// [`Document`] implements this directly. Typed models implement it to
/// participate in the same batches, and may advertise the [`ClearCaches`]
/// capability through [`Record::cache_clearing`].
pub trait Record: Clone {
    /// The collection this record is written to.
    fn collection(&self) -> &Collection;

    /// The identifier, or `None` if the record has never been assigned one.
    fn id(&self) -> Option<&DocId>;

    fn set_id(&mut self, id: DocId);

    /// Turn the record into a tombstone.
    fn mark_deleted(&mut self);

    fn is_deleted(&self) -> bool;

    /// The wire document submitted to storage.
    fn to_document(&self) -> Document;

    /// Capability query for per-record cache clearing.
    fn cache_clearing(&self) -> Option<&dyn ClearCaches> {
        None
    }
}

/// Conversion from a fetched wire document into a typed model.
pub trait FromDocument: Sized {
    fn from_document(doc: Document) -> Result<Self, TypeError>;
}
