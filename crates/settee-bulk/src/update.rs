use settee_store::{DocumentStore, ReadOptions, StoreError, WriteOptions};
use settee_types::{DocId, Document};
use tracing::{debug, warn};

use crate::error::{BulkError, BulkResult};

pub const DEFAULT_MAX_TRIES: u32 = 5;

/// Read-modify-write with conflict retry.
///
/// Applies `update` to `doc` and saves it. On a revision conflict the
/// current version is fetched and `update` is applied again, up to
/// `max_tries` saves in total. Returns the saved document with its new
/// revision.
pub fn apply_update<F>(
    store: &dyn DocumentStore,
    mut doc: Document,
    mut update: F,
    max_tries: u32,
) -> BulkResult<Document>
where
    F: FnMut(&mut Document),
{
    let id = doc.id().cloned().unwrap_or_else(|| DocId::new(""));
    let collection = doc.collection().clone();
    for attempt in 1..=max_tries.max(1) {
        update(&mut doc);
        match store.save(&doc, &WriteOptions::default()) {
            Ok(result) => {
                doc.set_id(result.id);
                if let Some(rev) = result.rev {
                    doc.set_rev(rev);
                }
                debug!(%collection, id = %doc.id().map(DocId::as_str).unwrap_or(""), attempt, "update saved");
                return Ok(doc);
            }
            Err(StoreError::Conflict { .. }) => {
                warn!(%collection, %id, attempt, "update conflicted, refetching");
                doc = store
                    .get(&collection, &id, &ReadOptions::default())?
                    .ok_or_else(|| StoreError::NotFound {
                        collection: collection.clone(),
                        id: id.clone(),
                    })?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(BulkError::ConflictRetriesExhausted {
        id,
        attempts: max_tries.max(1),
    })
}
