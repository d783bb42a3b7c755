use settee_store::DocumentStore;
use settee_types::{Collection, DocId, Document, DESIGN_PREFIX};

use crate::error::BulkResult;
use crate::fetch::get_docs;

/// A `_design/...` document.
#[derive(Clone, Debug)]
pub struct DesignDoc {
    pub id: DocId,
    /// The identifier without the `_design/` prefix.
    pub name: String,
    pub doc: Document,
}

impl DesignDoc {
    fn from_document(doc: Document) -> Option<Self> {
        let id = doc.id()?.clone();
        let name = id.as_str().strip_prefix(DESIGN_PREFIX)?.to_string();
        Some(Self { id, name, doc })
    }

    /// Names of the views this design document defines, sorted.
    pub fn views(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .doc
            .get("views")
            .and_then(|v| v.as_object())
            .map(|views| views.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Every design document in a collection.
pub fn design_docs(store: &dyn DocumentStore, collection: &Collection) -> BulkResult<Vec<DesignDoc>> {
    let ids = store.list_ids(collection, DESIGN_PREFIX, "_design/zzzz")?;
    Ok(get_docs(store, collection, &ids)?
        .into_iter()
        .filter_map(DesignDoc::from_document)
        .collect())
}

/// Every view in a collection as `"<design>/<view>"`.
pub fn view_names(store: &dyn DocumentStore, collection: &Collection) -> BulkResult<Vec<String>> {
    Ok(design_docs(store, collection)?
        .iter()
        .flat_map(|design| {
            design
                .views()
                .into_iter()
                .map(move |view| format!("{}/{view}", design.name))
        })
        .collect())
}
