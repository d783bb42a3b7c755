use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::id::{Collection, DocId};
use crate::record::{FromDocument, Record};

/// Wire field names managed by dedicated accessors rather than the body.
const RESERVED_FIELDS: &[&str] = &["_id", "_rev", "_deleted", "doc_type"];

/// A JSON document in CouchDB wire shape.
///
/// The identifier, revision, tombstone flag and `doc_type` are held as
/// typed fields; every other top-level field lives in the body map. The
/// collection is local bookkeeping and never appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(skip)]
    collection: Collection,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<DocId>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(rename = "_deleted", default, skip_serializing_if = "is_false")]
    deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doc_type: Option<String>,
    #[serde(flatten)]
    body: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Document {
    /// An empty, unsaved document in `collection`.
    pub fn new(collection: impl Into<Collection>) -> Self {
        Self {
            collection: collection.into(),
            id: None,
            rev: None,
            deleted: false,
            doc_type: None,
            body: Map::new(),
        }
    }

    /// Parse a wire JSON object into a document belonging to `collection`.
    pub fn from_json(collection: impl Into<Collection>, value: Value) -> Result<Self, TypeError> {
        if !value.is_object() {
            return Err(TypeError::NotAnObject(value.to_string()));
        }
        let mut doc: Document =
            serde_json::from_value(value).map_err(|e| TypeError::Serialization(e.to_string()))?;
        doc.collection = collection.into();
        Ok(doc)
    }

    /// Render the document as wire JSON.
    pub fn to_json(&self) -> Value {
        // Every field is a plain JSON value, so this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn with_id(mut self, id: impl Into<DocId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn set_collection(&mut self, collection: impl Into<Collection>) {
        self.collection = collection.into();
    }

    /// The identifier, or `None` when missing or empty.
    pub fn id(&self) -> Option<&DocId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: DocId) {
        self.id = Some(id);
    }

    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.rev = Some(rev.into());
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref()
    }

    pub fn set_doc_type(&mut self, doc_type: impl Into<String>) {
        self.doc_type = Some(doc_type.into());
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Mark the document as a tombstone.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }

    /// Set a body field. Reserved wire fields must go through their setters.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, TypeError> {
        let field = field.into();
        if RESERVED_FIELDS.contains(&field.as_str()) {
            return Err(TypeError::InvalidDocument(format!(
                "field {field} is reserved"
            )));
        }
        Ok(self.body.insert(field, value.into()))
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.body.remove(field)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }
}

impl Record for Document {
    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn id(&self) -> Option<&DocId> {
        Document::id(self)
    }

    fn set_id(&mut self, id: DocId) {
        Document::set_id(self, id);
    }

    fn mark_deleted(&mut self) {
        Document::mark_deleted(self);
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn to_document(&self) -> Document {
        self.clone()
    }
}

impl FromDocument for Document {
    fn from_document(doc: Document) -> Result<Self, TypeError> {
        Ok(doc)
    }
}
