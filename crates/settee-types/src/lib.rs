//! Foundation types for settee.
//!
//! Every other settee crate depends on `settee-types`. It defines how a
//! document is identified, which collection it lives in, and what the
//! write buffer and bulk helpers need to know about it.
//!
//! # Key Types
//!
//! - [`DocId`]: opaque document identifier (`_id` on the wire)
//! - [`Collection`]: named storage partition a document belongs to
//! - [`Document`]: a JSON document in CouchDB wire shape
//! - [`Record`]: anything that can be queued into a bulk write
//! - [`ClearCaches`]: optional per-document cache clearing capability
//! - [`IdGenerator`]: source of fresh identifiers for unsaved documents

pub mod document;
pub mod error;
pub mod id;
pub mod record;

pub use document::Document;
pub use error::TypeError;
pub use id::{Collection, DocId, IdGenerator, UuidGenerator, DESIGN_PREFIX};
pub use record::{ClearCaches, FromDocument, Record};
