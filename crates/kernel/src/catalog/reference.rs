//! Relationship field values.
//!
//! A relation arrives either as the bare id of the target document or, when
//! the query populated it, as the target document itself. All readers go
//! through [`Ref`] instead of inspecting the JSON shape themselves.

use serde::{Deserialize, Serialize};

/// Document identifier as stored by the document store.
pub type DocId = i64;

/// Target document of a relation that may or may not have been populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    /// Only the id of the related document is known.
    Id(DocId),
    /// The related document was populated by the query.
    Populated(T),
}

impl<T> Ref<T> {
    /// The populated document, if this relation was populated.
    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Id(_) => None,
            Ref::Populated(doc) => Some(doc),
        }
    }
}

impl<T: Identified> Ref<T> {
    /// Id of the related document, whichever shape it arrived in.
    pub fn id(&self) -> DocId {
        match self {
            Ref::Id(id) => *id,
            Ref::Populated(doc) => doc.doc_id(),
        }
    }
}

/// Documents that carry their own id.
pub trait Identified {
    fn doc_id(&self) -> DocId;
}
