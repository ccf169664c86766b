//! Documents stored in the index and hits returned from it.

use serde::{Deserialize, Serialize};
use tantivy::{
    TantivyDocument,
    schema::{Field, Value},
};

use crate::IndexSchema;

/// A book in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    /// Book title.
    pub title: String,
    /// Book ISBN.
    pub isbn: String,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// The stored document.
    pub doc: Doc,
    /// Computed relevance score.
    pub score: f32,
}

impl Doc {
    /// Creates a document.
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            isbn: isbn.into(),
        }
    }

    /// Converts to a Tantivy document for indexing.
    pub(crate) fn to_document(&self, schema: &IndexSchema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(schema.title, &self.title);
        doc.add_text(schema.isbn, &self.isbn);
        doc
    }

    /// Reads a stored Tantivy document back. Absent fields come back empty.
    pub(crate) fn from_document(doc: &TantivyDocument, schema: &IndexSchema) -> Self {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            title: text(schema.title),
            isbn: text(schema.isbn),
        }
    }
}
