//! Index schema for the book catalogue.
//!
//! - `title`: analyzed with [`QUARRY_TOKENIZER`], positions indexed, stored
//! - `isbn`: a single untokenized term, stored

use tantivy::schema::{
    Field, FieldType, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};

use crate::analyzer::QUARRY_TOKENIZER;

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Book title.
    pub title: Field,
    /// Book ISBN.
    pub isbn: Field,
}

impl IndexSchema {
    /// Creates the schema.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let title_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(QUARRY_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();
        let title = builder.add_text_field("title", title_options);

        // Exact lookups only: "55063554A" is indexed as one term.
        let isbn = builder.add_text_field("isbn", STRING | STORED);

        Self {
            schema: builder.build(),
            title,
            isbn,
        }
    }

    /// Returns the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.schema.get_field(name).ok()
    }

    /// Returns the tokenizer name a text field is indexed with, if any.
    pub fn tokenizer(&self, field: Field) -> Option<&str> {
        match self.schema.get_field_entry(field).field_type() {
            FieldType::Str(options) => options
                .get_indexing_options()
                .map(TextFieldIndexing::tokenizer),
            _ => None,
        }
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}
