//! Test helpers shared across quarry-index unit tests.
//!
//! Kept behind `cfg(test)` to avoid leaking into the public API surface.

use tantivy::{Index, IndexWriter, SegmentReader};

use crate::{Doc, IndexSchema, analyzer::register_analyzer};

/// The four books of the catalogue, as `(title, isbn)`.
pub const BOOKS: [(&str, &str); 4] = [
    ("Lucene in Action", "193398817"),
    ("Lucene for Dummies", "55320055Z"),
    ("Managing Gigabytes", "55063554A"),
    ("The Art of Computer Science", "9900333X"),
];

/// An in-memory index holding [`BOOKS`] in one committed segment, doc ids in order.
pub fn catalogue() -> (Index, IndexSchema) {
    let schema = IndexSchema::new();
    let index = Index::create_in_ram(schema.schema().clone());
    register_analyzer(&index, "english").unwrap();
    // One indexing thread keeps every book in a single segment.
    let mut writer: IndexWriter = index.writer_with_num_threads(1, 15_000_000).unwrap();
    for (title, isbn) in BOOKS {
        writer
            .add_document(Doc::new(title, isbn).to_document(&schema))
            .unwrap();
    }
    writer.commit().unwrap();
    (index, schema)
}

/// The first segment of a committed index.
pub fn first_segment(index: &Index) -> SegmentReader {
    index.reader().unwrap().searcher().segment_reader(0).clone()
}
