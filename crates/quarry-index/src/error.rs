//! Error types for the quarry-index crate.

use std::{io, path::PathBuf};

use quarry_query::QueryError;
use thiserror::Error;

use crate::{query::CompileError, scoring::GraphError};

/// Errors raised by the index engine.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Index directory, or `<memory>` for an in-memory index.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// Failed to execute a search.
    #[error("search failed: {0}")]
    Search(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid stemmer language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub(crate) fn open_index(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `Write` error from a Tantivy error.
    pub(crate) fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub(crate) fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }

    /// Creates a `Search` error from a Tantivy error.
    pub(crate) fn search(source: &tantivy::TantivyError) -> Self {
        Self::Search(source.to_string())
    }
}

/// Errors reported while evaluating a score for one document.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// A field was read before any segment or document was announced.
    #[error("no current document: field values are only available while scoring")]
    NoContext,

    /// The current document has no value for a single-valued field read.
    #[error("document {doc} has no value for field '{field}'")]
    MissingField {
        /// Field that was read.
        field: String,
        /// Segment-local document id.
        doc: u32,
    },

    /// A leaf binding names a field the schema does not have.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// Reading the stored document failed.
    #[error("failed to read stored document: {0}")]
    Store(String),

    /// A provider produced a value of the wrong type.
    #[error("binding '{name}' produced {found}, expected {expected}")]
    ValueType {
        /// Binding being read.
        name: String,
        /// Type the reader required.
        expected: crate::ValueType,
        /// Type actually produced.
        found: crate::ValueType,
    },
}

/// Errors returned by the search service.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A search was attempted before the first commit.
    #[error("no committed documents to search; add documents and commit first")]
    NotCommitted,

    /// `commit` was called with no documents added since the last commit.
    #[error("nothing to commit; add documents first")]
    NoPendingWriter,

    /// The query tree could not be built.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The query tree could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The scoring graph is misconfigured.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A score could not be computed.
    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    /// The index engine failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}
