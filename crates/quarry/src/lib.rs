//! quarry: book search with computed relevance scores.
//!
//! quarry indexes a catalogue of books (title and ISBN) with Tantivy and ranks matches
//! by a score computed from each book's stored fields. The scoring bindings live in
//! `.quarry.toml`; queries are JSON documents describing a [`quarry_query::QueryNode`].

#![warn(missing_docs)]

pub mod cli;
