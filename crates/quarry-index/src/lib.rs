//! Tantivy-backed search with computed scores for quarry.
//!
//! This crate turns [`quarry_query`] trees into Tantivy queries and ranks their
//! matches with scores computed from stored fields rather than term statistics.
//! It handles:
//! - Query compilation, including minimum-should-match boolean queries
//! - A scoring variable graph of stored-field leaves and typed Rust functions
//! - Per-search scopes that tell scoring code which document is being scored
//! - Index creation, writing, committing and searching through [`SearchService`]
//!
//! # Example
//!
//! ```
//! use quarry_config::{IndexSettings, ScoringSettings};
//! use quarry_index::{Doc, FunctionRegistry, ScoringGraph, SearchService};
//! use quarry_query::QueryNode;
//!
//! // The default graph scores a book by the length of its title plus its ISBN.
//! let graph =
//!     ScoringGraph::from_config(&ScoringSettings::default(), &FunctionRegistry::builtin())
//!         .unwrap();
//! let service = SearchService::in_memory(&IndexSettings::default(), graph, "weird_score").unwrap();
//!
//! service.add_doc(&Doc::new("Managing Gigabytes", "55063554A")).unwrap();
//! service.commit().unwrap();
//!
//! let hits = service.search_docs(&QueryNode::matching("title", "gigabytes"), 10).unwrap();
//! assert_eq!(hits[0].score, 27.0);
//! ```

#![warn(missing_docs)]

mod analyzer;
mod computed;
mod context;
mod document;
mod error;
mod field;
mod query;
mod schema;
mod scope;
mod scoring;
mod service;
#[cfg(test)]
mod test_support;

pub use analyzer::{QUARRY_TOKENIZER, parse_language, register_analyzer};
pub use computed::ComputedScoreQuery;
pub use context::{CompositeDocContext, DocContext};
pub use document::{Doc, Hit};
pub use error::{IndexError, ScoringError, SearchError};
pub use field::FieldSupplier;
pub use query::{
    CanonicalTermRenderer, CompileError, MinimumShouldMatchQuery, QueryCompiler, TermRenderer,
};
pub use schema::IndexSchema;
pub use scope::{ScopeListener, SearchScope};
pub use scoring::{
    FunctionRegistry, GraphError, Provider, RegisteredFunction, ScoreFn, ScoreFunction,
    ScoreValue, ScoreVariables, ScoringGraph, ScoringGraphBuilder, Value, ValueType,
};
pub use service::{SearchService, ServiceState};
