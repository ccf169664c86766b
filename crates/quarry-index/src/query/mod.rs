//! Query compilation.
//!
//! Lowers [`quarry_query::QueryNode`] trees into Tantivy queries:
//!
//! - **Match all** becomes `AllQuery`
//! - **Term** looks up one rendered term with `TermQuery`
//! - **Match** analyzes its text and ORs one `TermQuery` per token
//! - **Boolean** maps clauses onto `Occur`, with [`MinimumShouldMatchQuery`]
//!   enforcing the required number of `should` matches
//! - **Constant score**, **boosted** and **range** map to their Tantivy counterparts

mod compile;
mod render;
mod should_match;

pub use compile::{CompileError, QueryCompiler};
pub use render::{CanonicalTermRenderer, TermRenderer};
pub use should_match::MinimumShouldMatchQuery;
use tantivy::{DocId, TantivyError};

/// The error Tantivy's own queries return when asked to explain a non-matching document.
pub(crate) fn does_not_match(doc: DocId) -> TantivyError {
    TantivyError::InvalidArgument(format!("Document #({doc}) does not match"))
}
