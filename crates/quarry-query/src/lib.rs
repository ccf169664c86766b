//! Backend-independent query trees for quarry search.
//!
//! Client code describes what it wants to find as a small expression tree of
//! [`QueryNode`]s whose leaves carry typed [`QueryTerm`] literals. The tree knows
//! nothing about the index engine; `quarry-index` lowers it to a Tantivy query.
//!
//! - **Match all**: every document
//! - **Term**: an exact, unanalyzed value in one field
//! - **Match**: free text, analyzed with the field's analyzer
//! - **Boolean**: `should` / `must` / `must_not` clauses with a minimum-should-match
//! - **Constant score** and **boosted** wrappers
//! - **Range**: bounds over a single field, both endpoints of the same kind
//!
//! Trees serialize to JSON with snake_case, externally tagged variants.
//!
//! # Example
//!
//! ```
//! use quarry_query::{Clause, QueryNode, QueryTerm};
//!
//! let query = QueryNode::boolean(
//!     vec![
//!         Clause::should(QueryNode::matching("title", "lucene")),
//!         Clause::should(QueryNode::term("isbn", QueryTerm::from("55063554A"))),
//!     ],
//!     1,
//! );
//! assert!(query.to_string().starts_with("Boolean(min_should=1)"));
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod term;

pub use ast::{Clause, QueryNode, RangeQueryNode};
pub use error::QueryError;
pub use term::{Point, QueryTerm, TermKind};
