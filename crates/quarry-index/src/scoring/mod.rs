//! Scoring variable graph.
//!
//! Scores are computed from named variables. Leaf variables read a stored field of the
//! current document; derived variables apply a typed Rust function to earlier
//! variables. The graph is declared once, checked for wiring and type errors, and then
//! instantiated per search against that search's [`FieldSupplier`](crate::FieldSupplier).
//! Each instantiated variable is memoized per document, so a variable feeding several
//! others is computed once per document.

mod function;
mod graph;
mod registry;
mod value;

use std::sync::Arc;

pub use function::{RegisteredFunction, ScoreFunction};
pub use graph::{GraphError, ScoreVariables, ScoringGraph, ScoringGraphBuilder};
pub use registry::FunctionRegistry;
pub use value::{ScoreValue, Value, ValueType};

use crate::ScoringError;

/// Produces a variable's value for the current document.
pub type Provider = Arc<dyn Fn() -> Result<Value, ScoringError> + Send + Sync>;

/// Produces the score of the current document.
pub type ScoreFn = Arc<dyn Fn() -> Result<f32, ScoringError> + Send + Sync>;
