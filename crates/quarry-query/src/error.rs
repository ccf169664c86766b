//! Error types for query tree construction.

use thiserror::Error;

use crate::TermKind;

/// Errors raised while building a query tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A range was given endpoints of different kinds.
    #[error("range on field '{field}' mixes a {lower} lower bound with a {upper} upper bound")]
    RangeKindMismatch {
        /// Field the range applies to.
        field: String,
        /// Kind of the lower endpoint.
        lower: TermKind,
        /// Kind of the upper endpoint.
        upper: TermKind,
    },
}
