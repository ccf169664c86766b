//! Rendering typed query terms into index terms.

use quarry_query::QueryTerm;

use super::CompileError;

/// Turns a [`QueryTerm`] into the text stored in the index.
pub trait TermRenderer: Send + Sync {
    /// Renders `term` for a lookup in `field`.
    fn render(&self, field: &str, term: &QueryTerm) -> Result<String, CompileError>;
}

/// Renders strings verbatim, numbers in canonical decimal form (`3.0` becomes `"3"`),
/// and booleans as `"true"` / `"false"`. Points have no text form.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalTermRenderer;

impl TermRenderer for CanonicalTermRenderer {
    fn render(&self, field: &str, term: &QueryTerm) -> Result<String, CompileError> {
        match term {
            QueryTerm::String(s) => Ok(s.clone()),
            QueryTerm::Number(n) => Ok(n.to_string()),
            QueryTerm::Boolean(b) => Ok(b.to_string()),
            QueryTerm::Point(_) => Err(CompileError::UnrenderableTerm {
                field: field.to_string(),
                kind: term.kind(),
            }),
        }
    }
}
