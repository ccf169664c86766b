//! Query compiler.
//!
//! Compiles a [`QueryNode`] tree into a Tantivy query. Compilation is a pure function
//! of the tree, the index's tokenizers and the term renderer: compiling the same tree
//! twice gives queries that match and score identically.

use std::ops::Bound;

use quarry_query::{Clause, QueryError, QueryNode, RangeQueryNode, TermKind};
use tantivy::{
    Term,
    query::{
        AllQuery, BooleanQuery, BoostQuery, ConstScoreQuery, EmptyQuery, Occur, Query,
        RangeQuery, TermQuery,
    },
    schema::{Field, IndexRecordOption},
    tokenizer::{TokenStream, TokenizerManager},
};
use thiserror::Error;
use tracing::debug;

use super::{CanonicalTermRenderer, MinimumShouldMatchQuery, TermRenderer};
use crate::IndexSchema;

/// Error during query compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The query names a field the schema does not have.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// A text query targets a field that is not indexed as text.
    #[error("field '{0}' is not an analyzed text field")]
    NotAnalyzed(String),

    /// The field's tokenizer is not registered with the index.
    #[error("field '{field}' uses tokenizer '{tokenizer}', which is not registered")]
    UnknownTokenizer {
        /// Field being analyzed.
        field: String,
        /// Missing tokenizer name.
        tokenizer: String,
    },

    /// The term has no text form.
    #[error("a {kind} term cannot be looked up in field '{field}'")]
    UnrenderableTerm {
        /// Field being queried.
        field: String,
        /// Kind of the offending term.
        kind: TermKind,
    },

    /// Range endpoints disagree on their kind.
    #[error(transparent)]
    RangeKindMismatch(#[from] QueryError),
}

/// Compiles query trees into Tantivy queries.
pub struct QueryCompiler {
    /// Index schema for field references.
    schema: IndexSchema,
    /// The index's registered tokenizers, used to analyze `Match` text.
    tokenizers: TokenizerManager,
    /// Turns typed terms into index text.
    renderer: Box<dyn TermRenderer>,
}

impl QueryCompiler {
    /// Creates a compiler using the [`CanonicalTermRenderer`].
    pub fn new(schema: IndexSchema, tokenizers: TokenizerManager) -> Self {
        Self::with_renderer(schema, tokenizers, CanonicalTermRenderer)
    }

    /// Creates a compiler with a custom term renderer.
    pub fn with_renderer(
        schema: IndexSchema,
        tokenizers: TokenizerManager,
        renderer: impl TermRenderer + 'static,
    ) -> Self {
        Self {
            schema,
            tokenizers,
            renderer: Box::new(renderer),
        }
    }

    /// Compiles a query tree into a Tantivy query.
    pub fn compile(&self, node: &QueryNode) -> Result<Box<dyn Query>, CompileError> {
        let query = self.compile_node(node)?;
        debug!(query = ?query, "compiled query");
        Ok(query)
    }

    /// Returns the tokens `text` produces under `field`'s analyzer.
    pub fn analyze(&self, field: &str, text: &str) -> Result<Vec<String>, CompileError> {
        let field_handle = self.field(field)?;
        let tokenizer = self
            .schema
            .tokenizer(field_handle)
            .ok_or_else(|| CompileError::NotAnalyzed(field.to_string()))?;
        let mut analyzer =
            self.tokenizers
                .get(tokenizer)
                .ok_or_else(|| CompileError::UnknownTokenizer {
                    field: field.to_string(),
                    tokenizer: tokenizer.to_string(),
                })?;

        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        Ok(tokens)
    }

    /// Compiles one node.
    fn compile_node(&self, node: &QueryNode) -> Result<Box<dyn Query>, CompileError> {
        match node {
            QueryNode::MatchAll => Ok(Box::new(AllQuery)),
            QueryNode::Term { field, term } => {
                let field_handle = self.field(field)?;
                let text = self.renderer.render(field, term)?;
                Ok(Box::new(term_query(field_handle, &text)))
            }
            QueryNode::Match { field, text } => self.compile_match(field, text),
            QueryNode::Boolean {
                clauses,
                minimum_should_match,
            } => self.compile_boolean(clauses, *minimum_should_match),
            QueryNode::ConstantScore { query, boost } => Ok(Box::new(ConstScoreQuery::new(
                self.compile_node(query)?,
                *boost,
            ))),
            QueryNode::Boosted { query, boost } => {
                Ok(Box::new(BoostQuery::new(self.compile_node(query)?, *boost)))
            }
            QueryNode::Range(range) => self.compile_range(range),
        }
    }

    /// Compiles analyzed text into one optional `TermQuery` per token.
    ///
    /// Text that analyzes to nothing yields an empty `BooleanQuery`, which matches
    /// no documents.
    fn compile_match(&self, field: &str, text: &str) -> Result<Box<dyn Query>, CompileError> {
        let field_handle = self.field(field)?;
        let clauses: Vec<(Occur, Box<dyn Query>)> = self
            .analyze(field, text)?
            .iter()
            .map(|token| {
                (
                    Occur::Should,
                    Box::new(term_query(field_handle, token)) as Box<dyn Query>,
                )
            })
            .collect();
        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Compiles boolean clauses.
    ///
    /// With a positive `minimum_should_match`, the `should` clauses are grouped into a
    /// required [`MinimumShouldMatchQuery`]. Otherwise they stay plain `should` clauses:
    /// optional next to a `must` clause, and at least one required without one. A query
    /// made only of `must_not` clauses is anchored on `AllQuery` so that they have
    /// something to subtract from. No clauses at all match nothing.
    fn compile_boolean(
        &self,
        clauses: &[Clause],
        minimum_should_match: usize,
    ) -> Result<Box<dyn Query>, CompileError> {
        if clauses.is_empty() {
            return Ok(Box::new(EmptyQuery));
        }

        let mut required = Vec::new();
        let mut optional = Vec::new();
        let mut excluded = Vec::new();
        for clause in clauses {
            let query = self.compile_node(clause.query())?;
            match clause {
                Clause::Should(_) => optional.push(query),
                Clause::Must(_) => required.push(query),
                Clause::MustNot(_) => excluded.push(query),
            }
        }

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> =
            required.into_iter().map(|q| (Occur::Must, q)).collect();
        if minimum_should_match == 0 {
            if subqueries.is_empty() && optional.is_empty() {
                subqueries.push((Occur::Must, Box::new(AllQuery)));
            }
            subqueries.extend(optional.into_iter().map(|q| (Occur::Should, q)));
        } else {
            subqueries.push((
                Occur::Must,
                Box::new(MinimumShouldMatchQuery::new(optional, minimum_should_match)),
            ));
        }
        subqueries.extend(excluded.into_iter().map(|q| (Occur::MustNot, q)));

        Ok(Box::new(BooleanQuery::new(subqueries)))
    }

    /// Compiles a range over rendered endpoints.
    fn compile_range(&self, range: &RangeQueryNode) -> Result<Box<dyn Query>, CompileError> {
        // Both endpoints must render under the same kind.
        RangeQueryNode::new(
            range.field(),
            range.lower().clone(),
            range.upper().clone(),
            range.include_lower(),
            range.include_upper(),
        )?;

        let field = range.field();
        self.field(field)?;
        let lower = self.renderer.render(field, range.lower())?;
        let upper = self.renderer.render(field, range.upper())?;
        Ok(Box::new(RangeQuery::new_str_bounds(
            field.to_string(),
            bound(&lower, range.include_lower()),
            bound(&upper, range.include_upper()),
        )))
    }

    /// Resolves a field name against the schema.
    fn field(&self, name: &str) -> Result<Field, CompileError> {
        self.schema
            .field(name)
            .ok_or_else(|| CompileError::UnknownField(name.to_string()))
    }
}

/// Builds a frequency-scored term query.
fn term_query(field: Field, text: &str) -> TermQuery {
    TermQuery::new(
        Term::from_field_text(field, text),
        IndexRecordOption::WithFreqs,
    )
}

/// Builds an inclusive or exclusive bound.
fn bound(value: &str, inclusive: bool) -> Bound<&str> {
    if inclusive {
        Bound::Included(value)
    } else {
        Bound::Excluded(value)
    }
}

#[cfg(test)]
mod tests {
    use quarry_query::Point;
    use tantivy::{
        Index, TantivyDocument,
        collector::{Count, DocSetCollector},
        schema::Value,
    };

    use super::*;
    use crate::test_support;

    /// An in-memory catalogue index and a compiler for it.
    fn catalogue() -> (Index, QueryCompiler) {
        let (index, schema) = test_support::catalogue();
        let compiler = QueryCompiler::new(schema, index.tokenizers().clone());
        (index, compiler)
    }

    /// ISBNs of the books a tree matches, sorted.
    fn matching_isbns(index: &Index, compiler: &QueryCompiler, node: &QueryNode) -> Vec<String> {
        let query = compiler.compile(node).unwrap();
        let searcher = index.reader().unwrap().searcher();
        let schema = IndexSchema::new();
        let mut isbns: Vec<String> = searcher
            .search(&query, &DocSetCollector)
            .unwrap()
            .into_iter()
            .map(|address| {
                let doc: TantivyDocument = searcher.doc(address).unwrap();
                doc.get_first(schema.isbn)
                    .and_then(|v| v.as_str())
                    .unwrap()
                    .to_string()
            })
            .collect();
        isbns.sort();
        isbns
    }

    /// Counts the documents a tree matches.
    fn count(index: &Index, compiler: &QueryCompiler, node: &QueryNode) -> usize {
        let query = compiler.compile(node).unwrap();
        index.reader().unwrap().searcher().search(&query, &Count).unwrap()
    }

    #[test]
    fn match_all() {
        let (index, compiler) = catalogue();
        assert_eq!(count(&index, &compiler, &QueryNode::MatchAll), 4);
    }

    #[test]
    fn term_is_exact() {
        let (index, compiler) = catalogue();
        let node = QueryNode::term("isbn", "55063554A");
        assert_eq!(matching_isbns(&index, &compiler, &node), vec!["55063554A"]);

        let lowercase = QueryNode::term("isbn", "55063554a");
        assert_eq!(count(&index, &compiler, &lowercase), 0);
    }

    #[test]
    fn match_clause_per_token() {
        let (_, compiler) = catalogue();
        let query = compiler
            .compile(&QueryNode::matching("title", "lucene in action"))
            .unwrap();
        let boolean = query.downcast_ref::<BooleanQuery>().unwrap();
        assert_eq!(boolean.clauses().len(), 3);
        assert!(
            boolean
                .clauses()
                .iter()
                .all(|(occur, _)| *occur == Occur::Should)
        );
    }

    #[test]
    fn match_any_token() {
        let (index, compiler) = catalogue();
        let node = QueryNode::matching("title", "lucene gigabytes");
        assert_eq!(
            matching_isbns(&index, &compiler, &node),
            vec!["193398817", "55063554A", "55320055Z"]
        );
    }

    #[test]
    fn match_without_tokens_matches_nothing() {
        let (index, compiler) = catalogue();
        let node = QueryNode::matching("title", "  ,;  ");
        let query = compiler.compile(&node).unwrap();
        let boolean = query.downcast_ref::<BooleanQuery>().unwrap();
        assert!(boolean.clauses().is_empty());
        assert_eq!(count(&index, &compiler, &node), 0);
    }

    #[test]
    fn match_on_raw_field_is_one_token() {
        let (index, compiler) = catalogue();
        assert_eq!(
            compiler.analyze("isbn", "55063554A").unwrap(),
            vec!["55063554A"]
        );
        let node = QueryNode::matching("isbn", "9900333X");
        assert_eq!(count(&index, &compiler, &node), 1);
    }

    #[test]
    fn minimum_should_match() {
        let (index, compiler) = catalogue();
        let should = |minimum| {
            QueryNode::boolean(
                vec![
                    Clause::should(QueryNode::matching("title", "lucene")),
                    Clause::should(QueryNode::matching("title", "dummies")),
                    Clause::should(QueryNode::term("isbn", "55063554A")),
                ],
                minimum,
            )
        };
        assert_eq!(count(&index, &compiler, &should(0)), 3);
        assert_eq!(count(&index, &compiler, &should(1)), 3);
        assert_eq!(
            matching_isbns(&index, &compiler, &should(2)),
            vec!["55320055Z"]
        );
        assert_eq!(count(&index, &compiler, &should(4)), 0);
    }

    #[test]
    fn optional_should_needs_one_match_without_must() {
        let (index, compiler) = catalogue();
        let node = QueryNode::boolean(
            vec![Clause::should(QueryNode::term("isbn", "55063554A"))],
            0,
        );
        assert_eq!(matching_isbns(&index, &compiler, &node), vec!["55063554A"]);
    }

    #[test]
    fn optional_should_next_to_must_only_scores() {
        let (index, compiler) = catalogue();
        let node = QueryNode::boolean(
            vec![
                Clause::must(QueryNode::matching("title", "lucene")),
                Clause::should(QueryNode::term("isbn", "55063554A")),
            ],
            0,
        );
        assert_eq!(
            matching_isbns(&index, &compiler, &node),
            vec!["193398817", "55320055Z"]
        );
    }

    #[test]
    fn empty_boolean_matches_nothing() {
        let (index, compiler) = catalogue();
        assert_eq!(count(&index, &compiler, &QueryNode::boolean(vec![], 0)), 0);
        assert_eq!(count(&index, &compiler, &QueryNode::boolean(vec![], 1)), 0);
    }

    #[test]
    fn should_match_with_exclusions() {
        let (index, compiler) = catalogue();
        let node = QueryNode::boolean(
            vec![
                Clause::should(QueryNode::matching("title", "lucene")),
                Clause::should(QueryNode::matching("title", "dummies")),
                Clause::must_not(QueryNode::term("isbn", "55320055Z")),
            ],
            1,
        );
        assert_eq!(matching_isbns(&index, &compiler, &node), vec!["193398817"]);

        let two = QueryNode::boolean(
            vec![
                Clause::should(QueryNode::matching("title", "lucene")),
                Clause::should(QueryNode::matching("title", "dummies")),
                Clause::must_not(QueryNode::term("isbn", "55320055Z")),
            ],
            2,
        );
        assert_eq!(count(&index, &compiler, &two), 0);
    }

    #[test]
    fn must_and_must_not() {
        let (index, compiler) = catalogue();
        let node = QueryNode::boolean(
            vec![
                Clause::must(QueryNode::matching("title", "lucene")),
                Clause::must_not(QueryNode::matching("title", "dummies")),
            ],
            0,
        );
        assert_eq!(matching_isbns(&index, &compiler, &node), vec!["193398817"]);
    }

    #[test]
    fn negation_only_subtracts_from_everything() {
        let (index, compiler) = catalogue();
        let node = QueryNode::boolean(
            vec![Clause::must_not(QueryNode::matching("title", "lucene"))],
            0,
        );
        assert_eq!(
            matching_isbns(&index, &compiler, &node),
            vec!["55063554A", "9900333X"]
        );
    }

    #[test]
    fn must_with_required_should() {
        let (index, compiler) = catalogue();
        let node = QueryNode::boolean(
            vec![
                Clause::must(QueryNode::matching("title", "lucene")),
                Clause::should(QueryNode::matching("title", "action")),
                Clause::should(QueryNode::matching("title", "art")),
            ],
            1,
        );
        assert_eq!(matching_isbns(&index, &compiler, &node), vec!["193398817"]);
    }

    #[test]
    fn wrappers_keep_matches() {
        let (index, compiler) = catalogue();
        let inner = QueryNode::matching("title", "lucene");
        let constant = QueryNode::constant_score(inner.clone(), 7.0);
        let boosted = QueryNode::boosted(inner, 2.0);
        assert_eq!(count(&index, &compiler, &constant), 2);
        assert_eq!(count(&index, &compiler, &boosted), 2);
    }

    #[test]
    fn range_over_isbns() {
        let (index, compiler) = catalogue();
        let inclusive = QueryNode::range("isbn", "55063554A", "55320055Z", true, true).unwrap();
        assert_eq!(
            matching_isbns(&index, &compiler, &inclusive),
            vec!["55063554A", "55320055Z"]
        );
        let exclusive = QueryNode::range("isbn", "55063554A", "55320055Z", false, false).unwrap();
        assert_eq!(count(&index, &compiler, &exclusive), 0);
    }

    #[test]
    fn compiling_twice_is_equivalent() {
        let (index, compiler) = catalogue();
        let node = QueryNode::boolean(
            vec![
                Clause::should(QueryNode::matching("title", "lucene")),
                Clause::should(QueryNode::term("isbn", "55063554A")),
            ],
            1,
        );
        assert_eq!(
            matching_isbns(&index, &compiler, &node),
            matching_isbns(&index, &compiler, &node)
        );
        assert_eq!(
            format!("{:?}", compiler.compile(&node).unwrap()),
            format!("{:?}", compiler.compile(&node).unwrap())
        );
    }

    #[test]
    fn unknown_field() {
        let (_, compiler) = catalogue();
        let err = compiler
            .compile(&QueryNode::term("author", "Knuth"))
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownField("author".into()));
        let err = compiler
            .compile(&QueryNode::matching("author", "Knuth"))
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownField("author".into()));
    }

    #[test]
    fn point_terms_rejected() {
        let (_, compiler) = catalogue();
        let node = QueryNode::term(
            "isbn",
            Point {
                latitude: 0.0,
                longitude: 0.0,
            },
        );
        assert!(matches!(
            compiler.compile(&node),
            Err(CompileError::UnrenderableTerm { .. })
        ));
    }

    #[test]
    fn unregistered_tokenizer() {
        let schema = IndexSchema::new();
        let compiler = QueryCompiler::new(schema, TokenizerManager::default());
        let err = compiler.analyze("title", "lucene").unwrap_err();
        assert!(matches!(err, CompileError::UnknownTokenizer { .. }));
    }
}
