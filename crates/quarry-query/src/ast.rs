//! Query tree.
//!
//! A [`QueryNode`] is a finite tree owned through `Box`es and `Vec`s. It is a
//! pure description: the same tree always compiles to an equivalent engine query.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{QueryError, QueryTerm};

/// A backend-independent query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryNode {
    /// Matches every document.
    MatchAll,

    /// Matches documents whose field holds exactly this term, without analysis.
    Term {
        /// Field to look in.
        field: String,
        /// Literal value to look up.
        term: QueryTerm,
    },

    /// Matches documents containing any token of the analyzed text.
    Match {
        /// Field to look in; its analyzer tokenizes `text`.
        field: String,
        /// Free text.
        text: String,
    },

    /// Combines clauses.
    ///
    /// A document matches when every `must` clause matches, no `must_not` clause
    /// matches, and at least `minimum_should_match` of the `should` clauses match.
    Boolean {
        /// Clauses in declaration order.
        clauses: Vec<Clause>,
        /// Number of `should` clauses that must match. Zero makes them optional.
        #[serde(default)]
        minimum_should_match: usize,
    },

    /// Matches what the inner query matches, scoring every hit `boost`.
    ConstantScore {
        /// Query deciding the matches.
        query: Box<Self>,
        /// Score given to each match.
        boost: f32,
    },

    /// Multiplies the inner query's score.
    Boosted {
        /// Query being boosted.
        query: Box<Self>,
        /// Score multiplier.
        boost: f32,
    },

    /// Matches values between two bounds.
    Range(RangeQueryNode),
}

/// One clause of a [`QueryNode::Boolean`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    /// Optional clause, counted against `minimum_should_match`.
    Should(QueryNode),
    /// Required clause.
    Must(QueryNode),
    /// Excluding clause.
    MustNot(QueryNode),
}

/// Bounds over one field.
///
/// Both endpoints always share a [`crate::TermKind`]; the only way to build one is
/// [`RangeQueryNode::new`] (or deserialization, which goes through it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeParts", into = "RangeParts")]
pub struct RangeQueryNode {
    /// Field to look in.
    field: String,
    /// Lower endpoint.
    lower: QueryTerm,
    /// Upper endpoint.
    upper: QueryTerm,
    /// Whether `lower` itself matches.
    include_lower: bool,
    /// Whether `upper` itself matches.
    include_upper: bool,
}

/// Serialized form of a [`RangeQueryNode`], validated on the way in.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeParts {
    /// Field to look in.
    field: String,
    /// Lower endpoint.
    lower: QueryTerm,
    /// Upper endpoint.
    upper: QueryTerm,
    /// Whether `lower` itself matches.
    #[serde(default)]
    include_lower: bool,
    /// Whether `upper` itself matches.
    #[serde(default)]
    include_upper: bool,
}

impl RangeQueryNode {
    /// Creates a range, rejecting endpoints of different kinds.
    pub fn new(
        field: impl Into<String>,
        lower: QueryTerm,
        upper: QueryTerm,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Self, QueryError> {
        let field = field.into();
        if lower.kind() != upper.kind() {
            return Err(QueryError::RangeKindMismatch {
                field,
                lower: lower.kind(),
                upper: upper.kind(),
            });
        }
        Ok(Self {
            field,
            lower,
            upper,
            include_lower,
            include_upper,
        })
    }

    /// Field the range applies to.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Lower endpoint.
    pub fn lower(&self) -> &QueryTerm {
        &self.lower
    }

    /// Upper endpoint.
    pub fn upper(&self) -> &QueryTerm {
        &self.upper
    }

    /// Whether the lower endpoint is inclusive.
    pub fn include_lower(&self) -> bool {
        self.include_lower
    }

    /// Whether the upper endpoint is inclusive.
    pub fn include_upper(&self) -> bool {
        self.include_upper
    }
}

impl TryFrom<RangeParts> for RangeQueryNode {
    type Error = QueryError;

    fn try_from(parts: RangeParts) -> Result<Self, Self::Error> {
        Self::new(
            parts.field,
            parts.lower,
            parts.upper,
            parts.include_lower,
            parts.include_upper,
        )
    }
}

impl From<RangeQueryNode> for RangeParts {
    fn from(range: RangeQueryNode) -> Self {
        Self {
            field: range.field,
            lower: range.lower,
            upper: range.upper,
            include_lower: range.include_lower,
            include_upper: range.include_upper,
        }
    }
}

impl Clause {
    /// Creates an optional clause.
    pub fn should(query: QueryNode) -> Self {
        Self::Should(query)
    }

    /// Creates a required clause.
    pub fn must(query: QueryNode) -> Self {
        Self::Must(query)
    }

    /// Creates an excluding clause.
    pub fn must_not(query: QueryNode) -> Self {
        Self::MustNot(query)
    }

    /// The query wrapped by this clause.
    pub fn query(&self) -> &QueryNode {
        match self {
            Self::Should(q) | Self::Must(q) | Self::MustNot(q) => q,
        }
    }

    /// Label used by the tree printer.
    fn label(&self) -> &'static str {
        match self {
            Self::Should(_) => "Should",
            Self::Must(_) => "Must",
            Self::MustNot(_) => "MustNot",
        }
    }
}

impl QueryNode {
    /// Creates a term query.
    pub fn term(field: impl Into<String>, term: impl Into<QueryTerm>) -> Self {
        Self::Term {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Creates an analyzed text query.
    pub fn matching(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Creates a boolean query.
    pub fn boolean(clauses: Vec<Clause>, minimum_should_match: usize) -> Self {
        Self::Boolean {
            clauses,
            minimum_should_match,
        }
    }

    /// Creates a constant score query.
    pub fn constant_score(query: Self, boost: f32) -> Self {
        Self::ConstantScore {
            query: Box::new(query),
            boost,
        }
    }

    /// Creates a boosted query.
    pub fn boosted(query: Self, boost: f32) -> Self {
        Self::Boosted {
            query: Box::new(query),
            boost,
        }
    }

    /// Creates a range query, rejecting endpoints of different kinds.
    pub fn range(
        field: impl Into<String>,
        lower: impl Into<QueryTerm>,
        upper: impl Into<QueryTerm>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Self, QueryError> {
        RangeQueryNode::new(
            field,
            lower.into(),
            upper.into(),
            include_lower,
            include_upper,
        )
        .map(Self::Range)
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::MatchAll => writeln!(f, "{prefix}MatchAll"),
            Self::Term { field, term } => writeln!(f, "{prefix}Term({field}: {term})"),
            Self::Match { field, text } => writeln!(f, "{prefix}Match({field}: {text:?})"),
            Self::Boolean {
                clauses,
                minimum_should_match,
            } => {
                writeln!(f, "{prefix}Boolean(min_should={minimum_should_match})")?;
                for clause in clauses {
                    writeln!(f, "{prefix}  {}", clause.label())?;
                    clause.query().fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
            Self::ConstantScore { query, boost } => {
                writeln!(f, "{prefix}ConstantScore({boost})")?;
                query.fmt_tree(f, indent + 1)
            }
            Self::Boosted { query, boost } => {
                writeln!(f, "{prefix}Boosted({boost})")?;
                query.fmt_tree(f, indent + 1)
            }
            Self::Range(range) => {
                let open = if range.include_lower { '[' } else { '{' };
                let close = if range.include_upper { ']' } else { '}' };
                writeln!(
                    f,
                    "{prefix}Range({}: {open}{} TO {}{close})",
                    range.field, range.lower, range.upper
                )
            }
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TermKind;

    /// The query used throughout the book catalogue tests.
    fn lucene_or_isbn() -> QueryNode {
        QueryNode::boolean(
            vec![
                Clause::should(QueryNode::matching("title", "lucene")),
                Clause::should(QueryNode::term("isbn", "55063554A")),
            ],
            1,
        )
    }

    #[test]
    fn range_rejects_mixed_kinds() {
        let err = QueryNode::range("isbn", "100", 200.0, true, true).unwrap_err();
        assert_eq!(
            err,
            QueryError::RangeKindMismatch {
                field: "isbn".into(),
                lower: TermKind::String,
                upper: TermKind::Number,
            }
        );
    }

    #[test]
    fn range_accepts_same_kind() {
        let node = RangeQueryNode::new("year", 1990.0.into(), 2000.0.into(), true, false).unwrap();
        assert_eq!(node.field(), "year");
        assert_eq!(node.lower(), &QueryTerm::Number(1990.0));
        assert!(node.include_lower());
        assert!(!node.include_upper());
    }

    #[test]
    fn json_boolean() {
        let json = r#"{
            "boolean": {
                "clauses": [
                    {"should": {"match": {"field": "title", "text": "lucene"}}},
                    {"should": {"term": {"field": "isbn", "term": {"string": "55063554A"}}}}
                ],
                "minimum_should_match": 1
            }
        }"#;
        let parsed: QueryNode = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, lucene_or_isbn());

        let reparsed: QueryNode =
            serde_json::from_str(&serde_json::to_string(&parsed).unwrap()).unwrap();
        assert_eq!(reparsed, parsed);
    }

    #[test]
    fn json_match_all_and_wrappers() {
        let parsed: QueryNode = serde_json::from_str(r#""match_all""#).unwrap();
        assert_eq!(parsed, QueryNode::MatchAll);

        let parsed: QueryNode =
            serde_json::from_str(r#"{"boosted": {"query": "match_all", "boost": 2.0}}"#).unwrap();
        assert_eq!(parsed, QueryNode::boosted(QueryNode::MatchAll, 2.0));

        let parsed: QueryNode = serde_json::from_str(
            r#"{"constant_score": {"query": {"match": {"field": "title", "text": "x"}}, "boost": 5}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            QueryNode::constant_score(QueryNode::matching("title", "x"), 5.0)
        );
    }

    #[test]
    fn json_minimum_should_match_defaults_to_zero() {
        let parsed: QueryNode = serde_json::from_str(
            r#"{"boolean": {"clauses": [{"must_not": "match_all"}]}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            QueryNode::boolean(vec![Clause::must_not(QueryNode::MatchAll)], 0)
        );
    }

    #[test]
    fn json_rejects_unknown_variant() {
        let result: Result<QueryNode, _> =
            serde_json::from_str(r#"{"fuzzy": {"field": "title", "text": "lucene"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn json_rejects_mixed_range() {
        let json = r#"{"range": {
            "field": "isbn",
            "lower": {"string": "1"},
            "upper": {"boolean": true},
            "include_lower": true,
            "include_upper": true
        }}"#;
        let err = serde_json::from_str::<QueryNode>(json).unwrap_err();
        assert!(err.to_string().contains("mixes a string lower bound"));
    }

    #[test]
    fn json_range() {
        let json = r#"{"range": {
            "field": "isbn",
            "lower": {"string": "1"},
            "upper": {"string": "6"},
            "include_lower": true
        }}"#;
        let parsed: QueryNode = serde_json::from_str(json).unwrap();
        let QueryNode::Range(range) = parsed else {
            panic!("expected range");
        };
        assert!(range.include_lower());
        assert!(!range.include_upper());
    }

    #[test]
    fn display_tree() {
        let rendered = lucene_or_isbn().to_string();
        assert_eq!(
            rendered,
            "Boolean(min_should=1)\n  Should\n    Match(title: \"lucene\")\n  Should\n    Term(isbn: \"55063554A\")\n"
        );

        let range = QueryNode::range("isbn", "1", "6", true, false).unwrap();
        assert_eq!(range.to_string(), "Range(isbn: [\"1\" TO \"6\"})\n");
    }

    #[test]
    fn clause_query_accessor() {
        let clause = Clause::must_not(QueryNode::MatchAll);
        assert_eq!(clause.query(), &QueryNode::MatchAll);
    }
}
