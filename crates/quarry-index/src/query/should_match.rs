//! Disjunction with a minimum number of matching clauses.

use tantivy::{
    DocId, DocSet, Score, SegmentReader, TERMINATED, Term,
    query::{EmptyScorer, EnableScoring, Explanation, Query, Scorer, Weight},
};

use super::does_not_match;

/// Matches documents matched by at least `minimum` of its subqueries.
///
/// The score of a match is the sum of the scores of the subqueries that match it.
/// A `minimum` larger than the number of subqueries matches nothing.
#[derive(Debug)]
pub struct MinimumShouldMatchQuery {
    /// Candidate clauses.
    subqueries: Vec<Box<dyn Query>>,
    /// How many of them a document must match. Always at least one.
    minimum: usize,
}

impl Clone for MinimumShouldMatchQuery {
    fn clone(&self) -> Self {
        Self {
            subqueries: self.subqueries.iter().map(|query| query.box_clone()).collect(),
            minimum: self.minimum,
        }
    }
}

impl MinimumShouldMatchQuery {
    /// Creates the query. A `minimum` of zero is treated as one.
    pub fn new(subqueries: Vec<Box<dyn Query>>, minimum: usize) -> Self {
        Self {
            subqueries,
            minimum: minimum.max(1),
        }
    }

    /// Number of subqueries a document must match.
    pub fn minimum(&self) -> usize {
        self.minimum
    }

    /// The candidate subqueries.
    pub fn subqueries(&self) -> &[Box<dyn Query>] {
        &self.subqueries
    }
}

impl Query for MinimumShouldMatchQuery {
    fn weight(&self, enable_scoring: EnableScoring<'_>) -> tantivy::Result<Box<dyn Weight>> {
        let weights = self
            .subqueries
            .iter()
            .map(|query| query.weight(enable_scoring))
            .collect::<tantivy::Result<Vec<_>>>()?;
        Ok(Box::new(MinimumShouldMatchWeight {
            weights,
            minimum: self.minimum,
        }))
    }

    fn query_terms<'a>(&'a self, visitor: &mut dyn FnMut(&'a Term, bool)) {
        for query in &self.subqueries {
            query.query_terms(visitor);
        }
    }
}

/// Weight of a [`MinimumShouldMatchQuery`].
struct MinimumShouldMatchWeight {
    /// One weight per subquery.
    weights: Vec<Box<dyn Weight>>,
    /// Required number of matching subqueries.
    minimum: usize,
}

impl Weight for MinimumShouldMatchWeight {
    fn scorer(&self, reader: &SegmentReader, boost: Score) -> tantivy::Result<Box<dyn Scorer>> {
        if self.minimum > self.weights.len() {
            return Ok(Box::new(EmptyScorer));
        }
        let scorers = self
            .weights
            .iter()
            .map(|weight| weight.scorer(reader, boost))
            .collect::<tantivy::Result<Vec<_>>>()?;
        Ok(Box::new(MinimumShouldMatchScorer::new(scorers, self.minimum)))
    }

    fn explain(&self, reader: &SegmentReader, doc: DocId) -> tantivy::Result<Explanation> {
        let mut scorer = self.scorer(reader, 1.0)?;
        if scorer.doc() > doc || scorer.seek(doc) != doc {
            return Err(does_not_match(doc));
        }
        let mut explanation = Explanation::new_with_string(
            format!("sum of at least {} matching clauses:", self.minimum),
            scorer.score(),
        );
        for weight in &self.weights {
            if let Ok(child) = weight.explain(reader, doc) {
                explanation.add_detail(child);
            }
        }
        Ok(explanation)
    }
}

/// Walks the sub-scorers in doc order, stopping on docs enough of them share.
struct MinimumShouldMatchScorer {
    /// Sub-scorers, each positioned at or after the current doc.
    scorers: Vec<Box<dyn Scorer>>,
    /// Required number of sub-scorers on a doc.
    minimum: usize,
    /// Current doc, or `TERMINATED`.
    doc: DocId,
}

impl MinimumShouldMatchScorer {
    /// Creates the scorer positioned on its first match.
    fn new(scorers: Vec<Box<dyn Scorer>>, minimum: usize) -> Self {
        let mut scorer = Self {
            scorers,
            minimum,
            doc: TERMINATED,
        };
        scorer.align();
        scorer
    }

    /// Moves to the lowest doc that at least `minimum` sub-scorers are on.
    ///
    /// Sub-scorers sitting on a rejected candidate are advanced past it.
    fn align(&mut self) -> DocId {
        loop {
            let candidate = self
                .scorers
                .iter()
                .map(|scorer| scorer.doc())
                .min()
                .unwrap_or(TERMINATED);
            if candidate == TERMINATED {
                self.doc = TERMINATED;
                return TERMINATED;
            }

            let on_candidate = self
                .scorers
                .iter()
                .filter(|scorer| scorer.doc() == candidate)
                .count();
            if on_candidate >= self.minimum {
                self.doc = candidate;
                return candidate;
            }

            for scorer in &mut self.scorers {
                if scorer.doc() == candidate {
                    scorer.advance();
                }
            }
        }
    }
}

impl DocSet for MinimumShouldMatchScorer {
    fn advance(&mut self) -> DocId {
        if self.doc == TERMINATED {
            return TERMINATED;
        }
        let current = self.doc;
        for scorer in &mut self.scorers {
            if scorer.doc() == current {
                scorer.advance();
            }
        }
        self.align()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if self.doc >= target {
            return self.doc;
        }
        for scorer in &mut self.scorers {
            if scorer.doc() < target {
                scorer.seek(target);
            }
        }
        self.align()
    }

    fn doc(&self) -> DocId {
        self.doc
    }

    fn size_hint(&self) -> u32 {
        self.scorers
            .iter()
            .map(|scorer| scorer.size_hint())
            .max()
            .unwrap_or(0)
    }
}

impl Scorer for MinimumShouldMatchScorer {
    fn score(&mut self) -> Score {
        let doc = self.doc;
        self.scorers
            .iter_mut()
            .filter(|scorer| scorer.doc() == doc)
            .map(|scorer| scorer.score())
            .sum()
    }
}
