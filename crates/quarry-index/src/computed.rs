//! A query whose score comes from a scoring function instead of term statistics.
//!
//! [`ComputedScoreQuery`] wraps another query. The inner query decides which documents
//! match; its own score is discarded. For each match the scorer announces the segment
//! and document to a [`DocContext`], then calls the score function, which reads
//! whatever that context now points at.
//!
//! Scorers cannot return errors, so a failing score function is recorded in a slot on
//! the query and the document scores `0.0`. Callers check
//! [`ComputedScoreQuery::take_failure`] after collecting.

use std::{borrow::Cow, fmt, sync::Arc};

use parking_lot::Mutex;
use tantivy::{
    DocId, DocSet, Score, SegmentReader, TantivyError, Term,
    query::{EnableScoring, Explanation, Query, Scorer, Weight},
};
use tracing::warn;

use crate::{ScoringError, context::DocContext, query::does_not_match, scoring::ScoreFn};

/// Query normalization factor. Tantivy has no query normalization, so it is fixed.
const QUERY_NORM: Score = 1.0;

/// First failure seen while scoring, shared by a query and its scorers.
type FailureSlot = Arc<Mutex<Option<ScoringError>>>;

/// Matches what `inner` matches, scored by `score_fn`.
pub struct ComputedScoreQuery {
    /// Receives segment and document transitions before each score.
    doc_context: Arc<dyn DocContext>,
    /// Computes the current document's score.
    score_fn: ScoreFn,
    /// First scoring failure of the search.
    failure: FailureSlot,
    /// Decides which documents match.
    inner: Box<dyn Query>,
    /// Multiplier applied to every computed score.
    boost: Score,
}

impl Clone for ComputedScoreQuery {
    fn clone(&self) -> Self {
        Self {
            doc_context: Arc::clone(&self.doc_context),
            score_fn: self.score_fn.clone(),
            failure: Arc::clone(&self.failure),
            inner: self.inner.box_clone(),
            boost: self.boost,
        }
    }
}

impl ComputedScoreQuery {
    /// Creates the query with a boost of `1.0`.
    pub fn new(
        inner: Box<dyn Query>,
        doc_context: Arc<dyn DocContext>,
        score_fn: ScoreFn,
    ) -> Self {
        Self {
            doc_context,
            score_fn,
            failure: Arc::default(),
            inner,
            boost: 1.0,
        }
    }

    /// Sets the boost.
    #[must_use]
    pub fn with_boost(mut self, boost: Score) -> Self {
        self.boost = boost;
        self
    }

    /// The matching query.
    pub fn inner(&self) -> &dyn Query {
        self.inner.as_ref()
    }

    /// The boost.
    pub fn boost(&self) -> Score {
        self.boost
    }

    /// Removes and returns the first scoring failure, if any.
    pub fn take_failure(&self) -> Option<ScoringError> {
        self.failure.lock().take()
    }

    /// Rewrites the inner query.
    ///
    /// If `rewrite` returns a new inner query, the result is a new query sharing this
    /// one's boost, score function, doc context and failure slot. Otherwise `self` is
    /// returned unchanged.
    pub fn rewrite<F>(&self, rewrite: F) -> Cow<'_, Self>
    where
        F: FnOnce(&dyn Query) -> Option<Box<dyn Query>>,
    {
        match rewrite(self.inner.as_ref()) {
            Some(inner) => Cow::Owned(Self {
                doc_context: Arc::clone(&self.doc_context),
                score_fn: Arc::clone(&self.score_fn),
                failure: Arc::clone(&self.failure),
                inner,
                boost: self.boost,
            }),
            None => Cow::Borrowed(self),
        }
    }
}

impl fmt::Debug for ComputedScoreQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedScoreQuery")
            .field("inner", &self.inner)
            .field("boost", &self.boost)
            .finish_non_exhaustive()
    }
}

impl Query for ComputedScoreQuery {
    fn weight(&self, enable_scoring: EnableScoring<'_>) -> tantivy::Result<Box<dyn Weight>> {
        Ok(Box::new(ComputedWeight {
            inner: self.inner.weight(enable_scoring)?,
            doc_context: Arc::clone(&self.doc_context),
            score_fn: Arc::clone(&self.score_fn),
            failure: Arc::clone(&self.failure),
            boost: self.boost,
        }))
    }

    fn query_terms<'a>(&'a self, visitor: &mut dyn FnMut(&'a Term, bool)) {
        self.inner.query_terms(visitor);
    }
}

/// Weight of a [`ComputedScoreQuery`].
struct ComputedWeight {
    /// Weight of the matching query.
    inner: Box<dyn Weight>,
    /// See [`ComputedScoreQuery`].
    doc_context: Arc<dyn DocContext>,
    /// See [`ComputedScoreQuery`].
    score_fn: ScoreFn,
    /// See [`ComputedScoreQuery`].
    failure: FailureSlot,
    /// See [`ComputedScoreQuery`].
    boost: Score,
}

impl ComputedWeight {
    /// Multiplier applied to computed scores.
    fn normalize(&self, norm: Score, top_level_boost: Score) -> Score {
        self.boost * norm * top_level_boost
    }
}

impl Weight for ComputedWeight {
    fn scorer(&self, reader: &SegmentReader, boost: Score) -> tantivy::Result<Box<dyn Scorer>> {
        Ok(Box::new(ComputedScorer {
            inner: self.inner.scorer(reader, boost)?,
            segment: reader.clone(),
            state: SegmentState::Pending,
            last_doc: None,
            doc_context: Arc::clone(&self.doc_context),
            score_fn: Arc::clone(&self.score_fn),
            failure: Arc::clone(&self.failure),
            weight: self.normalize(QUERY_NORM, boost),
        }))
    }

    fn explain(&self, reader: &SegmentReader, doc: DocId) -> tantivy::Result<Explanation> {
        let mut scorer = self.inner.scorer(reader, 1.0)?;
        // A fresh scorer already sits on its first match and cannot seek backwards.
        if scorer.doc() > doc || scorer.seek(doc) != doc {
            return Err(does_not_match(doc));
        }

        self.doc_context
            .on_segment(reader)
            .map_err(|err| scoring_failed(&err))?;
        self.doc_context.on_doc(doc);
        let computed = (self.score_fn)().map_err(|err| scoring_failed(&err))?;

        let weight = self.normalize(QUERY_NORM, 1.0);
        let mut explanation = Explanation::new("ComputedScore, product of:", computed * weight);
        explanation.add_detail(Explanation::new("computed score", computed));
        explanation.add_detail(Explanation::new("boost", self.boost));
        explanation.add_detail(Explanation::new("queryNorm", QUERY_NORM));
        Ok(explanation)
    }
}

/// Reports a scoring failure through Tantivy's error type.
fn scoring_failed(err: &ScoringError) -> TantivyError {
    TantivyError::InternalError(format!("computed score failed: {err}"))
}

/// Whether the scorer's segment has been announced to the doc context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentState {
    /// Not announced yet.
    Pending,
    /// Announced successfully.
    Entered,
    /// Announcing failed; documents of this segment score `0.0`.
    Failed,
}

/// Delegates matching to the inner scorer and substitutes the computed score.
struct ComputedScorer {
    /// Inner scorer, used only as a match iterator.
    inner: Box<dyn Scorer>,
    /// Segment being scored.
    segment: SegmentReader,
    /// Whether `segment` has been announced.
    state: SegmentState,
    /// Last document announced.
    last_doc: Option<DocId>,
    /// See [`ComputedScoreQuery`].
    doc_context: Arc<dyn DocContext>,
    /// See [`ComputedScoreQuery`].
    score_fn: ScoreFn,
    /// See [`ComputedScoreQuery`].
    failure: FailureSlot,
    /// Normalized query weight.
    weight: Score,
}

impl ComputedScorer {
    /// Brings the doc context up to date and computes the current document's score.
    ///
    /// `None` if the segment could not be entered.
    fn computed(&mut self) -> Result<Option<Score>, ScoringError> {
        match self.state {
            SegmentState::Failed => return Ok(None),
            SegmentState::Pending => {
                self.state = SegmentState::Failed;
                self.doc_context.on_segment(&self.segment)?;
                self.state = SegmentState::Entered;
            }
            SegmentState::Entered => {}
        }

        let doc = self.inner.doc();
        if self.last_doc != Some(doc) {
            self.doc_context.on_doc(doc);
            self.last_doc = Some(doc);
        }
        (self.score_fn)().map(Some)
    }

    /// Keeps the first failure of the search.
    fn record(&self, err: ScoringError) {
        warn!(doc = self.inner.doc(), error = %err, "score function failed");
        let mut slot = self.failure.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

impl DocSet for ComputedScorer {
    fn advance(&mut self) -> DocId {
        self.inner.advance()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        self.inner.seek(target)
    }

    fn doc(&self) -> DocId {
        self.inner.doc()
    }

    fn size_hint(&self) -> u32 {
        self.inner.size_hint()
    }
}

impl Scorer for ComputedScorer {
    fn score(&mut self) -> Score {
        match self.computed() {
            Ok(Some(score)) => score * self.weight,
            Ok(None) => 0.0,
            Err(err) => {
                self.record(err);
                0.0
            }
        }
    }
}
