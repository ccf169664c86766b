//! Current-document notifications pushed from the scorer.
//!
//! While a search runs, the computed-score scorer announces each segment it enters
//! and each document it is about to score. Anything that needs to know "which
//! document is this" implements [`DocContext`] and is registered with the search scope.

use std::sync::Arc;

use tantivy::{DocId, SegmentReader};

use crate::ScoringError;

/// Receives segment and document transitions.
///
/// Implementations use interior mutability: one instance is shared by reference between
/// the scorer and every provider that reads from it.
pub trait DocContext: Send + Sync {
    /// The scorer moved to a new segment. Document ids that follow are local to it.
    fn on_segment(&self, segment: &SegmentReader) -> Result<(), ScoringError>;

    /// The scorer is about to score `doc` in the current segment.
    fn on_doc(&self, doc: DocId);
}

/// Forwards every transition to its children, in order.
///
/// A failing child does not stop the others from being notified; the first failure
/// is returned once all children have seen the segment.
#[derive(Default, Clone)]
pub struct CompositeDocContext {
    /// Children in notification order.
    children: Vec<Arc<dyn DocContext>>,
}

impl CompositeDocContext {
    /// Creates a composite over `children`.
    pub fn new(children: Vec<Arc<dyn DocContext>>) -> Self {
        Self { children }
    }

    /// Appends a child.
    pub fn push(&mut self, child: Arc<dyn DocContext>) {
        self.children.push(child);
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl DocContext for CompositeDocContext {
    fn on_segment(&self, segment: &SegmentReader) -> Result<(), ScoringError> {
        let mut first_error = None;
        for child in &self.children {
            if let Err(err) = child.on_segment(segment)
                && first_error.is_none()
            {
                first_error = Some(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn on_doc(&self, doc: DocId) {
        for child in &self.children {
            child.on_doc(doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::test_support;

    /// Records the transitions it sees into a shared log.
    struct Recorder {
        /// Name used in log entries.
        name: &'static str,
        /// Shared log.
        log: Arc<Mutex<Vec<String>>>,
        /// Whether `on_segment` fails.
        fail: bool,
    }

    impl DocContext for Recorder {
        fn on_segment(&self, _segment: &SegmentReader) -> Result<(), ScoringError> {
            self.log.lock().push(format!("{}:segment", self.name));
            if self.fail {
                Err(ScoringError::Store(format!("{} failed", self.name)))
            } else {
                Ok(())
            }
        }

        fn on_doc(&self, doc: DocId) {
            self.log.lock().push(format!("{}:{doc}", self.name));
        }
    }

    /// The catalogue's only segment.
    fn segment() -> SegmentReader {
        test_support::first_segment(&test_support::catalogue().0)
    }

    /// A composite over recorders named `a`, `b`, `c`; those in `failing` fail.
    fn composite(log: &Arc<Mutex<Vec<String>>>, failing: &[&str]) -> CompositeDocContext {
        let children = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                Arc::new(Recorder {
                    name,
                    log: Arc::clone(log),
                    fail: failing.contains(&name),
                }) as Arc<dyn DocContext>
            })
            .collect();
        CompositeDocContext::new(children)
    }

    #[test]
    fn fans_out_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let context = composite(&log, &[]);
        context.on_segment(&segment()).unwrap();
        context.on_doc(7);
        assert_eq!(
            *log.lock(),
            vec!["a:segment", "b:segment", "c:segment", "a:7", "b:7", "c:7"]
        );
    }

    #[test]
    fn failure_does_not_short_circuit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let context = composite(&log, &["a", "b"]);
        let err = context.on_segment(&segment()).unwrap_err();
        assert_eq!(err.to_string(), "failed to read stored document: a failed");
        assert_eq!(*log.lock(), vec!["a:segment", "b:segment", "c:segment"]);
    }

    #[test]
    fn empty_composite() {
        let context = CompositeDocContext::default();
        assert!(context.is_empty());
        context.on_segment(&segment()).unwrap();
        context.on_doc(0);
    }
}
