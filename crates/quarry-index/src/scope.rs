//! Per-search scope.
//!
//! Every search gets its own [`FieldSupplier`], scoring variables and doc context.
//! [`SearchScope`] owns them for the duration of one search, and tells registered
//! [`ScopeListener`]s when a search starts and when it ends. The end is signalled from
//! `Drop`, so listeners see it on every exit path, including errors.

use std::sync::Arc;

use tantivy::Searcher;
use tracing::debug;

use crate::{
    FieldSupplier, IndexSchema,
    context::{CompositeDocContext, DocContext},
    scoring::{GraphError, ScoreFn, ScoreVariables, ScoringGraph},
};

/// Observes search scopes.
pub trait ScopeListener: Send + Sync {
    /// A search is about to run.
    fn on_enter(&self, scope: &SearchScope);

    /// A search finished, successfully or not.
    fn on_exit(&self, scope: &SearchScope);
}

/// The objects living for the duration of one search.
pub struct SearchScope {
    /// Snapshot the search runs against.
    searcher: Searcher,
    /// Stored-field reader for the current document.
    fields: Arc<FieldSupplier>,
    /// Scoring variables bound to `fields`.
    variables: Arc<ScoreVariables>,
    /// Fans transitions out to `fields`, then `variables`.
    doc_context: Arc<CompositeDocContext>,
    /// Notified on enter and exit.
    listeners: Vec<Arc<dyn ScopeListener>>,
}

impl SearchScope {
    /// Creates the scope's objects and notifies `listeners`, in order.
    pub fn enter(
        searcher: Searcher,
        schema: &IndexSchema,
        graph: &ScoringGraph,
        listeners: Vec<Arc<dyn ScopeListener>>,
    ) -> Result<Self, GraphError> {
        let fields = Arc::new(FieldSupplier::new(schema.schema().clone()));
        let variables = Arc::new(graph.instantiate(&fields)?);
        let children: Vec<Arc<dyn DocContext>> = vec![
            Arc::clone(&fields) as Arc<dyn DocContext>,
            Arc::clone(&variables) as Arc<dyn DocContext>,
        ];
        let scope = Self {
            searcher,
            fields,
            variables,
            doc_context: Arc::new(CompositeDocContext::new(children)),
            listeners,
        };

        debug!(
            segments = scope.searcher.segment_readers().len(),
            listeners = scope.listeners.len(),
            "entering search scope"
        );
        for listener in &scope.listeners {
            listener.on_enter(&scope);
        }
        Ok(scope)
    }

    /// The searcher snapshot.
    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    /// The scope's field supplier.
    pub fn fields(&self) -> &Arc<FieldSupplier> {
        &self.fields
    }

    /// The scope's scoring variables.
    pub fn variables(&self) -> &Arc<ScoreVariables> {
        &self.variables
    }

    /// The doc context scorers of this search must notify.
    pub fn doc_context(&self) -> Arc<dyn DocContext> {
        Arc::clone(&self.doc_context) as Arc<dyn DocContext>
    }

    /// The score function for the variable `entry`.
    pub fn score_fn(&self, entry: &str) -> Result<ScoreFn, GraphError> {
        self.variables.score_fn(entry)
    }
}

impl Drop for SearchScope {
    fn drop(&mut self) {
        for listener in self.listeners.iter().rev() {
            listener.on_exit(self);
        }
        debug!("left search scope");
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use quarry_config::ScoringSettings;

    use super::*;
    use crate::{scoring::FunctionRegistry, test_support};

    /// Logs scope events under a name.
    struct Logger {
        /// Name used in log entries.
        name: &'static str,
        /// Shared log.
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScopeListener for Logger {
        fn on_enter(&self, scope: &SearchScope) {
            let docs = scope.searcher().num_docs();
            self.log.lock().push(format!("enter {} ({docs})", self.name));
        }

        fn on_exit(&self, _scope: &SearchScope) {
            self.log.lock().push(format!("exit {}", self.name));
        }
    }

    /// Enters a scope over the catalogue with listeners `a` and `b`.
    fn enter(log: &Arc<Mutex<Vec<String>>>) -> SearchScope {
        let (index, schema) = test_support::catalogue();
        let graph =
            ScoringGraph::from_config(&ScoringSettings::default(), &FunctionRegistry::builtin())
                .unwrap();
        let listeners = ["a", "b"]
            .into_iter()
            .map(|name| {
                Arc::new(Logger {
                    name,
                    log: Arc::clone(log),
                }) as Arc<dyn ScopeListener>
            })
            .collect();
        SearchScope::enter(index.reader().unwrap().searcher(), &schema, &graph, listeners).unwrap()
    }

    #[test]
    fn listeners_bracket_the_scope() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scope = enter(&log);
        assert_eq!(*log.lock(), vec!["enter a (4)", "enter b (4)"]);
        drop(scope);
        assert_eq!(
            *log.lock(),
            vec!["enter a (4)", "enter b (4)", "exit b", "exit a"]
        );
    }

    #[test]
    fn exit_runs_on_early_return() {
        /// Enters a scope, then fails.
        fn failing_search(log: &Arc<Mutex<Vec<String>>>) -> Result<(), GraphError> {
            let scope = enter(log);
            scope.score_fn("title")?;
            Ok(())
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        assert!(failing_search(&log).is_err());
        assert_eq!(log.lock().last().map(String::as_str), Some("exit a"));
    }

    #[test]
    fn doc_context_drives_variables() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let scope = enter(&log);
        let score = scope.score_fn("weird_score").unwrap();
        let context = scope.doc_context();
        context
            .on_segment(scope.searcher().segment_reader(0))
            .unwrap();
        context.on_doc(3);
        assert_eq!(score().unwrap(), 35.0);
        assert_eq!(
            scope.variables().value("isbn").unwrap().unwrap(),
            crate::scoring::Value::Str("9900333X".into())
        );
    }
}
