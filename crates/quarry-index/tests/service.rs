//! End-to-end tests for the search service.

// Integration tests live outside cfg(test)
#![allow(clippy::tests_outside_test_module)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use quarry_config::{FieldKind, IndexSettings, ScoringSettings};
use quarry_index::{
    Doc, FunctionRegistry, Hit, ScopeListener, ScoringGraph, SearchError, SearchScope,
    SearchService, ServiceState,
};
use quarry_query::{Clause, QueryNode};

/// The four books of the catalogue.
const BOOKS: [(&str, &str); 4] = [
    ("Lucene in Action", "193398817"),
    ("Lucene for Dummies", "55320055Z"),
    ("Managing Gigabytes", "55063554A"),
    ("The Art of Computer Science", "9900333X"),
];

/// The default scoring graph.
fn default_graph() -> ScoringGraph {
    ScoringGraph::from_config(&ScoringSettings::default(), &FunctionRegistry::builtin()).unwrap()
}

/// An in-memory service scored by `weird_score`.
fn service() -> SearchService {
    SearchService::in_memory(&IndexSettings::default(), default_graph(), "weird_score").unwrap()
}

/// Adds `books` and commits.
fn index(service: &SearchService, books: &[(&str, &str)]) {
    for (title, isbn) in books {
        service.add_doc(&Doc::new(*title, *isbn)).unwrap();
    }
    service.commit().unwrap();
}

/// `should lucene OR isbn:55063554A`, at least one required.
fn lucene_or_gigabytes() -> QueryNode {
    QueryNode::boolean(
        vec![
            Clause::should(QueryNode::matching("title", "lucene")),
            Clause::should(QueryNode::term("isbn", "55063554A")),
        ],
        1,
    )
}

/// Titles of hits, in rank order.
fn titles(hits: &[Hit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.doc.title.as_str()).collect()
}

#[test]
fn boolean_search_ranks_by_computed_score() {
    let service = service();
    index(&service, &[BOOKS[0], BOOKS[2]]);

    let hits = service.search_docs(&lucene_or_gigabytes(), 10).unwrap();
    assert_eq!(titles(&hits), vec!["Managing Gigabytes", "Lucene in Action"]);
    assert!(hits.iter().all(|hit| hit.score > 0.0));
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn score_is_title_plus_isbn_length() {
    let service = service();
    index(&service, &[BOOKS[0], BOOKS[2]]);

    let hits = service.search_docs(&lucene_or_gigabytes(), 10).unwrap();
    assert_eq!(hits[0].doc, Doc::new("Managing Gigabytes", "55063554A"));
    assert_eq!(hits[0].score, 27.0);
    assert_eq!(hits[1].doc, Doc::new("Lucene in Action", "193398817"));
    assert_eq!(hits[1].score, 25.0);

    let again = service.search_docs(&lucene_or_gigabytes(), 10).unwrap();
    assert_eq!(hits, again);
}

#[test]
fn full_catalogue() {
    let service = service();
    index(&service, &BOOKS);

    let hits = service.search_docs(&QueryNode::MatchAll, 10).unwrap();
    let ranked = titles(&hits);
    assert_eq!(ranked.len(), 4);
    assert_eq!(ranked[0], "The Art of Computer Science");
    assert_eq!(ranked[3], "Lucene in Action");
    // Dummies and Gigabytes tie at 27.
    assert!(ranked[1..3].contains(&"Lucene for Dummies"));
    assert!(ranked[1..3].contains(&"Managing Gigabytes"));
    for hit in &hits {
        let expected = (hit.doc.title.chars().count() + hit.doc.isbn.chars().count()) as f32;
        assert_eq!(hit.score, expected);
    }

    let top = service.search_docs(&QueryNode::MatchAll, 2).unwrap();
    assert_eq!(top, hits[..2]);

    let none = service
        .search_docs(&QueryNode::matching("title", "knuth"), 10)
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn search_before_commit_fails() {
    let service = service();
    assert_eq!(service.state(), ServiceState::NoWriter);
    assert!(matches!(
        service.search_docs(&QueryNode::MatchAll, 10),
        Err(SearchError::NotCommitted)
    ));
    assert!(matches!(
        service.search_docs(&QueryNode::MatchAll, 0),
        Err(SearchError::NotCommitted)
    ));

    service.add_doc(&Doc::new(BOOKS[0].0, BOOKS[0].1)).unwrap();
    assert!(matches!(
        service.search_docs(&QueryNode::MatchAll, 10),
        Err(SearchError::NotCommitted)
    ));
}

#[test]
fn commit_before_add_fails() {
    let service = service();
    assert!(matches!(service.commit(), Err(SearchError::NoPendingWriter)));
}

#[test]
fn uncommitted_docs_are_invisible() {
    let service = service();
    index(&service, &[BOOKS[0]]);
    service.add_doc(&Doc::new(BOOKS[1].0, BOOKS[1].1)).unwrap();

    let hits = service.search_docs(&QueryNode::MatchAll, 10).unwrap();
    assert_eq!(titles(&hits), vec!["Lucene in Action"]);

    service.commit().unwrap();
    assert_eq!(service.search_docs(&QueryNode::MatchAll, 10).unwrap().len(), 2);
}

#[test]
fn compile_errors_surface() {
    let service = service();
    index(&service, &[BOOKS[0]]);
    let err = service
        .search_docs(&QueryNode::term("author", "Knuth"), 10)
        .unwrap_err();
    assert!(matches!(err, SearchError::Compile(_)));
}

#[test]
fn concurrent_writes_and_searches_see_whole_snapshots() {
    let service = service();
    index(&service, &BOOKS);
    let per_writer = 10;

    thread::scope(|scope| {
        for writer in 0..2 {
            let service = &service;
            scope.spawn(move || {
                for i in 0..per_writer {
                    let doc = Doc::new(
                        format!("Volume {i} of set {writer}"),
                        format!("{writer}{i:05}"),
                    );
                    service.add_doc(&doc).unwrap();
                    match service.commit() {
                        Ok(()) | Err(SearchError::NoPendingWriter) => {}
                        Err(err) => panic!("commit failed: {err}"),
                    }
                }
            });
        }

        let service = &service;
        scope.spawn(move || {
            let mut last = 0;
            for _ in 0..20 {
                let hits = service.search_docs(&QueryNode::MatchAll, 1000).unwrap();
                assert!(hits.len() >= last);
                last = hits.len();
                for hit in &hits {
                    let expected =
                        (hit.doc.title.chars().count() + hit.doc.isbn.chars().count()) as f32;
                    assert_eq!(hit.score, expected, "{hit:?}");
                }
            }
        });
    });

    match service.commit() {
        Ok(()) | Err(SearchError::NoPendingWriter) => {}
        Err(err) => panic!("commit failed: {err}"),
    }
    assert_eq!(service.num_docs(), (BOOKS.len() + 2 * per_writer) as u64);
    assert_eq!(service.state(), ServiceState::Committed);
}

#[test]
fn on_disk_index_survives_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let settings = IndexSettings {
        path: Some(temp.path().join("index")),
        ..IndexSettings::default()
    };

    {
        let service = SearchService::open(&settings, default_graph(), "weird_score").unwrap();
        assert_eq!(service.state(), ServiceState::NoWriter);
        index(&service, &BOOKS);
    }
    assert!(temp.path().join("index").join("meta.json").exists());

    let service = SearchService::open(&settings, default_graph(), "weird_score").unwrap();
    assert_eq!(service.state(), ServiceState::Committed);
    assert_eq!(service.num_docs(), 4);
    let hits = service.search_docs(&lucene_or_gigabytes(), 10).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].score, 27.0);
    assert_eq!(hits[1].score, 27.0);
    assert_eq!(hits[2].doc.title, "Lucene in Action");
}

#[test]
fn explanations_match_scores() {
    let service = service();
    index(&service, &BOOKS);

    let explained = service.explain_top(&lucene_or_gigabytes(), 10).unwrap();
    assert_eq!(explained.len(), 3);
    for (hit, explanation) in &explained {
        assert_eq!(explanation.value(), hit.score);
        assert!(explanation.to_pretty_json().contains("computed score"));
    }
}

#[test]
fn custom_graph_and_entry_point() {
    let mut graph = ScoringGraph::builder();
    graph
        .leaf("isbn", "isbn", FieldKind::String)
        .unwrap()
        .derived("digits", &["isbn"], |isbn: String| {
            isbn.chars().filter(char::is_ascii_digit).count() as f32
        })
        .unwrap();
    let service =
        SearchService::in_memory(&IndexSettings::default(), graph.build(), "digits").unwrap();
    index(&service, &BOOKS);

    let hits = service.search_docs(&QueryNode::MatchAll, 1).unwrap();
    assert_eq!(hits[0].doc.isbn, "193398817");
    assert_eq!(hits[0].score, 9.0);
}

/// Counts scope entries and exits.
#[derive(Default)]
struct ScopeCounter {
    /// Scopes entered.
    entered: AtomicUsize,
    /// Scopes left.
    exited: AtomicUsize,
}

impl ScopeListener for ScopeCounter {
    fn on_enter(&self, _scope: &SearchScope) {
        self.entered.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exit(&self, _scope: &SearchScope) {
        self.exited.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn every_search_gets_a_scope() {
    let service = service();
    let counter = Arc::new(ScopeCounter::default());
    service.add_scope_listener(Arc::clone(&counter) as Arc<dyn ScopeListener>);
    index(&service, &BOOKS);

    service.search_docs(&QueryNode::MatchAll, 10).unwrap();
    service.search_docs(&lucene_or_gigabytes(), 10).unwrap();
    assert_eq!(counter.entered.load(Ordering::SeqCst), 2);
    assert_eq!(counter.exited.load(Ordering::SeqCst), 2);
}
