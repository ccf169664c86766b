//! Search service: the write and search entry points over one index.
//!
//! The service moves through three states:
//!
//! - **No writer**: nothing added since the index was opened empty. Searches fail.
//! - **Writing**: documents have been added but not committed. Searches see the last
//!   committed snapshot, if there is one.
//! - **Committed**: the last commit is visible to searches.
//!
//! Writes serialize on the writer slot. Searches clone the current searcher snapshot
//! and run without holding any lock, so a commit never waits for a search.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use quarry_config::{Config, IndexSettings};
use quarry_query::QueryNode;
use tantivy::{
    DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Score, Searcher, TantivyDocument,
    TantivyError,
    collector::TopDocs,
    directory::MmapDirectory,
    query::{Explanation, Query},
};
use tracing::{debug, info, warn};

use crate::{
    Doc, Hit, IndexError, IndexSchema, SearchError,
    analyzer::register_analyzer,
    computed::ComputedScoreQuery,
    query::QueryCompiler,
    scope::{ScopeListener, SearchScope},
    scoring::{FunctionRegistry, ScoringGraph},
};

/// Location reported for in-memory indexes.
const IN_MEMORY: &str = "<memory>";

/// Lifecycle state of a [`SearchService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No documents added and none committed.
    NoWriter,
    /// Documents added since the last commit.
    Writing,
    /// Everything added has been committed.
    Committed,
}

/// Indexes books and runs scored searches over them.
pub struct SearchService {
    /// The Tantivy index.
    index: Index,
    /// Field handles.
    schema: IndexSchema,
    /// Lowers query trees to Tantivy queries.
    compiler: QueryCompiler,
    /// Scoring variables, instantiated per search.
    graph: ScoringGraph,
    /// Name of the float variable used as the score.
    score: String,
    /// Writer heap size in bytes.
    heap_size: usize,
    /// Reader reloaded after each commit.
    reader: IndexReader,
    /// Writer holding uncommitted documents.
    writer: Mutex<Option<IndexWriter>>,
    /// Snapshot searches run against. `None` until the first commit.
    searcher: RwLock<Option<Searcher>>,
    /// Notified around every search.
    listeners: RwLock<Vec<Arc<dyn ScopeListener>>>,
}

impl SearchService {
    /// Creates a service over an existing Tantivy index.
    ///
    /// The index must use [`IndexSchema`]. The title analyzer for `settings.language`
    /// is registered on it, and the scoring graph is checked against the schema and
    /// the `score` entry point.
    pub fn new(
        index: Index,
        settings: &IndexSettings,
        graph: ScoringGraph,
        score: &str,
    ) -> Result<Self, SearchError> {
        Self::with_location(index, PathBuf::from(IN_MEMORY), settings, graph, score)
    }

    /// Creates a service over a fresh in-memory index.
    pub fn in_memory(
        settings: &IndexSettings,
        graph: ScoringGraph,
        score: &str,
    ) -> Result<Self, SearchError> {
        let index = Index::create_in_ram(IndexSchema::new().schema().clone());
        Self::new(index, settings, graph, score)
    }

    /// Opens or creates the index at `path`.
    ///
    /// An index that already holds committed documents starts in
    /// [`ServiceState::Committed`].
    pub fn open_dir(
        path: &Path,
        settings: &IndexSettings,
        graph: ScoringGraph,
        score: &str,
    ) -> Result<Self, SearchError> {
        fs::create_dir_all(path).map_err(IndexError::from)?;

        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;
        let index = Index::open_or_create(dir, IndexSchema::new().schema().clone())
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;

        Self::with_location(index, path.to_path_buf(), settings, graph, score)
    }

    /// Opens the index `settings` describe: on disk if it has a path, in memory otherwise.
    pub fn open(
        settings: &IndexSettings,
        graph: ScoringGraph,
        score: &str,
    ) -> Result<Self, SearchError> {
        match &settings.path {
            Some(path) => Self::open_dir(path, settings, graph, score),
            None => Self::in_memory(settings, graph, score),
        }
    }

    /// Opens the index and scoring graph a loaded configuration describes.
    pub fn from_config(config: &Config, registry: &FunctionRegistry) -> Result<Self, SearchError> {
        let graph = ScoringGraph::from_config(&config.scoring, registry)?;
        Self::open(&config.index, graph, &config.search.score)
    }

    /// Shared constructor; `location` is only used in errors and logs.
    fn with_location(
        index: Index,
        location: PathBuf,
        settings: &IndexSettings,
        graph: ScoringGraph,
        score: &str,
    ) -> Result<Self, SearchError> {
        register_analyzer(&index, &settings.language)?;
        let schema = IndexSchema::new();
        graph.validate_fields(&schema)?;
        graph.check_entry(score)?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| IndexError::open_index(location.clone(), &e))?;
        let snapshot = reader.searcher();
        let searcher = if snapshot.segment_readers().is_empty() {
            None
        } else {
            Some(snapshot)
        };

        info!(
            location = %location.display(),
            docs = searcher.as_ref().map_or(0, Searcher::num_docs),
            score,
            "opened search service"
        );

        Ok(Self {
            compiler: QueryCompiler::new(schema.clone(), index.tokenizers().clone()),
            index,
            schema,
            graph,
            score: score.to_string(),
            heap_size: settings.heap_size,
            reader,
            writer: Mutex::new(None),
            searcher: RwLock::new(searcher),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Adds a document. It becomes searchable after the next [`commit`](Self::commit).
    pub fn add_doc(&self, doc: &Doc) -> Result<(), SearchError> {
        let mut slot = self.writer.lock();
        let writer = match slot.take() {
            Some(writer) => writer,
            None => {
                let writer = self
                    .index
                    .writer(self.heap_size)
                    .map_err(|e| IndexError::write(&e))?;
                info!(heap_size = self.heap_size, "opened index writer");
                writer
            }
        };
        let writer = slot.insert(writer);
        writer
            .add_document(doc.to_document(&self.schema))
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Commits every added document and publishes a new search snapshot.
    ///
    /// Fails with [`SearchError::NoPendingWriter`] if nothing was added since the last
    /// commit. If the commit itself fails, the added documents stay pending. Once the
    /// commit is durable, a new snapshot is published even if finishing merges or
    /// reloading the reader fails; that failure is still returned.
    pub fn commit(&self) -> Result<(), SearchError> {
        let mut slot = self.writer.lock();
        let Some(mut writer) = slot.take() else {
            return Err(SearchError::NoPendingWriter);
        };
        if let Err(e) = writer.commit() {
            *slot = Some(writer);
            return Err(IndexError::commit(&e).into());
        }
        let merged = writer
            .wait_merging_threads()
            .map_err(|e| IndexError::commit(&e));
        self.publish(merged)
    }

    /// Reloads the reader and swaps in its snapshot, then reports `merged`.
    ///
    /// Only called after a successful commit, so the snapshot is swapped even when
    /// `merged` or the reload failed.
    fn publish(&self, merged: Result<(), IndexError>) -> Result<(), SearchError> {
        let reloaded = self.reader.reload().map_err(|e| IndexError::commit(&e));
        let searcher = self.reader.searcher();
        let docs = searcher.num_docs();
        *self.searcher.write() = Some(searcher);

        if let Err(err) = merged.and(reloaded) {
            warn!(docs, error = %err, "committed index, but publishing was incomplete");
            return Err(err.into());
        }
        info!(docs, "committed index");
        Ok(())
    }

    /// Runs `query` and returns up to `max_hits` hits, best first.
    ///
    /// Hits are scored by the configured score variable. Equal scores are ordered by
    /// document address.
    pub fn search_docs(
        &self,
        query: &QueryNode,
        max_hits: usize,
    ) -> Result<Vec<Hit>, SearchError> {
        self.collect(query, max_hits, |searcher, _, score, address| {
            self.hit(searcher, score, address)
        })
    }

    /// Like [`search_docs`](Self::search_docs), pairing each hit with its explanation.
    pub fn explain_top(
        &self,
        query: &QueryNode,
        max_hits: usize,
    ) -> Result<Vec<(Hit, Explanation)>, SearchError> {
        self.collect(query, max_hits, |searcher, computed, score, address| {
            let explanation = computed
                .explain(searcher, address)
                .map_err(|e| IndexError::search(&e))?;
            Ok((self.hit(searcher, score, address)?, explanation))
        })
    }

    /// Number of documents in the committed snapshot.
    pub fn num_docs(&self) -> u64 {
        self.searcher.read().as_ref().map_or(0, Searcher::num_docs)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        if self.writer.lock().is_some() {
            ServiceState::Writing
        } else if self.searcher.read().is_some() {
            ServiceState::Committed
        } else {
            ServiceState::NoWriter
        }
    }

    /// Registers a listener notified around every subsequent search.
    pub fn add_scope_listener(&self, listener: Arc<dyn ScopeListener>) {
        self.listeners.write().push(listener);
    }

    /// The scoring graph.
    pub fn graph(&self) -> &ScoringGraph {
        &self.graph
    }

    /// The query compiler.
    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Runs a scored search and maps each top hit with `each`.
    fn collect<T>(
        &self,
        query: &QueryNode,
        max_hits: usize,
        each: impl Fn(&Searcher, &ComputedScoreQuery, Score, DocAddress) -> Result<T, SearchError>,
    ) -> Result<Vec<T>, SearchError> {
        let searcher = self
            .searcher
            .read()
            .clone()
            .ok_or(SearchError::NotCommitted)?;
        let compiled = self.compiler.compile(query)?;
        if max_hits == 0 {
            return Ok(Vec::new());
        }

        let listeners = self.listeners.read().clone();
        let scope = SearchScope::enter(searcher, &self.schema, &self.graph, listeners)?;
        let computed =
            ComputedScoreQuery::new(compiled, scope.doc_context(), scope.score_fn(&self.score)?);

        let top = scope
            .searcher()
            .search(&computed, &TopDocs::with_limit(max_hits))
            .map_err(|e| IndexError::search(&e))?;
        if let Some(err) = computed.take_failure() {
            return Err(err.into());
        }

        let results = top
            .into_iter()
            .map(|(score, address)| each(scope.searcher(), &computed, score, address))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(max_hits, hits = results.len(), "search finished");
        Ok(results)
    }

    /// Loads a hit's stored document.
    fn hit(
        &self,
        searcher: &Searcher,
        score: Score,
        address: DocAddress,
    ) -> Result<Hit, SearchError> {
        let stored: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| IndexError::search(&e))?;
        Ok(Hit {
            doc: Doc::from_document(&stored, &self.schema),
            score,
        })
    }
}
