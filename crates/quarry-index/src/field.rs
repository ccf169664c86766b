//! Stored-field access for the document being scored.

use std::sync::Arc;

use parking_lot::Mutex;
use quarry_config::FieldKind;
use tantivy::{
    DocId, SegmentReader, TantivyDocument,
    schema::{Field, OwnedValue, Schema, Value as _},
    store::StoreReader,
};

use crate::{
    ScoringError,
    context::DocContext,
    scoring::{Provider, Value},
};

/// Decompressed doc store blocks kept per segment.
const STORE_CACHE_BLOCKS: usize = 100;

/// Reads stored fields of the current document.
///
/// One supplier exists per search. It learns the current segment and document through
/// [`DocContext`], and hands out accessors that fetch a field of whatever document is
/// current at the time they are called. Accessors read the store on every call.
pub struct FieldSupplier {
    /// Schema used to resolve field names.
    schema: Schema,
    /// Current position.
    state: Mutex<Position>,
}

/// The supplier's view of "current".
#[derive(Default)]
struct Position {
    /// Doc store of the current segment.
    store: Option<Arc<StoreReader>>,
    /// Current document within that segment.
    doc: Option<DocId>,
}

impl FieldSupplier {
    /// Creates a supplier with no current document.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            state: Mutex::new(Position::default()),
        }
    }

    /// Accessor for the first value of a text field.
    pub fn string(
        self: &Arc<Self>,
        name: &str,
    ) -> Result<impl Fn() -> Result<String, ScoringError> + Send + Sync + 'static, ScoringError>
    {
        self.single(name, |value| value.as_str().map(str::to_string))
    }

    /// Accessor for every value of a text field.
    pub fn strings(
        self: &Arc<Self>,
        name: &str,
    ) -> Result<impl Fn() -> Result<Vec<String>, ScoringError> + Send + Sync + 'static, ScoringError>
    {
        self.all(name, |value| value.as_str().map(str::to_string))
    }

    /// Accessor for the first value of a field as bytes.
    ///
    /// Text values are returned as their UTF-8 encoding.
    pub fn bytes(
        self: &Arc<Self>,
        name: &str,
    ) -> Result<impl Fn() -> Result<Vec<u8>, ScoringError> + Send + Sync + 'static, ScoringError>
    {
        self.single(name, raw_bytes)
    }

    /// Accessor for every value of a field as bytes.
    pub fn bytes_list(
        self: &Arc<Self>,
        name: &str,
    ) -> Result<impl Fn() -> Result<Vec<Vec<u8>>, ScoringError> + Send + Sync + 'static, ScoringError>
    {
        self.all(name, raw_bytes)
    }

    /// Type-erased accessor for a leaf binding.
    pub(crate) fn provider(
        self: &Arc<Self>,
        name: &str,
        kind: FieldKind,
    ) -> Result<Provider, ScoringError> {
        let provider: Provider = match kind {
            FieldKind::String => {
                let read = self.string(name)?;
                Arc::new(move || read().map(Value::Str))
            }
            FieldKind::Strings => {
                let read = self.strings(name)?;
                Arc::new(move || read().map(Value::Strs))
            }
            FieldKind::Bytes => {
                let read = self.bytes(name)?;
                Arc::new(move || read().map(Value::Bytes))
            }
            FieldKind::BytesList => {
                let read = self.bytes_list(name)?;
                Arc::new(move || read().map(Value::BytesList))
            }
        };
        Ok(provider)
    }

    /// Builds an accessor returning the first convertible value of a field.
    fn single<T: 'static>(
        self: &Arc<Self>,
        name: &str,
        convert: fn(&OwnedValue) -> Option<T>,
    ) -> Result<impl Fn() -> Result<T, ScoringError> + Send + Sync + 'static, ScoringError> {
        let field = self.resolve(name)?;
        let supplier = Arc::clone(self);
        let name = name.to_string();
        Ok(move || {
            let (doc, stored) = supplier.current()?;
            stored
                .get_all(field)
                .find_map(convert)
                .ok_or_else(|| ScoringError::MissingField {
                    field: name.clone(),
                    doc,
                })
        })
    }

    /// Builds an accessor returning every convertible value of a field.
    fn all<T: 'static>(
        self: &Arc<Self>,
        name: &str,
        convert: fn(&OwnedValue) -> Option<T>,
    ) -> Result<impl Fn() -> Result<Vec<T>, ScoringError> + Send + Sync + 'static, ScoringError>
    {
        let field = self.resolve(name)?;
        let supplier = Arc::clone(self);
        Ok(move || {
            let (_, stored) = supplier.current()?;
            Ok(stored.get_all(field).filter_map(convert).collect())
        })
    }

    /// Resolves a field name.
    fn resolve(&self, name: &str) -> Result<Field, ScoringError> {
        self.schema
            .get_field(name)
            .map_err(|_| ScoringError::UnknownField(name.to_string()))
    }

    /// Loads the current document from the store.
    fn current(&self) -> Result<(DocId, TantivyDocument), ScoringError> {
        let (store, doc) = {
            let state = self.state.lock();
            match (&state.store, state.doc) {
                (Some(store), Some(doc)) => (Arc::clone(store), doc),
                _ => return Err(ScoringError::NoContext),
            }
        };
        let stored = store
            .get::<TantivyDocument>(doc)
            .map_err(|e| ScoringError::Store(e.to_string()))?;
        Ok((doc, stored))
    }
}

impl DocContext for FieldSupplier {
    fn on_segment(&self, segment: &SegmentReader) -> Result<(), ScoringError> {
        let store = segment
            .get_store_reader(STORE_CACHE_BLOCKS)
            .map_err(|e| ScoringError::Store(e.to_string()))?;
        let mut state = self.state.lock();
        state.store = Some(Arc::new(store));
        state.doc = None;
        Ok(())
    }

    fn on_doc(&self, doc: DocId) {
        self.state.lock().doc = Some(doc);
    }
}

/// Bytes of a value; text yields its UTF-8 encoding.
fn raw_bytes(value: &OwnedValue) -> Option<Vec<u8>> {
    value
        .as_bytes()
        .or_else(|| value.as_str().map(str::as_bytes))
        .map(<[u8]>::to_vec)
}
