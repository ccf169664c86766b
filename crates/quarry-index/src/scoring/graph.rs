//! Graph declaration, validation and per-search instantiation.

use std::{
    collections::{HashMap, HashSet},
    mem,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use quarry_config::{FieldKind, ScoringSettings};
use tantivy::{DocId, SegmentReader};
use thiserror::Error;
use tracing::debug;

use super::{
    FunctionRegistry, Provider, RegisteredFunction, ScoreFn, ScoreFunction, Value, ValueType,
};
use crate::{FieldSupplier, IndexSchema, ScoringError, context::DocContext};

/// Error in the declaration of a scoring graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two variables share a name.
    #[error("scoring variable '{0}' is defined more than once")]
    DuplicateName(String),

    /// An input names no variable.
    #[error("scoring variable '{name}' uses '{input}', which is not defined")]
    UnresolvedInput {
        /// Variable being declared.
        name: String,
        /// Input that could not be found.
        input: String,
    },

    /// An input names a variable declared later. Inputs must be declared first, which
    /// also rules out cycles.
    #[error("scoring variable '{name}' uses '{input}', which is declared after it")]
    ForwardReference {
        /// Variable being declared.
        name: String,
        /// Input declared later.
        input: String,
    },

    /// The number of inputs differs from the function's arity.
    #[error("scoring variable '{name}' passes {found} inputs to a function taking {expected}")]
    ArityMismatch {
        /// Variable being declared.
        name: String,
        /// Function arity.
        expected: usize,
        /// Number of inputs given.
        found: usize,
    },

    /// An input's type differs from the function's parameter type.
    #[error("scoring variable '{name}' expects {expected} for '{input}', which is {found}")]
    TypeMismatch {
        /// Variable being declared.
        name: String,
        /// Offending input.
        input: String,
        /// Parameter type.
        expected: ValueType,
        /// Input type.
        found: ValueType,
    },

    /// A derived binding names a function the registry does not have.
    #[error("scoring variable '{name}' uses unknown function '{function}'")]
    UnknownFunction {
        /// Variable being declared.
        name: String,
        /// Missing function.
        function: String,
    },

    /// The score entry point is not a variable of the graph.
    #[error("score entry point '{0}' is not a scoring variable")]
    UnknownEntry(String),

    /// The score entry point does not produce a float.
    #[error("score entry point '{name}' is {found}, expected float")]
    EntryNotFloat {
        /// Entry point.
        name: String,
        /// Its type.
        found: ValueType,
    },

    /// A leaf reads a field the index schema does not have.
    #[error("scoring variable '{name}' reads unknown field '{field}'")]
    UnknownField {
        /// Leaf variable.
        name: String,
        /// Missing field.
        field: String,
    },
}

/// Where a variable's value comes from.
#[derive(Debug, Clone)]
enum Source {
    /// A stored field of the current document.
    Leaf {
        /// Field name.
        field: String,
        /// How the field is read.
        kind: FieldKind,
    },
    /// A function of earlier variables.
    Derived {
        /// Positions of the inputs in the node list.
        inputs: Vec<usize>,
        /// The function.
        function: RegisteredFunction,
    },
}

/// One declared variable.
#[derive(Debug, Clone)]
struct Node {
    /// Variable name.
    name: String,
    /// Type of the value it produces.
    output: ValueType,
    /// How it is computed.
    source: Source,
}

/// Declares a [`ScoringGraph`] one variable at a time.
///
/// Every input must already be declared when a derived variable is added, so the
/// declaration order is a valid evaluation order.
#[derive(Debug, Default)]
pub struct ScoringGraphBuilder {
    /// Variables in declaration order.
    nodes: Vec<Node>,
    /// Name to position.
    positions: HashMap<String, usize>,
}

impl ScoringGraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable reading `field` of the current document.
    pub fn leaf(
        &mut self,
        name: &str,
        field: &str,
        kind: FieldKind,
    ) -> Result<&mut Self, GraphError> {
        self.check_unique(name)?;
        let output = match kind {
            FieldKind::String => ValueType::Str,
            FieldKind::Strings => ValueType::Strs,
            FieldKind::Bytes => ValueType::Bytes,
            FieldKind::BytesList => ValueType::BytesList,
        };
        self.push(Node {
            name: name.to_string(),
            output,
            source: Source::Leaf {
                field: field.to_string(),
                kind,
            },
        });
        Ok(self)
    }

    /// Declares a variable computed by `function` from `inputs`, in argument order.
    pub fn derived<Marker, Func>(
        &mut self,
        name: &str,
        inputs: &[&str],
        function: Func,
    ) -> Result<&mut Self, GraphError>
    where
        Marker: 'static,
        Func: ScoreFunction<Marker>,
    {
        let inputs: Vec<String> = inputs.iter().map(|input| (*input).to_string()).collect();
        self.derived_registered(name, &inputs, RegisteredFunction::new(function))
    }

    /// Declares a derived variable from an already registered function.
    pub fn derived_registered(
        &mut self,
        name: &str,
        inputs: &[String],
        function: RegisteredFunction,
    ) -> Result<&mut Self, GraphError> {
        self.check_unique(name)?;
        if inputs.len() != function.inputs().len() {
            return Err(GraphError::ArityMismatch {
                name: name.to_string(),
                expected: function.inputs().len(),
                found: inputs.len(),
            });
        }

        let mut positions = Vec::with_capacity(inputs.len());
        for (input, &expected) in inputs.iter().zip(function.inputs()) {
            let position =
                *self
                    .positions
                    .get(input)
                    .ok_or_else(|| GraphError::UnresolvedInput {
                        name: name.to_string(),
                        input: input.clone(),
                    })?;
            let found = self.nodes[position].output;
            if found != expected {
                return Err(GraphError::TypeMismatch {
                    name: name.to_string(),
                    input: input.clone(),
                    expected,
                    found,
                });
            }
            positions.push(position);
        }

        self.push(Node {
            name: name.to_string(),
            output: function.output(),
            source: Source::Derived {
                inputs: positions,
                function,
            },
        });
        Ok(self)
    }

    /// Finishes the declaration.
    pub fn build(&mut self) -> ScoringGraph {
        let builder = mem::take(self);
        ScoringGraph {
            nodes: builder.nodes.into(),
            positions: Arc::new(builder.positions),
        }
    }

    /// Rejects a name that is already declared.
    fn check_unique(&self, name: &str) -> Result<(), GraphError> {
        if self.positions.contains_key(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Appends a validated node.
    fn push(&mut self, node: Node) {
        self.positions.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
    }
}

/// A validated scoring graph.
///
/// Cheap to clone. Call [`instantiate`](Self::instantiate) once per search.
#[derive(Debug, Clone)]
pub struct ScoringGraph {
    /// Variables in evaluation order.
    nodes: Arc<[Node]>,
    /// Name to position.
    positions: Arc<HashMap<String, usize>>,
}

impl ScoringGraph {
    /// Starts declaring a graph.
    pub fn builder() -> ScoringGraphBuilder {
        ScoringGraphBuilder::new()
    }

    /// Builds the graph declared by configuration bindings.
    ///
    /// Leaves are declared first, then derived bindings in file order.
    pub fn from_config(
        settings: &ScoringSettings,
        registry: &FunctionRegistry,
    ) -> Result<Self, GraphError> {
        let mut builder = ScoringGraphBuilder::new();
        for leaf in &settings.leaf {
            builder.leaf(&leaf.name, &leaf.field, leaf.kind)?;
        }

        let declared: HashSet<&str> = settings
            .leaf
            .iter()
            .map(|leaf| leaf.name.as_str())
            .chain(settings.derived.iter().map(|derived| derived.name.as_str()))
            .collect();
        for derived in &settings.derived {
            let function = registry.get(&derived.function).ok_or_else(|| {
                GraphError::UnknownFunction {
                    name: derived.name.clone(),
                    function: derived.function.clone(),
                }
            })?;
            let result =
                builder.derived_registered(&derived.name, &derived.inputs, function.clone());
            match result {
                Err(GraphError::UnresolvedInput { name, input })
                    if declared.contains(input.as_str()) =>
                {
                    return Err(GraphError::ForwardReference { name, input });
                }
                Err(err) => return Err(err),
                Ok(_) => {}
            }
        }

        let graph = builder.build();
        debug!(variables = graph.len(), "built scoring graph");
        Ok(graph)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no variables.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Variable names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.name.as_str())
    }

    /// Type of a variable.
    pub fn value_type(&self, name: &str) -> Option<ValueType> {
        self.positions
            .get(name)
            .map(|&position| self.nodes[position].output)
    }

    /// Checks that `name` exists and produces a float.
    pub fn check_entry(&self, name: &str) -> Result<(), GraphError> {
        match self.value_type(name) {
            None => Err(GraphError::UnknownEntry(name.to_string())),
            Some(ValueType::Float) => Ok(()),
            Some(found) => Err(GraphError::EntryNotFloat {
                name: name.to_string(),
                found,
            }),
        }
    }

    /// Checks that every leaf reads a field of `schema`.
    pub fn validate_fields(&self, schema: &IndexSchema) -> Result<(), GraphError> {
        for node in self.nodes.iter() {
            if let Source::Leaf { field, .. } = &node.source
                && schema.field(field).is_none()
            {
                return Err(GraphError::UnknownField {
                    name: node.name.clone(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Creates this graph's variables for one search, reading fields from `fields`.
    pub fn instantiate(&self, fields: &Arc<FieldSupplier>) -> Result<ScoreVariables, GraphError> {
        let generation = Arc::new(AtomicU64::new(0));
        let mut providers: Vec<Provider> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.iter() {
            let provider = match &node.source {
                Source::Leaf { field, kind } => {
                    fields
                        .provider(field, *kind)
                        .map_err(|_| GraphError::UnknownField {
                            name: node.name.clone(),
                            field: field.clone(),
                        })?
                }
                Source::Derived { inputs, function } => {
                    let arguments = inputs
                        .iter()
                        .map(|&position| Arc::clone(&providers[position]))
                        .collect();
                    function.bind(&node.name, arguments).ok_or_else(|| {
                        GraphError::ArityMismatch {
                            name: node.name.clone(),
                            expected: function.inputs().len(),
                            found: inputs.len(),
                        }
                    })?
                }
            };
            providers.push(memoize(provider, Arc::clone(&generation)));
        }

        Ok(ScoreVariables {
            nodes: Arc::clone(&self.nodes),
            positions: Arc::clone(&self.positions),
            providers,
            generation,
        })
    }
}

/// Caches a provider's value until the document generation changes.
///
/// Failures are not cached.
fn memoize(provider: Provider, generation: Arc<AtomicU64>) -> Provider {
    let cell: Mutex<Option<(u64, Value)>> = Mutex::new(None);
    Arc::new(move || {
        let current = generation.load(Ordering::Acquire);
        if let Some((seen, value)) = &*cell.lock()
            && *seen == current
        {
            return Ok(value.clone());
        }
        let value = provider()?;
        *cell.lock() = Some((current, value.clone()));
        Ok(value)
    })
}

/// The variables of one search.
///
/// Registered as a [`DocContext`] so that every segment or document transition
/// invalidates the memoized values.
pub struct ScoreVariables {
    /// Declarations, shared with the graph.
    nodes: Arc<[Node]>,
    /// Name to position.
    positions: Arc<HashMap<String, usize>>,
    /// One memoized provider per node.
    providers: Vec<Provider>,
    /// Current document generation.
    generation: Arc<AtomicU64>,
}

impl ScoreVariables {
    /// The score function for the float variable `name`.
    pub fn score_fn(&self, name: &str) -> Result<ScoreFn, GraphError> {
        let position = *self
            .positions
            .get(name)
            .ok_or_else(|| GraphError::UnknownEntry(name.to_string()))?;
        let found = self.nodes[position].output;
        if found != ValueType::Float {
            return Err(GraphError::EntryNotFloat {
                name: name.to_string(),
                found,
            });
        }

        let provider = Arc::clone(&self.providers[position]);
        let name = name.to_string();
        Ok(Arc::new(move || match provider()? {
            Value::Float(score) => Ok(score),
            other => Err(ScoringError::ValueType {
                name: name.clone(),
                expected: ValueType::Float,
                found: other.value_type(),
            }),
        }))
    }

    /// Evaluates `name` for the current document. `None` if there is no such variable.
    pub fn value(&self, name: &str) -> Option<Result<Value, ScoringError>> {
        self.positions
            .get(name)
            .map(|&position| (self.providers[position])())
    }
}

impl DocContext for ScoreVariables {
    fn on_segment(&self, _segment: &SegmentReader) -> Result<(), ScoringError> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn on_doc(&self, _doc: DocId) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}
