//! Named scoring functions for configuration-declared graphs.

use std::collections::BTreeMap;

use super::{RegisteredFunction, ScoreFunction};

/// Score returned by `constant_score`.
const CONSTANT_SCORE: f32 = 100.0;

/// Maps function names used in `[[scoring.derived]]` bindings to functions.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    /// Functions by name.
    functions: BTreeMap<String, RegisteredFunction>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in functions:
    ///
    /// - `length(string) -> float`: number of characters
    /// - `sum(float, float) -> float`
    /// - `product(float, float) -> float`
    /// - `count(strings) -> float`: number of values
    /// - `constant_score() -> float`: always 100
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register("length", |text: String| text.chars().count() as f32)
            .register("sum", |a: f32, b: f32| a + b)
            .register("product", |a: f32, b: f32| a * b)
            .register("count", |values: Vec<String>| values.len() as f32)
            .register("constant_score", || CONSTANT_SCORE);
        registry
    }

    /// Registers `function` under `name`, replacing any previous function of that name.
    pub fn register<Marker, Func>(&mut self, name: &str, function: Func) -> &mut Self
    where
        Marker: 'static,
        Func: ScoreFunction<Marker>,
    {
        self.functions
            .insert(name.to_string(), RegisteredFunction::new(function));
        self
    }

    /// Looks up a function.
    pub fn get(&self, name: &str) -> Option<&RegisteredFunction> {
        self.functions.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}
