//! Typed literal values carried by term and range queries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A literal value to look up in the index.
///
/// Serialized externally tagged, e.g. `{"string": "55063554A"}` or `{"number": 3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTerm {
    /// A string value, matched verbatim.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A geographic point.
    Point(Point),
}

/// The variant of a [`QueryTerm`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// [`QueryTerm::String`].
    String,
    /// [`QueryTerm::Number`].
    Number,
    /// [`QueryTerm::Boolean`].
    Boolean,
    /// [`QueryTerm::Point`].
    Point,
}

impl QueryTerm {
    /// Returns the kind of this term.
    pub fn kind(&self) -> TermKind {
        match self {
            Self::String(_) => TermKind::String,
            Self::Number(_) => TermKind::Number,
            Self::Boolean(_) => TermKind::Boolean,
            Self::Point(_) => TermKind::Point,
        }
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Point => "point",
        };
        f.write_str(name)
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Point(p) => write!(f, "({}, {})", p.latitude, p.longitude),
        }
    }
}

impl From<&str> for QueryTerm {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for QueryTerm {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for QueryTerm {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for QueryTerm {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Point> for QueryTerm {
    fn from(value: Point) -> Self {
        Self::Point(value)
    }
}
