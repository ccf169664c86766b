//! Values flowing between scoring graph nodes.

use std::fmt;

/// Type of a scoring graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit float. Score entry points must have this type.
    Float,
    /// 64-bit float.
    Double,
    /// Signed integer.
    Int,
    /// Boolean.
    Bool,
    /// A single string.
    Str,
    /// A list of strings.
    Strs,
    /// A byte string.
    Bytes,
    /// A list of byte strings.
    BytesList,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Double => "double",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Str => "string",
            Self::Strs => "strings",
            Self::Bytes => "bytes",
            Self::BytesList => "bytes list",
        };
        f.write_str(name)
    }
}

/// A value produced by a scoring graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// See [`ValueType::Float`].
    Float(f32),
    /// See [`ValueType::Double`].
    Double(f64),
    /// See [`ValueType::Int`].
    Int(i64),
    /// See [`ValueType::Bool`].
    Bool(bool),
    /// See [`ValueType::Str`].
    Str(String),
    /// See [`ValueType::Strs`].
    Strs(Vec<String>),
    /// See [`ValueType::Bytes`].
    Bytes(Vec<u8>),
    /// See [`ValueType::BytesList`].
    BytesList(Vec<Vec<u8>>),
}

impl Value {
    /// The type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Float(_) => ValueType::Float,
            Self::Double(_) => ValueType::Double,
            Self::Int(_) => ValueType::Int,
            Self::Bool(_) => ValueType::Bool,
            Self::Str(_) => ValueType::Str,
            Self::Strs(_) => ValueType::Strs,
            Self::Bytes(_) => ValueType::Bytes,
            Self::BytesList(_) => ValueType::BytesList,
        }
    }
}

/// A Rust type that can cross a scoring graph edge.
///
/// Scoring functions are plain Rust closures; their argument and return types must
/// implement this trait, which is how the graph learns their signature.
pub trait ScoreValue: Sized + Send + 'static {
    /// The graph type this Rust type maps to.
    const TYPE: ValueType;

    /// Wraps `self` as a [`Value`].
    fn into_value(self) -> Value;

    /// Unwraps a [`Value`] of type [`Self::TYPE`].
    fn from_value(value: Value) -> Option<Self>;
}

/// Implements [`ScoreValue`] for a type carried by one [`Value`] variant.
macro_rules! impl_score_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ScoreValue for $ty {
                const TYPE: ValueType = ValueType::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_score_value! {
    f32 => Float,
    f64 => Double,
    i64 => Int,
    bool => Bool,
    String => Str,
    Vec<String> => Strs,
    Vec<u8> => Bytes,
    Vec<Vec<u8>> => BytesList,
}
