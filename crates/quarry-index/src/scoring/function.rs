//! Typed scoring functions and their type-erased form.
//!
//! Any `Fn(A, B, ..) -> R` of up to six arguments whose argument and result types
//! implement [`ScoreValue`] is a [`ScoreFunction`]. Its signature is read from the
//! Rust types when it is registered, so the graph can check wiring before any search
//! runs. Binding a function to input providers yields a new provider that evaluates
//! the inputs in argument order and calls the function.

use std::{fmt, sync::Arc};

use super::{Provider, ScoreValue, Value, ValueType};
use crate::ScoringError;

/// A function usable as a derived scoring node.
///
/// `Marker` is the function pointer type matching the signature; it only exists to
/// keep the blanket implementations for different arities apart.
pub trait ScoreFunction<Marker>: Send + Sync + 'static {
    /// Argument types, in order.
    fn input_types() -> Vec<ValueType>;

    /// Result type.
    fn output_type() -> ValueType;

    /// Binds the function to one provider per argument.
    ///
    /// Returns `None` if the number of providers does not match the arity. `name` is
    /// the node being bound, used in type errors.
    fn bind(self: Arc<Self>, name: &str, inputs: Vec<Provider>) -> Option<Provider>;
}

/// Unwraps an argument value, reporting a mismatch against the node being evaluated.
fn argument<T: ScoreValue>(name: &str, value: Value) -> Result<T, ScoringError> {
    let found = value.value_type();
    T::from_value(value).ok_or_else(|| ScoringError::ValueType {
        name: name.to_string(),
        expected: T::TYPE,
        found,
    })
}

/// Implements [`ScoreFunction`] for closures of one arity.
macro_rules! impl_score_function {
    ($($arg:ident => $input:ident),*) => {
        impl<Func, Ret, $($arg),*> ScoreFunction<fn($($arg),*) -> Ret> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
            Ret: ScoreValue,
            $($arg: ScoreValue,)*
        {
            fn input_types() -> Vec<ValueType> {
                vec![$($arg::TYPE),*]
            }

            fn output_type() -> ValueType {
                Ret::TYPE
            }

            fn bind(self: Arc<Self>, name: &str, inputs: Vec<Provider>) -> Option<Provider> {
                let mut inputs = inputs.into_iter();
                $(let $input = inputs.next()?;)*
                if inputs.next().is_some() {
                    return None;
                }
                let name: Arc<str> = Arc::from(name);
                Some(Arc::new(move || {
                    let _node = &name;
                    $(let $input = argument::<$arg>(_node, $input()?)?;)*
                    Ok((self)($($input),*).into_value())
                }))
            }
        }
    };
}

impl_score_function!();
impl_score_function!(A => a);
impl_score_function!(A => a, B => b);
impl_score_function!(A => a, B => b, C => c);
impl_score_function!(A => a, B => b, C => c, D => d);
impl_score_function!(A => a, B => b, C => c, D => d, E => e);
impl_score_function!(A => a, B => b, C => c, D => d, E => e, F => f);

/// A [`ScoreFunction`] with its signature captured and its type erased.
#[derive(Clone)]
pub struct RegisteredFunction {
    /// Argument types.
    inputs: Vec<ValueType>,
    /// Result type.
    output: ValueType,
    /// Binds the function to argument providers.
    bind: Arc<dyn Fn(&str, Vec<Provider>) -> Option<Provider> + Send + Sync>,
}

impl RegisteredFunction {
    /// Captures `function` and its signature.
    pub fn new<Marker, Func>(function: Func) -> Self
    where
        Marker: 'static,
        Func: ScoreFunction<Marker>,
    {
        let function = Arc::new(function);
        Self {
            inputs: <Func as ScoreFunction<Marker>>::input_types(),
            output: <Func as ScoreFunction<Marker>>::output_type(),
            bind: Arc::new(move |name: &str, inputs: Vec<Provider>| {
                <Func as ScoreFunction<Marker>>::bind(Arc::clone(&function), name, inputs)
            }),
        }
    }

    /// Argument types, in order.
    pub fn inputs(&self) -> &[ValueType] {
        &self.inputs
    }

    /// Result type.
    pub fn output(&self) -> ValueType {
        self.output
    }

    /// Binds the function to argument providers. See [`ScoreFunction::bind`].
    pub(crate) fn bind(&self, name: &str, inputs: Vec<Provider>) -> Option<Provider> {
        (self.bind)(name, inputs)
    }
}

impl fmt::Debug for RegisteredFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredFunction")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
