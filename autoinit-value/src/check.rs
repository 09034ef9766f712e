//! Runtime type checking of values against [`TypeExpr`] annotations.
//!
//! Type checking is pluggable: anything implementing [`TypeValidator`] can be
//! attached to an attribute. The crate ships a built-in backend behind the
//! `typecheck` feature; [`default_validator`] returns it when available.

use alloc::sync::Arc;
use core::fmt;

use crate::{TypeExpr, Value, ValueType};

/// Checks a named value against an expected type.
pub trait TypeValidator: Send + Sync {
    /// Returns `Ok(())` if `value` satisfies `expected`.
    fn check(&self, name: &str, value: &Value, expected: &TypeExpr) -> Result<(), TypeCheckError>;
}

impl<F> TypeValidator for F
where
    F: Fn(&str, &Value, &TypeExpr) -> Result<(), TypeCheckError> + Send + Sync,
{
    fn check(&self, name: &str, value: &Value, expected: &TypeExpr) -> Result<(), TypeCheckError> {
        self(name, value, expected)
    }
}

/// A value did not match the type it was checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCheckError {
    /// Name of the checked argument or field.
    pub name: String,
    /// The expected type.
    pub expected: TypeExpr,
    /// The kind of the offending value.
    pub actual: ValueType,
}

impl TypeCheckError {
    /// Build an error for `value` failing to match `expected`.
    pub fn new(name: &str, value: &Value, expected: &TypeExpr) -> Self {
        Self {
            name: name.to_owned(),
            expected: expected.clone(),
            actual: value.value_type(),
        }
    }
}

impl fmt::Display for TypeCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type of {} must be {}; got {} instead",
            self.name, self.expected, self.actual
        )
    }
}

impl core::error::Error for TypeCheckError {}

/// The built-in validator backend.
#[cfg(feature = "typecheck")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinValidator;

#[cfg(feature = "typecheck")]
impl BuiltinValidator {
    /// Returns true if `value` satisfies `expected`.
    pub fn matches(value: &Value, expected: &TypeExpr) -> bool {
        match expected {
            TypeExpr::Any => true,
            TypeExpr::None => value.is_none(),
            TypeExpr::Bool => matches!(value, Value::Bool(_)),
            TypeExpr::Int => matches!(value, Value::Int(_)),
            TypeExpr::Float => matches!(value, Value::Float(_) | Value::Int(_)),
            TypeExpr::Str => matches!(value, Value::Str(_)),
            TypeExpr::Iterable => matches!(value, Value::Str(_) | Value::List(_) | Value::Map(_)),
            TypeExpr::List(inner) => match value {
                Value::List(items) => items.iter().all(|item| Self::matches(item, inner)),
                _ => false,
            },
            TypeExpr::Map(inner) => match value {
                Value::Map(map) => map.values().all(|item| Self::matches(item, inner)),
                _ => false,
            },
            TypeExpr::Union(members) => members.iter().any(|member| Self::matches(value, member)),
        }
    }
}

#[cfg(feature = "typecheck")]
impl TypeValidator for BuiltinValidator {
    fn check(&self, name: &str, value: &Value, expected: &TypeExpr) -> Result<(), TypeCheckError> {
        if Self::matches(value, expected) {
            Ok(())
        } else {
            Err(TypeCheckError::new(name, value, expected))
        }
    }
}

/// The validator used when an attribute asks for type checking without
/// supplying its own. `None` when no backend is compiled in.
pub fn default_validator() -> Option<Arc<dyn TypeValidator>> {
    #[cfg(feature = "typecheck")]
    {
        Some(Arc::new(BuiltinValidator))
    }
    #[cfg(not(feature = "typecheck"))]
    {
        None
    }
}
