#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]

extern crate alloc;

mod error;
pub use error::*;

mod kind;
pub use kind::*;

mod attribute;
pub use attribute::*;

mod record;
pub use record::*;

mod record_type;
pub use record_type::*;

mod registry;
pub use registry::*;

mod synth;
pub use synth::{Parameter, ParameterKind, Signature, SynthesisPlan};

pub mod diagnostics;

mod repr;

pub use autoinit_value::{Map, TypeCheckError, TypeExpr, TypeValidator, Value, ValueType};

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}
