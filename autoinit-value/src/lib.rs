//! `autoinit-value` provides the dynamic value type stored in managed attributes,
//! together with the small annotation language used to type-check them.
//!
//! # Features
//!
//! - **`Value`**: None, Bool, Int, Float, Str, List and Map, with ordered maps
//! - **Canonical repr**: `Value::repr` renders `'Hello'`, `None`, `[1, 2]`, `{'a': 1}`
//! - **`TypeExpr`**: annotations such as `bool`, `list[bool]` or `int | float`
//! - **Pluggable validation**: the [`TypeValidator`] trait, with a built-in
//!   backend behind the `typecheck` feature
//! - **`serde` support** behind the `serde` feature

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]

extern crate alloc;

#[macro_use]
mod macros;

mod value;
pub use value::*;

mod repr;
pub use repr::Repr;

mod type_expr;
pub use type_expr::*;

mod check;
pub use check::*;

#[cfg(feature = "serde")]
mod serde_impl;
