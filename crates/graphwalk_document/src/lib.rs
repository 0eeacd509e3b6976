//! Executable documents for graphwalk.
//!
//! This crate provides:
//! - `ast`: Operations, selections and fragments
//! - `value`: Input values and request variables
//!
//! Parsing and validation happen upstream: a front end produces a
//! [`Document`] together with coerced [`Variables`] and hands both to
//! `graphwalk_runtime` for execution. The builders in this crate are the
//! surface such front ends target, and they double as a convenient way to
//! assemble documents in tests.

pub mod ast;
pub mod value;

pub use ast::{
    Document, FieldSelection, FragmentDefinition, InlineFragment, OperationDefinition,
    OperationKind, Selection,
};
pub use value::{InputValue, Variables};
