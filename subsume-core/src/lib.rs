//! Core data model for the subsume engine
//!
//! This crate holds everything the canonicalizer and the kernels agree on:
//! the closed base-type set, the arena-backed canonical schema graph, exact
//! numeric reasoning, three-valued decisions, and the shared error type.
//! It deliberately knows nothing about raw JSON Schema keywords or about
//! the subtype algorithms themselves.

pub mod canonical;
pub mod decision;
pub mod error;
pub mod number;
pub mod numeric;
pub mod types;
pub mod value;

pub use canonical::{
    atoms_equal, nodes_equal, ArrayConstraint, Atom, Constraint, Disjunction, Items,
    ObjectConstraint, SchemaGraph, SchemaId, StrConstraint,
};
pub use decision::Decision;
pub use error::{Error, Result};
pub use numeric::{Bound, NumConstraint};
pub use types::{BaseType, ALL_BASE_TYPES};
