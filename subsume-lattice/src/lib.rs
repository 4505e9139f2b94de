//! Schema subtyping, meet, and join over canonicalized JSON Schemas
//!
//! The pipeline: a raw Draft-04 schema (plus the `stype` semantic-type
//! extension) canonicalizes into a disjunction of typed atoms in an arena
//! graph; per-base-type kernels decide subtype and compute meets; the
//! driver dispatches kernels across disjunctions, combining three-valued
//! verdicts with Kleene logic and consulting the injected semantic
//! resolver for `stype` pairs.
//!
//! Most callers want [`is_subschema`], [`meet`], [`join`],
//! [`is_equivalent`], or an [`Engine`] to share a resolver and cache
//! across queries.

mod cache;
mod canon;
mod complement;
mod driver;
mod kernels;
mod raw;
mod refs;
mod satisfies;
mod serialize;

pub mod api;

pub use api::{is_equivalent, is_subschema, join, meet, Engine, SubtypeReport};
pub use cache::{CacheKey, QueryCache, QueryKind};
pub use canon::{canonicalize_document, CanonOptions};
pub use driver::{Diagnostic, Merger, Subtyper};
pub use serialize::serialize;

pub use subsume_core::decision::Decision;
pub use subsume_core::error::{Error, Result};
