//! Per-base-type kernels
//!
//! Each kernel decides subtype and computes meet for one base type. The
//! numeric kernel lives with its constraint type in `subsume-core`; string
//! reasoning is pure (no nested schemas), array and object kernels recurse
//! through the driver.

pub mod array;
pub mod object;
pub mod string;
