//! # Core models and utilities for hictext.
//!
//! Shared building blocks for reading `.hic` contact-matrix files: the chromosome and
//! contact record models, the enums naming matrix types, normalizations and units, the
//! common error type, and byte sources that let a reader work against a local file or a
//! remote URL alike.
//!
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::*;
