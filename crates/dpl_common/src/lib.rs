//! Shared foundational types used across the detailed placement legalizer.
//!
//! This crate provides interned instance names, content hashing for placement
//! fingerprints, integer die geometry, and the common result type that carries
//! internal invariant violations.

#![warn(missing_docs)]

pub mod geom;
pub mod hash;
pub mod ident;
pub mod result;

pub use geom::{Point, Rect};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{DplResult, InternalError};
