//! Streaming LP problem-file writer.
//!
//! This crate turns in-memory collections of coefficients and symbolic
//! references into the plain-text LP format consumed by external solvers:
//!
//! - label-matched broadcasting of scalar/vector/matrix operands,
//! - elementwise rendering of linear expressions as signed term text,
//! - per-session allocation of globally unique variable/constraint tokens,
//! - streaming append of bound and constraint declarations to output sinks,
//! - a reference table mapping model attributes back to their tokens.
//!
//! # Architecture
//!
//! ```text
//! broadcast_axes ──> linexpr ──> ProblemWriter ──> bounds / constraints sinks
//!                                     │
//!                                     └──> TokenArray ──> RefTable
//! ```
//!
//! A [`ProblemWriter`] is one writing session: it owns the token counters,
//! so independent problems use independent writers and no state is shared.
//! The problem file itself is never buffered in memory; each declaration is
//! appended to its sink as soon as it is rendered.
//!
//! Not covered here: integer variables, incremental update of an already
//! written problem, or any LP feature beyond bounds, linear constraints and
//! a linear objective. Reading solver results back lives in `lpio-solve`.

pub mod error;
pub mod expr;
pub mod refs;
pub mod shape;
pub mod token;
pub mod writer;

pub use error::{WriteError, WriteResult};
pub use expr::{format_signed, linexpr, TextArray};
pub use refs::{MemoryStore, RefEntry, RefTable, TokenStore};
pub use shape::{broadcast_axes, Axis, Operand, Shape};
pub use token::{TokenAllocator, TokenArray, TokenKind};
pub use writer::{ProblemWriter, Sense};
