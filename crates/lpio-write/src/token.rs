//! Token allocation for variables and constraints.
//!
//! Every variable and constraint written into an LP file is identified by a
//! short opaque token (`x0`, `x1`, ... and `c0`, `c1`, ...). Counters live
//! on the allocator, which in turn is owned by a [`ProblemWriter`] session:
//! a fresh writer is a fresh numbering, and two concurrent sessions can
//! never collide. Tokens are only ever compared for equality; the numeric
//! suffix encodes allocation order, nothing else.
//!
//! [`ProblemWriter`]: crate::writer::ProblemWriter

use crate::shape::{Axis, Shape};
use serde::{Deserialize, Serialize};

/// Whether a token names a variable or a constraint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Variable,
    Constraint,
}

impl TokenKind {
    /// Prefix of the rendered token text.
    pub fn prefix(&self) -> &'static str {
        match self {
            TokenKind::Variable => "x",
            TokenKind::Constraint => "c",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Variable => write!(f, "variable"),
            TokenKind::Constraint => write!(f, "constraint"),
        }
    }
}

/// A freshly allocated block of tokens in some container shape.
///
/// Tokens are stored flat in row-major order; the axes tie each position
/// back to the entity labels the caller aligned the write on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenArray {
    kind: TokenKind,
    axes: Vec<Axis>,
    shape: Shape,
    tokens: Vec<String>,
}

impl TokenArray {
    pub(crate) fn new(kind: TokenKind, axes: Vec<Axis>, shape: Shape, tokens: Vec<String>) -> Self {
        debug_assert_eq!(tokens.len(), shape.len());
        Self {
            kind,
            axes,
            shape,
            tokens,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Token text at a flat row-major index of the broadcast result shape.
    /// One-dimensional arrays align on the trailing axis.
    pub(crate) fn token_at(&self, flat: usize, out: &Shape) -> &str {
        if self.shape.ndim() < out.ndim() {
            &self.tokens[flat % out.ncols()]
        } else {
            &self.tokens[flat]
        }
    }
}

/// Monotonic per-kind counters minting unique tokens.
///
/// Owned by a writer session; constructing a new allocator is the only way
/// to restart numbering, which keeps independent problems independent.
#[derive(Debug, Default)]
pub struct TokenAllocator {
    next_var: u64,
    next_con: u64,
}

impl TokenAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `shape.len()` fresh tokens of the requested kind and advance the
    /// counter by that amount.
    pub fn allocate(&mut self, kind: TokenKind, axes: Vec<Axis>, shape: Shape) -> TokenArray {
        let counter = match kind {
            TokenKind::Variable => &mut self.next_var,
            TokenKind::Constraint => &mut self.next_con,
        };
        let start = *counter;
        *counter += shape.len() as u64;
        let tokens = (start..*counter)
            .map(|n| format!("{}{}", kind.prefix(), n))
            .collect();
        TokenArray::new(kind, axes, shape, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_contiguous_and_distinct() {
        let mut alloc = TokenAllocator::new();
        let a = alloc.allocate(TokenKind::Variable, Vec::new(), Shape::new(vec![3]));
        let b = alloc.allocate(TokenKind::Variable, Vec::new(), Shape::new(vec![2]));
        assert_eq!(a.tokens(), &["x0", "x1", "x2"]);
        assert_eq!(b.tokens(), &["x3", "x4"]);
    }

    #[test]
    fn kinds_count_independently() {
        let mut alloc = TokenAllocator::new();
        alloc.allocate(TokenKind::Variable, Vec::new(), Shape::new(vec![5]));
        let c = alloc.allocate(TokenKind::Constraint, Vec::new(), Shape::new(vec![2]));
        assert_eq!(c.tokens(), &["c0", "c1"]);
    }

    #[test]
    fn fresh_allocator_restarts_at_zero() {
        let mut alloc = TokenAllocator::new();
        alloc.allocate(TokenKind::Variable, Vec::new(), Shape::new(vec![4]));
        let mut fresh = TokenAllocator::new();
        let a = fresh.allocate(TokenKind::Variable, Vec::new(), Shape::new(vec![1]));
        assert_eq!(a.tokens(), &["x0"]);
    }

    #[test]
    fn empty_shape_allocates_nothing() {
        let mut alloc = TokenAllocator::new();
        let a = alloc.allocate(TokenKind::Variable, Vec::new(), Shape::default());
        assert!(a.is_empty());
        let b = alloc.allocate(TokenKind::Variable, Vec::new(), Shape::new(vec![1]));
        assert_eq!(b.tokens(), &["x0"]);
    }
}
