//! Streaming problem writer.
//!
//! Appends bound and constraint declarations directly to two output sinks
//! as they are produced, so memory stays bounded by one declaration no
//! matter how large the problem grows. The writer owns the token counters
//! for its session: construct a new writer for every independent problem
//! and the numbering starts over.
//!
//! Emitted text is the plain LP convention consumed by solver executables:
//! one bound per line, one constraint per four-line block, every numeric
//! value carrying an explicit sign.

use crate::error::{WriteError, WriteResult};
use crate::expr::{format_signed, TextArray};
use crate::shape::{broadcast_axes, Axis, Operand, Shape};
use crate::token::{TokenAllocator, TokenArray, TokenKind};
use std::io::Write;
use std::str::FromStr;
use tracing::debug;

/// Comparison sense of a linear constraint. `==` normalizes to `=` when
/// parsed, matching what the LP format expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Eq,
    Ge,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Eq => write!(f, "="),
            Sense::Ge => write!(f, ">="),
        }
    }
}

impl FromStr for Sense {
    type Err = WriteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<=" => Ok(Sense::Le),
            "=" | "==" => Ok(Sense::Eq),
            ">=" => Ok(Sense::Ge),
            other => Err(WriteError::BadSense(other.to_string())),
        }
    }
}

/// One problem-writing session over a bounds sink and a constraints sink.
///
/// Both sinks are append-only; a failed write aborts the session and no
/// previously flushed declaration is rolled back.
pub struct ProblemWriter<B: Write, C: Write> {
    bounds: B,
    constraints: C,
    alloc: TokenAllocator,
}

impl<B: Write, C: Write> ProblemWriter<B, C> {
    pub fn new(bounds: B, constraints: C) -> Self {
        Self {
            bounds,
            constraints,
            alloc: TokenAllocator::new(),
        }
    }

    /// Declare variables bounded by `lower <= x <= upper`.
    ///
    /// With `axes` given the shape is taken from the axis lengths, otherwise
    /// lower and upper are broadcast against each other. One line per
    /// element is appended in row-major order; the freshly minted variable
    /// tokens come back in the same container shape.
    pub fn write_bounds(
        &mut self,
        lower: &Operand,
        upper: &Operand,
        axes: Option<Vec<Axis>>,
    ) -> WriteResult<TokenArray> {
        let (axes, shape) = self.resolve_axes(&[lower.axes(), upper.axes()], axes)?;
        let vars = self.alloc.allocate(TokenKind::Variable, axes, shape.clone());
        for (flat, token) in vars.iter().enumerate() {
            let line = format!(
                "{} <= {} <= {}\n",
                format_signed(lower.value_at(flat, &shape)),
                token,
                format_signed(upper.value_at(flat, &shape)),
            );
            self.bounds.write_all(line.as_bytes())?;
        }
        debug!(count = vars.len(), "wrote variable bounds");
        Ok(vars)
    }

    /// Declare constraints `lhs sense rhs`, one four-line block per element:
    /// token line, rendered left-hand side with the sense, right-hand side,
    /// blank separator. Returns the freshly minted constraint tokens.
    pub fn write_constraints(
        &mut self,
        lhs: &TextArray,
        sense: Sense,
        rhs: &Operand,
        axes: Option<Vec<Axis>>,
    ) -> WriteResult<TokenArray> {
        let (axes, shape) = self.resolve_axes(&[lhs.axes().to_vec(), rhs.axes()], axes)?;
        let cons = self
            .alloc
            .allocate(TokenKind::Constraint, axes, shape.clone());
        for (flat, token) in cons.iter().enumerate() {
            let lhs_frag = if lhs.shape().ndim() < shape.ndim() {
                &lhs.fragments()[flat % shape.ncols()]
            } else {
                &lhs.fragments()[flat]
            };
            let block = format!(
                "{token}:\n{lhs_frag}{sense}\n{}\n\n",
                format_signed(rhs.value_at(flat, &shape)),
            );
            self.constraints.write_all(block.as_bytes())?;
        }
        debug!(count = cons.len(), "wrote constraints");
        Ok(cons)
    }

    /// Flush both sinks.
    pub fn flush(&mut self) -> WriteResult<()> {
        self.bounds.flush()?;
        self.constraints.flush()?;
        Ok(())
    }

    /// Give the sinks back, e.g. to recover in-memory buffers in tests.
    pub fn into_sinks(self) -> (B, C) {
        (self.bounds, self.constraints)
    }

    fn resolve_axes(
        &self,
        operand_axes: &[Vec<Axis>],
        explicit: Option<Vec<Axis>>,
    ) -> WriteResult<(Vec<Axis>, Shape)> {
        match explicit {
            Some(axes) => {
                // Explicit axes still have to agree with every labeled
                // operand, or indexing into the operand values would wrap
                // or run out of bounds.
                for op_axes in operand_axes {
                    if op_axes.is_empty() {
                        continue;
                    }
                    if op_axes.len() > axes.len() {
                        return Err(WriteError::ShapeMismatch {
                            left: join_axes(op_axes),
                            right: join_axes(&axes),
                        });
                    }
                    let tail = &axes[axes.len() - op_axes.len()..];
                    for (have, want) in op_axes.iter().zip(tail) {
                        if have != want {
                            return Err(WriteError::ShapeMismatch {
                                left: have.to_string(),
                                right: want.to_string(),
                            });
                        }
                    }
                }
                let shape = Shape::of_axes(&axes);
                Ok((axes, shape))
            }
            None => {
                let borrowed: Vec<&[Axis]> = operand_axes.iter().map(Vec::as_slice).collect();
                broadcast_axes(&borrowed)
            }
        }
    }
}

fn join_axes(axes: &[Axis]) -> String {
    axes.iter()
        .map(Axis::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
