//! Linear expression rendering.
//!
//! Turns (coefficient, variable-token) pairs elementwise into the signed
//! term text the LP format expects. `[(1.0, a1), (-0.5, b1)]` renders as
//! `"+1.0 a1 -0.5 b1 "`: every coefficient carries an explicit sign and a
//! decimal point, terms concatenate in input order, and element order is
//! always the row-major order of the broadcast shape, so the final file is
//! reproducible.

use crate::error::WriteResult;
use crate::shape::{broadcast_axes, Axis, Operand, Shape};
use crate::token::TokenArray;

/// Render a coefficient with an embedded sign, one explicit decimal
/// representation and a trailing space separator: `+1.0 `, `-0.5 `.
pub fn format_signed(v: f64) -> String {
    // A negative zero is still zero and renders with a plus sign.
    let v = if v == 0.0 { 0.0 } else { v };
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:+.1} ", v)
    } else {
        format!("{:+} ", v)
    }
}

/// A shaped array of rendered text fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextArray {
    axes: Vec<Axis>,
    shape: Shape,
    frags: Vec<String>,
}

impl TextArray {
    pub(crate) fn new(axes: Vec<Axis>, shape: Shape, frags: Vec<String>) -> Self {
        debug_assert_eq!(frags.len(), shape.len());
        Self { axes, shape, frags }
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn fragments(&self) -> &[String] {
        &self.frags
    }

    pub fn is_empty(&self) -> bool {
        self.frags.is_empty()
    }

    /// Flatten the whole array into one contiguous text block, in row-major
    /// order with no separator. Used when an entire declaration body must
    /// become a single string, e.g. a one-line objective.
    pub fn join(&self) -> String {
        self.frags.concat()
    }

    /// Collapse the trailing axis by concatenating the fragments of each
    /// row, yielding a one-dimensional expression over the leading axis.
    /// This is how a per-entity expression becomes one term group per row,
    /// e.g. summing generator dispatch into a balance constraint per
    /// snapshot. Arrays with fewer than two dimensions come back unchanged.
    pub fn join_trailing(&self) -> TextArray {
        if self.shape.ndim() < 2 {
            return self.clone();
        }
        let ncols = self.shape.ncols();
        let frags: Vec<String> = self.frags.chunks(ncols).map(|row| row.concat()).collect();
        let axes = vec![self.axes[0].clone()];
        let shape = Shape::of_axes(&axes);
        TextArray::new(axes, shape, frags)
    }
}

/// Elementwise concatenation of (coefficient, variable) pairs into signed
/// term text.
///
/// Each pair's shape must be broadcast-compatible with every other pair's;
/// the result carries the broadcast axes. Coefficients render with sign and
/// separator via [`format_signed`], variable tokens render unchanged. An
/// empty broadcast shape yields an empty array.
pub fn linexpr(pairs: &[(Operand, &TokenArray)]) -> WriteResult<TextArray> {
    let mut op_axes: Vec<Vec<Axis>> = Vec::with_capacity(pairs.len() * 2);
    for (coeff, vars) in pairs {
        op_axes.push(coeff.axes());
        op_axes.push(vars.axes().to_vec());
    }
    let borrowed: Vec<&[Axis]> = op_axes.iter().map(Vec::as_slice).collect();
    let (axes, shape) = broadcast_axes(&borrowed)?;

    let mut frags = vec![String::new(); shape.len()];
    for (coeff, vars) in pairs {
        for (flat, frag) in frags.iter_mut().enumerate() {
            frag.push_str(&format_signed(coeff.value_at(flat, &shape)));
            frag.push_str(vars.token_at(flat, &shape));
            frag.push(' ');
        }
    }
    Ok(TextArray::new(axes, shape, frags))
}
