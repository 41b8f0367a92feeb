//! Axis labels, shapes and label-matched broadcasting.
//!
//! Operands entering a bound or constraint write can be scalars, labeled
//! vectors or labeled matrices. Broadcasting determines the common output
//! shape and the ordered axis labels of the result, and rejects any pair of
//! operands whose labels disagree on a shared axis. Keeping the axes here
//! lets the rest of the writer work on flat row-major buffers.

use crate::error::{WriteError, WriteResult};
use serde::{Deserialize, Serialize};

/// An ordered sequence of unique labels attached to one array dimension.
///
/// Equality is positional: two axes match only when they carry the same
/// labels in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    labels: Vec<String>,
}

impl Axis {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.labels.join(", "))
    }
}

/// A tuple of axis lengths; 0, 1 or 2 dimensions are supported.
///
/// The empty shape means "no records": expressions over it render as an
/// empty array and the writer emits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        debug_assert!(dims.len() <= 2, "at most two dimensions are supported");
        Self { dims }
    }

    /// Shape described by a list of axes.
    pub fn of_axes(axes: &[Axis]) -> Self {
        Self::new(axes.iter().map(Axis::len).collect())
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Element count. The empty shape holds zero elements.
    pub fn len(&self) -> usize {
        if self.dims.is_empty() {
            0
        } else {
            self.dims.iter().product()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns of the trailing axis, 1 for vectors and scalars.
    pub(crate) fn ncols(&self) -> usize {
        self.dims.last().copied().unwrap_or(1)
    }
}

/// A numeric operand: a plain scalar, or a vector/matrix aligned on labeled
/// axes. Values are stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Scalar(f64),
    Vector { axis: Axis, values: Vec<f64> },
    Matrix { rows: Axis, cols: Axis, values: Vec<f64> },
}

impl Operand {
    /// Labeled vector operand. Fails when the value count does not match the
    /// axis length.
    pub fn vector(axis: Axis, values: Vec<f64>) -> WriteResult<Self> {
        if values.len() != axis.len() {
            return Err(WriteError::LengthMismatch {
                values: values.len(),
                expected: axis.len(),
            });
        }
        Ok(Self::Vector { axis, values })
    }

    /// Labeled matrix operand over row-major values.
    pub fn matrix(rows: Axis, cols: Axis, values: Vec<f64>) -> WriteResult<Self> {
        if values.len() != rows.len() * cols.len() {
            return Err(WriteError::LengthMismatch {
                values: values.len(),
                expected: rows.len() * cols.len(),
            });
        }
        Ok(Self::Matrix { rows, cols, values })
    }

    /// The labeled axes of this operand; scalars contribute none.
    pub fn axes(&self) -> Vec<Axis> {
        match self {
            Operand::Scalar(_) => Vec::new(),
            Operand::Vector { axis, .. } => vec![axis.clone()],
            Operand::Matrix { rows, cols, .. } => vec![rows.clone(), cols.clone()],
        }
    }

    /// Value at a flat row-major index of the broadcast result shape.
    ///
    /// Vectors align on the trailing axis, so a length-n vector repeats
    /// across the rows of an (m, n) result.
    pub(crate) fn value_at(&self, flat: usize, out: &Shape) -> f64 {
        match self {
            Operand::Scalar(v) => *v,
            Operand::Vector { values, .. } => values[flat % out.ncols()],
            Operand::Matrix { values, .. } => values[flat],
        }
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

/// Determine the axes and shape resulting from broadcasting the given
/// per-operand axis lists against each other.
///
/// The operand with the highest dimensionality fixes the result axes; ties
/// favor the first one seen. Every labeled operand must agree exactly with
/// the already-fixed labels on the trailing axis. Scalars and unlabeled
/// operands contribute nothing. With no labeled operand the result is the
/// empty shape and the caller writes zero records.
pub fn broadcast_axes(operands: &[&[Axis]]) -> WriteResult<(Vec<Axis>, Shape)> {
    let mut axes: Vec<Axis> = Vec::new();
    for op_axes in operands {
        if op_axes.is_empty() {
            continue;
        }
        if let (Some(fixed), Some(new)) = (axes.last(), op_axes.last()) {
            if fixed != new {
                return Err(WriteError::ShapeMismatch {
                    left: fixed.to_string(),
                    right: new.to_string(),
                });
            }
        }
        if op_axes.len() > axes.len() {
            axes = op_axes.to_vec();
        }
    }
    let shape = Shape::of_axes(&axes);
    Ok((axes, shape))
}
