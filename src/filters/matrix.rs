//! Small dense matrix used by the 6-state filter.
//!
//! Backed by `ndarray::Array2` with every shape checked at runtime, the way
//! the Kalman update helpers validate their arrays. Only the operations the
//! filter needs are provided: element access, add/sub/mul, transpose and the
//! closed-form 2×2 / 3×3 inverses.

use std::fmt;

use ndarray::Array2;

use crate::error::MatrixError;

/// Determinants below this magnitude are treated as singular
pub const SINGULAR_DET_THRESHOLD: f64 = 1e-10;

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    pub fn identity(size: usize) -> Self {
        Self {
            data: Array2::eye(size),
        }
    }

    pub fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        Self {
            data: Array2::from_shape_fn((rows, cols), |(r, c)| f(r, c)),
        }
    }

    /// Build from row-major data; the length must equal `rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Result<Self, MatrixError> {
        let data = Array2::from_shape_vec((rows, cols), values.to_vec()).map_err(|_| {
            MatrixError::InvalidShape {
                rows,
                cols,
                len: values.len(),
            }
        })?;
        Ok(Self { data })
    }

    /// Column vector (n×1)
    pub fn column(values: &[f64]) -> Self {
        Self {
            data: Array2::from_shape_fn((values.len(), 1), |(r, _)| values[r]),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        let err = self.out_of_bounds(row, col);
        let slot = self.data.get_mut((row, col)).ok_or(err)?;
        *slot = value;
        Ok(())
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape("add", other)?;
        Ok(Self {
            data: &self.data + &other.data,
        })
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape("sub", other)?;
        Ok(Self {
            data: &self.data - &other.data,
        })
    }

    pub fn mul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols() != other.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "mul",
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(Self {
            data: self.data.dot(&other.data),
        })
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        Self {
            data: &self.data * factor,
        }
    }

    pub fn transpose(&self) -> Matrix {
        Self {
            data: self.data.t().to_owned(),
        }
    }

    /// `(M + Mᵀ) / 2`; square matrices only.
    pub fn symmetrized(&self) -> Result<Matrix, MatrixError> {
        let t = self.transpose();
        self.check_same_shape("symmetrize", &t)?;
        Ok(Self {
            data: (&self.data + &t.data) * 0.5,
        })
    }

    pub fn trace(&self) -> f64 {
        self.data.diag().sum()
    }

    /// Closed-form inverse of a 2×2 matrix.
    ///
    /// `None` for a non-2×2 input or when `|det| < SINGULAR_DET_THRESHOLD`.
    pub fn inverse2x2(&self) -> Option<Matrix> {
        if self.shape() != (2, 2) {
            return None;
        }
        let m = &self.data;
        let (a, b, c, d) = (m[[0, 0]], m[[0, 1]], m[[1, 0]], m[[1, 1]]);
        let det = a * d - b * c;
        if det.abs() < SINGULAR_DET_THRESHOLD {
            return None;
        }
        let inv_det = 1.0 / det;
        Matrix::from_row_slice(2, 2, &[d * inv_det, -b * inv_det, -c * inv_det, a * inv_det]).ok()
    }

    /// Closed-form (adjugate) inverse of a 3×3 matrix.
    ///
    /// `None` for a non-3×3 input or when `|det| < SINGULAR_DET_THRESHOLD`.
    pub fn inverse3x3(&self) -> Option<Matrix> {
        if self.shape() != (3, 3) {
            return None;
        }
        let m = &self.data;
        let (a, b, c) = (m[[0, 0]], m[[0, 1]], m[[0, 2]]);
        let (d, e, f) = (m[[1, 0]], m[[1, 1]], m[[1, 2]]);
        let (g, h, i) = (m[[2, 0]], m[[2, 1]], m[[2, 2]]);

        let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
        if det.abs() < SINGULAR_DET_THRESHOLD {
            return None;
        }
        let inv_det = 1.0 / det;
        let adj = [
            e * i - f * h,
            c * h - b * i,
            b * f - c * e,
            f * g - d * i,
            a * i - c * g,
            c * d - a * f,
            d * h - e * g,
            b * g - a * h,
            a * e - b * d,
        ];
        let values: Vec<f64> = adj.iter().map(|v| v * inv_det).collect();
        Matrix::from_row_slice(3, 3, &values).ok()
    }

    fn check_same_shape(&self, op: &'static str, other: &Matrix) -> Result<(), MatrixError> {
        if self.shape() != other.shape() {
            return Err(MatrixError::DimensionMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> MatrixError {
        MatrixError::IndexOutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.rows() {
            write!(f, "[ ")?;
            for value in row {
                write!(f, "{value:.4} ")?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
