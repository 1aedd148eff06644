//! Dense linear algebra for global surface interpolation.
//!
//! Solves `A * x = b` where `A` is the square coefficient matrix built from
//! basis-function values and `b` carries up to three columns (one per
//! spatial dimension). LU decomposition without pivoting; the coefficient
//! matrices arising from chord-length parametrization are strongly diagonal,
//! so pivots are checked rather than reordered and a vanishing pivot is
//! reported as a singular matrix.

use super::core::Point3;

/// Minimum pivot magnitude before the decomposition is considered singular.
pub const MIN_PIVOT: f64 = 1e-12;

/// Errors raised by the linear solver.
#[derive(Debug, thiserror::Error)]
pub enum LinalgError {
    #[error("matrix is singular: pivot at row {row} is below minimum magnitude")]
    SingularMatrix { row: usize },
    #[error("right-hand side length {provided} does not match matrix size {expected}")]
    SizeMismatch { expected: usize, provided: usize },
}

// ─────────────────────────────────────────────────────────────────────────────
// SquareMatrix
// ─────────────────────────────────────────────────────────────────────────────

/// Dense square matrix, row-major storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    size: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    #[must_use]
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] = value;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LU decomposition and substitution
// ─────────────────────────────────────────────────────────────────────────────

/// Decompose `A = L * U` with `U` unit upper-triangular (the pivots live on
/// the diagonal of `L`). Returns `(L, U)`.
pub fn lu_decompose(a: &SquareMatrix) -> Result<(SquareMatrix, SquareMatrix), LinalgError> {
    let n = a.size();
    let mut l = SquareMatrix::zeros(n);
    let mut u = SquareMatrix::zeros(n);

    for i in 0..n {
        for j in i..n {
            let mut value = a.get(j, i);
            for k in 0..i {
                value -= l.get(j, k) * u.get(k, i);
            }
            l.set(j, i, value);
        }

        let pivot = l.get(i, i);
        if pivot.abs() < MIN_PIVOT {
            return Err(LinalgError::SingularMatrix { row: i });
        }

        u.set(i, i, 1.0);
        for j in i + 1..n {
            let mut value = a.get(i, j) / pivot;
            for k in 0..i {
                value -= l.get(i, k) * u.get(k, j) / pivot;
            }
            u.set(i, j, value);
        }
    }

    Ok((l, u))
}

/// Solve `L * y = b` for a lower-triangular `L` with non-zero diagonal.
#[must_use]
pub fn forward_substitution(l: &SquareMatrix, b: &[f64]) -> Vec<f64> {
    let n = l.size();
    let mut y = vec![0.0; n];
    y[0] = b[0] / l.get(0, 0);

    for i in 1..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l.get(i, j) * y[j];
        }
        y[i] = (b[i] - sum) / l.get(i, i);
    }

    y
}

/// Solve `U * x = y` for an upper-triangular `U` with non-zero diagonal.
#[must_use]
pub fn backward_substitution(u: &SquareMatrix, y: &[f64]) -> Vec<f64> {
    let n = u.size();
    let mut x = vec![0.0; n];
    x[n - 1] = y[n - 1] / u.get(n - 1, n - 1);

    for i in (0..n - 1).rev() {
        let mut sum = 0.0;
        for j in i + 1..n {
            sum += u.get(i, j) * x[j];
        }
        x[i] = (y[i] - sum) / u.get(i, i);
    }

    x
}

/// Solve `A * x = b` where `b` holds one column per spatial dimension of the
/// given points. One decomposition serves all three substitutions.
pub fn lu_solve_points(a: &SquareMatrix, points: &[Point3]) -> Result<Vec<Point3>, LinalgError> {
    let n = a.size();
    if points.len() != n {
        return Err(LinalgError::SizeMismatch {
            expected: n,
            provided: points.len(),
        });
    }

    let (l, u) = lu_decompose(a)?;

    let mut columns = [const { Vec::new() }; 3];
    for (dim, column) in columns.iter_mut().enumerate() {
        let b: Vec<f64> = points.iter().map(|p| p.to_array()[dim]).collect();
        let y = forward_substitution(&l, &b);
        *column = backward_substitution(&u, &y);
    }

    Ok((0..n)
        .map(|j| Point3::new(columns[0][j], columns[1][j], columns[2][j]))
        .collect())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_from_rows(rows: &[&[f64]]) -> SquareMatrix {
        let n = rows.len();
        let mut m = SquareMatrix::zeros(n);
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                m.set(i, j, *value);
            }
        }
        m
    }

    fn multiply(a: &SquareMatrix, b: &SquareMatrix) -> SquareMatrix {
        let n = a.size();
        let mut out = SquareMatrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    sum += a.get(i, k) * b.get(k, j);
                }
                out.set(i, j, sum);
            }
        }
        out
    }

    #[test]
    fn test_lu_decompose_reconstructs_input() {
        let a = matrix_from_rows(&[
            &[4.0, 3.0, 0.0],
            &[6.0, 3.0, 1.0],
            &[0.0, 2.0, 5.0],
        ]);
        let (l, u) = lu_decompose(&a).unwrap();

        // U has a unit diagonal, L carries the pivots.
        for i in 0..3 {
            assert_eq!(u.get(i, i), 1.0);
            for j in i + 1..3 {
                assert_eq!(l.get(i, j), 0.0);
                assert_eq!(u.get(j, i), 0.0);
            }
        }

        let product = multiply(&l, &u);
        for i in 0..3 {
            for j in 0..3 {
                assert!((product.get(i, j) - a.get(i, j)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_lu_decompose_detects_singular() {
        let a = matrix_from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(matches!(
            lu_decompose(&a),
            Err(LinalgError::SingularMatrix { row: 1 })
        ));
    }

    #[test]
    fn test_substitution_round_trip() {
        let a = matrix_from_rows(&[
            &[2.0, 1.0, 0.0],
            &[1.0, 3.0, 1.0],
            &[0.0, 1.0, 4.0],
        ]);
        let x_expected = [1.0, -2.0, 3.0];
        let b: Vec<f64> = (0..3)
            .map(|i| (0..3).map(|j| a.get(i, j) * x_expected[j]).sum())
            .collect();

        let (l, u) = lu_decompose(&a).unwrap();
        let y = forward_substitution(&l, &b);
        let x = backward_substitution(&u, &y);

        for (computed, expected) in x.iter().zip(x_expected) {
            assert!((computed - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lu_solve_points_identity() {
        let mut a = SquareMatrix::zeros(3);
        for i in 0..3 {
            a.set(i, i, 1.0);
        }
        let points = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(4.0, 5.0, 6.0),
            Point3::new(7.0, 8.0, 9.0),
        ];

        let solution = lu_solve_points(&a, &points).unwrap();
        assert_eq!(solution, points);
    }

    #[test]
    fn test_lu_solve_points_size_mismatch() {
        let a = SquareMatrix::zeros(3);
        let points = vec![Point3::ORIGIN; 2];
        assert!(matches!(
            lu_solve_points(&a, &points),
            Err(LinalgError::SizeMismatch {
                expected: 3,
                provided: 2
            })
        ));
    }
}
