//! Linear algebra utilities.
//!
//! Tridiagonal systems come from cubic spline construction; small dense
//! systems come from Levenberg-Marquardt steps.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Solves a tridiagonal system of equations (Thomas algorithm).
///
/// ```text
/// | b[0]  c[0]                    | | x[0]   |   | d[0]   |
/// | a[0]  b[1]  c[1]              | | x[1]   |   | d[1]   |
/// |       a[1]  b[2]  c[2]        | | x[2]   | = | d[2]   |
/// |              ...   ...   ...  | | ...    |   | ...    |
/// |                a[n-2]  b[n-1] | | x[n-1] |   | d[n-1] |
/// ```
///
/// # Arguments
///
/// * `a` - Lower diagonal (length n-1)
/// * `b` - Main diagonal (length n)
/// * `c` - Upper diagonal (length n-1)
/// * `d` - Right-hand side (length n)
pub fn solve_tridiagonal(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> MathResult<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Ok(vec![]);
    }
    if a.len() != n - 1 || c.len() != n - 1 || d.len() != n {
        return Err(MathError::invalid_input(
            "Tridiagonal system has inconsistent dimensions",
        ));
    }
    if b[0].abs() < 1e-15 {
        return Err(MathError::SingularMatrix);
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    if n > 1 {
        c_prime[0] = c[0] / b[0];
    }
    d_prime[0] = d[0] / b[0];

    for i in 1..n {
        let denom = b[i] - a[i - 1] * c_prime[i - 1];
        if denom.abs() < 1e-15 {
            return Err(MathError::SingularMatrix);
        }
        if i < n - 1 {
            c_prime[i] = c[i] / denom;
        }
        d_prime[i] = (d[i] - a[i - 1] * d_prime[i - 1]) / denom;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    Ok(x)
}

/// Solves a dense linear system `A x = b` by LU decomposition with partial
/// pivoting.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(MathError::invalid_input("Matrix must be square"));
    }
    if n != b.len() {
        return Err(MathError::length_mismatch(n, b.len()));
    }
    a.clone().lu().solve(b).ok_or(MathError::SingularMatrix)
}
