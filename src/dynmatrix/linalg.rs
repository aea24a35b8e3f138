use alloc::vec;
use alloc::vec::Vec;

use crate::linalg::lu::{lu_in_place, lu_solve};
use crate::traits::FloatScalar;

use super::vector::DynVector;
use super::{DimensionMismatch, DynMatrix, MatrixError};

// ── DynLu ───────────────────────────────────────────────────────────

/// LU decomposition of a dynamically-sized square matrix.
///
/// Stores the packed L/U factors and permutation vector.
///
/// # Example
///
/// ```
/// use tinyekf::{DynMatrix, DynVector};
///
/// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 5.0, 3.0]);
/// let lu = a.lu().unwrap();
///
/// let b = DynVector::from_slice(&[4.0, 11.0]);
/// let x = lu.solve(&b);
/// assert!((x[0] - 1.0).abs() < 1e-12);
/// assert!((x[1] - 2.0).abs() < 1e-12);
/// assert!((lu.det() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct DynLu<T> {
    lu: DynMatrix<T>,
    perm: Vec<usize>,
    even: bool,
}

impl<T: FloatScalar> DynLu<T> {
    /// Decompose a square matrix.
    ///
    /// Fails with `DimensionMismatch` for non-square input and `Singular`
    /// when no usable pivot exists.
    pub fn new(a: &DynMatrix<T>) -> Result<Self, MatrixError> {
        if !a.is_square() {
            return Err(DimensionMismatch {
                context: "LU decomposition",
                expected: (a.nrows(), a.nrows()),
                got: a.shape(),
            }
            .into());
        }
        let n = a.nrows();
        let mut lu = a.clone();
        let mut perm = vec![0usize; n];
        let even = lu_in_place(&mut lu, &mut perm)?;
        Ok(Self { lu, perm, even })
    }

    /// Solve Ax = b for x.
    pub fn solve(&self, b: &DynVector<T>) -> DynVector<T> {
        let n = self.lu.nrows();
        assert_eq!(b.len(), n, "rhs length mismatch");
        let mut x = vec![T::zero(); n];
        lu_solve(&self.lu, &self.perm, b.as_slice(), &mut x);
        DynVector::from_vec(x)
    }

    /// Compute the matrix inverse, one column of the identity at a time.
    pub fn inverse(&self) -> DynMatrix<T> {
        let n = self.lu.nrows();
        let mut inv = DynMatrix::zeros(n, n);
        let mut col_buf = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];

        for col in 0..n {
            if col > 0 {
                e[col - 1] = T::zero();
            }
            e[col] = T::one();

            lu_solve(&self.lu, &self.perm, &e, &mut col_buf);
            inv.as_mut_slice()[col * n..(col + 1) * n].copy_from_slice(&col_buf);
        }

        inv
    }

    /// Compute the determinant.
    pub fn det(&self) -> T {
        let n = self.lu.nrows();
        let mut d = if self.even { T::one() } else { -T::one() };
        for i in 0..n {
            d = d * self.lu[(i, i)];
        }
        d
    }
}

// ── Convenience methods on DynMatrix ────────────────────────────────

impl<T: FloatScalar> DynMatrix<T> {
    /// LU decomposition with partial pivoting.
    pub fn lu(&self) -> Result<DynLu<T>, MatrixError> {
        DynLu::new(self)
    }

    /// Solve `Ax = b` for `x` via LU decomposition.
    pub fn solve(&self, b: &DynVector<T>) -> Result<DynVector<T>, MatrixError> {
        b.expect_len("solve", self.nrows())?;
        Ok(self.lu()?.solve(b))
    }

    /// Matrix inverse via LU decomposition.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// use tinyekf::dynmatrix::MatrixError;
    ///
    /// let a = DynMatrix::from_rows(2, 2, &[4.0_f64, 7.0, 2.0, 6.0]);
    /// let a_inv = a.inverse().unwrap();
    /// let id = &a * &a_inv;
    /// assert!((id[(0, 0)] - 1.0).abs() < 1e-12);
    /// assert!((id[(0, 1)]).abs() < 1e-12);
    ///
    /// let singular = DynMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 2.0, 4.0]);
    /// assert_eq!(singular.inverse(), Err(MatrixError::Singular));
    /// ```
    pub fn inverse(&self) -> Result<DynMatrix<T>, MatrixError> {
        Ok(self.lu()?.inverse())
    }

    /// Determinant via LU; a singular matrix has determinant zero.
    pub fn det(&self) -> Result<T, MatrixError> {
        match self.lu() {
            Ok(lu) => Ok(lu.det()),
            Err(MatrixError::Singular) => Ok(T::zero()),
            Err(e) => Err(e),
        }
    }
}
