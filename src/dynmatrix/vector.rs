use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::traits::Scalar;

use super::{DimensionMismatch, DynMatrix, MatrixError};

/// Dynamically-sized column vector (wraps an N×1 `DynMatrix`).
///
/// Enforces the single-column constraint and provides single-index access
/// `v[i]`. State estimates and observations are passed around as
/// `DynVector`s.
///
/// # Examples
///
/// ```
/// use tinyekf::DynVector;
///
/// let v = DynVector::from_slice(&[1.0_f64, 2.0, 3.0]);
/// assert_eq!(v[0], 1.0);
/// assert_eq!(v.len(), 3);
/// assert_eq!(v.as_matrix().shape(), (3, 1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DynVector<T> {
    pub(crate) inner: DynMatrix<T>,
}

impl<T: Scalar> DynVector<T> {
    /// Create a vector from a flat slice.
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            inner: DynMatrix::from_slice(data.len(), 1, data),
        }
    }

    /// Create a vector from an owned `Vec`.
    ///
    /// ```
    /// use tinyekf::DynVector;
    /// let v = DynVector::from_vec(vec![1.0, 2.0, 3.0]);
    /// assert_eq!(v[2], 3.0);
    /// ```
    pub fn from_vec(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            inner: DynMatrix::from_vec(n, 1, data),
        }
    }

    /// Create a zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            inner: DynMatrix::zeros(n, 1),
        }
    }

    /// Copy the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    /// `Ok(())` if the vector has `expected` elements.
    pub fn expect_len(
        &self,
        context: &'static str,
        expected: usize,
    ) -> Result<(), DimensionMismatch> {
        self.inner.expect_shape(context, (expected, 1))
    }
}

impl<T> DynVector<T> {
    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.nrows()
    }

    /// Whether the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the vector data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    /// View the vector data as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.inner.as_mut_slice()
    }

    /// View as an N×1 matrix.
    #[inline]
    pub fn as_matrix(&self) -> &DynMatrix<T> {
        &self.inner
    }

    /// Unwrap into the underlying N×1 matrix.
    #[inline]
    pub fn into_matrix(self) -> DynMatrix<T> {
        self.inner
    }
}

// ── Matrix * vector ─────────────────────────────────────────────────

impl<T: Scalar> DynMatrix<T> {
    /// Matrix-vector product `(M×N) * (N) → (M)`.
    ///
    /// ```
    /// use tinyekf::{DynMatrix, DynVector};
    /// let a = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// let v = DynVector::from_slice(&[1.0, 1.0]);
    /// assert_eq!(a.try_mul_vec(&v).unwrap().as_slice(), &[3.0, 7.0]);
    /// ```
    pub fn try_mul_vec(&self, v: &DynVector<T>) -> Result<DynVector<T>, MatrixError> {
        Ok(DynVector {
            inner: self.try_mul(&v.inner)?,
        })
    }
}

impl<T: Scalar> DynVector<T> {
    /// Element-wise sum.
    pub fn try_add(&self, rhs: &Self) -> Result<Self, MatrixError> {
        Ok(Self {
            inner: self.inner.try_add(&rhs.inner)?,
        })
    }

    /// Element-wise difference.
    pub fn try_sub(&self, rhs: &Self) -> Result<Self, MatrixError> {
        Ok(Self {
            inner: self.inner.try_sub(&rhs.inner)?,
        })
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<usize> for DynVector<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.inner[(i, 0)]
    }
}

impl<T> IndexMut<usize> for DynVector<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.inner[(i, 0)]
    }
}

// ── Conversions: DynMatrix ↔ DynVector ──────────────────────────────

impl<T> From<DynVector<T>> for DynMatrix<T> {
    fn from(v: DynVector<T>) -> Self {
        v.inner
    }
}

impl<T: Clone> From<&DynVector<T>> for DynMatrix<T> {
    fn from(v: &DynVector<T>) -> Self {
        v.inner.clone()
    }
}

impl<T> TryFrom<DynMatrix<T>> for DynVector<T> {
    type Error = DimensionMismatch;

    /// Accepts only single-column matrices.
    fn try_from(m: DynMatrix<T>) -> Result<Self, Self::Error> {
        if m.ncols() != 1 {
            return Err(DimensionMismatch {
                context: "column vector",
                expected: (m.nrows(), 1),
                got: m.shape(),
            });
        }
        Ok(Self { inner: m })
    }
}

impl<T: Scalar> From<Vec<T>> for DynVector<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T: Scalar> From<&[T]> for DynVector<T> {
    fn from(data: &[T]) -> Self {
        Self::from_slice(data)
    }
}
