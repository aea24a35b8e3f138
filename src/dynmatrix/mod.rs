mod linalg;
mod ops;
mod util;
mod vector;

pub use linalg::DynLu;
pub use vector::DynVector;

use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::traits::{MatrixMut, MatrixRef, Scalar};

/// Shape mismatch between operands, or between a value and the shape an
/// operation requires.
///
/// ```
/// use tinyekf::DynMatrix;
/// use tinyekf::dynmatrix::MatrixError;
///
/// let a = DynMatrix::<f64>::zeros(2, 3);
/// let b = DynMatrix::<f64>::zeros(2, 3);
/// match a.try_mul(&b) {
///     Err(MatrixError::DimensionMismatch(e)) => {
///         assert_eq!(e.expected, (3, 3));
///         assert_eq!(e.got, (2, 3));
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionMismatch {
    /// What was being checked, e.g. `"multiply"` or `"observation"`.
    pub context: &'static str,
    /// Expected `(rows, cols)`.
    pub expected: (usize, usize),
    /// Got `(rows, cols)`.
    pub got: (usize, usize),
}

impl core::fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "dimension mismatch in {}: expected {}x{}, got {}x{}",
            self.context, self.expected.0, self.expected.1, self.got.0, self.got.1
        )
    }
}

/// Element access outside the matrix bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfRange {
    /// Requested `(row, col)`.
    pub index: (usize, usize),
    /// Matrix `(rows, cols)`.
    pub shape: (usize, usize),
}

impl core::fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "index ({}, {}) out of range for {}x{} matrix",
            self.index.0, self.index.1, self.shape.0, self.shape.1
        )
    }
}

/// Errors from the checked matrix operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
    /// Operand shapes are incompatible.
    DimensionMismatch(DimensionMismatch),
    /// Matrix is singular or nearly singular.
    Singular,
    /// Element access outside the matrix.
    IndexOutOfRange(IndexOutOfRange),
}

impl core::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MatrixError::DimensionMismatch(e) => e.fmt(f),
            MatrixError::Singular => write!(f, "matrix is singular"),
            MatrixError::IndexOutOfRange(e) => e.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MatrixError {}

impl From<DimensionMismatch> for MatrixError {
    fn from(e: DimensionMismatch) -> Self {
        MatrixError::DimensionMismatch(e)
    }
}

impl From<IndexOutOfRange> for MatrixError {
    fn from(e: IndexOutOfRange) -> Self {
        MatrixError::IndexOutOfRange(e)
    }
}

/// Dynamically-sized heap-allocated matrix.
///
/// Column-major `Vec<T>` storage with dimensions set at runtime. Every
/// arithmetic operation returns a new matrix and leaves its operands alone;
/// the only in-place mutation is element assignment and the `*Assign`
/// operators on an owned matrix.
///
/// # Examples
///
/// ```
/// use tinyekf::DynMatrix;
///
/// let a = DynMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
/// assert_eq!(a[(0, 1)], 2.0);
/// assert_eq!(a.nrows(), 2);
/// assert_eq!(a.ncols(), 2);
///
/// let b = DynMatrix::<f64>::eye(3);
/// assert_eq!(b[(0, 0)], 1.0);
/// assert_eq!(b[(0, 1)], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DynMatrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T> Default for DynMatrix<T> {
    /// The empty 0×0 matrix.
    fn default() -> Self {
        Self {
            data: Vec::new(),
            nrows: 0,
            ncols: 0,
        }
    }
}

// ── Constructors ────────────────────────────────────────────────────

impl<T: Scalar> DynMatrix<T> {
    /// Create an `nrows x ncols` matrix of zeros.
    ///
    /// A zero dimension yields a matrix with no storage.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let m = DynMatrix::<f64>::zeros(2, 3);
    /// assert_eq!(m.nrows(), 2);
    /// assert_eq!(m.ncols(), 3);
    /// assert_eq!(m[(1, 2)], 0.0);
    ///
    /// assert!(DynMatrix::<f64>::zeros(0, 3).is_empty());
    /// ```
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::fill(nrows, ncols, T::zero())
    }

    /// Create a matrix filled with a given value.
    pub fn fill(nrows: usize, ncols: usize, value: T) -> Self {
        Self {
            data: vec![value; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create an `n x n` identity matrix.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let id = DynMatrix::<f64>::eye(3);
    /// assert_eq!(id[(0, 0)], 1.0);
    /// assert_eq!(id[(0, 1)], 0.0);
    /// assert_eq!(id[(2, 2)], 1.0);
    /// ```
    pub fn eye(n: usize) -> Self {
        Self::eye_rect(n, n)
    }

    /// Create an `nrows x ncols` matrix with ones on the main diagonal.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let e = DynMatrix::<f64>::eye_rect(2, 3);
    /// assert_eq!(e[(1, 1)], 1.0);
    /// assert_eq!(e[(1, 2)], 0.0);
    /// ```
    pub fn eye_rect(nrows: usize, ncols: usize) -> Self {
        let mut m = Self::zeros(nrows, ncols);
        for i in 0..nrows.min(ncols) {
            m[(i, i)] = T::one();
        }
        m
    }

    /// Create a matrix from a flat slice in column-major order.
    ///
    /// Panics if `slice.len() != nrows * ncols`.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// // Column-major: col0=[1,3], col1=[2,4]
    /// let m = DynMatrix::from_slice(2, 2, &[1.0, 3.0, 2.0, 4.0]);
    /// assert_eq!(m[(0, 0)], 1.0);
    /// assert_eq!(m[(1, 0)], 3.0);
    /// assert_eq!(m[(0, 1)], 2.0);
    /// assert_eq!(m[(1, 1)], 4.0);
    /// ```
    pub fn from_slice(nrows: usize, ncols: usize, slice: &[T]) -> Self {
        assert_eq!(
            slice.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            slice.len(),
            nrows,
            ncols,
        );
        Self {
            data: slice.to_vec(),
            nrows,
            ncols,
        }
    }

    /// Create a matrix from a flat slice in row-major order.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let m = DynMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(m[(0, 2)], 3.0);
    /// assert_eq!(m[(1, 0)], 4.0);
    /// ```
    pub fn from_rows(nrows: usize, ncols: usize, row_major: &[T]) -> Self {
        assert_eq!(
            row_major.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            row_major.len(),
            nrows,
            ncols,
        );
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(row_major[i * ncols + j]);
            }
        }
        Self { data, nrows, ncols }
    }

    /// Create a matrix from an owned `Vec<T>` in column-major order.
    ///
    /// Panics if `data.len() != nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "vec length {} does not match {}x{} matrix",
            data.len(),
            nrows,
            ncols,
        );
        Self { data, nrows, ncols }
    }

    /// Bounds-checked element read.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let m = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(m.try_get(1, 0), Ok(3.0));
    /// assert!(m.try_get(2, 0).is_err());
    /// ```
    pub fn try_get(&self, row: usize, col: usize) -> Result<T, MatrixError> {
        self.check_index(row, col)?;
        Ok(self[(row, col)])
    }

    /// Bounds-checked element write.
    pub fn try_set(&mut self, row: usize, col: usize, value: T) -> Result<(), MatrixError> {
        self.check_index(row, col)?;
        self[(row, col)] = value;
        Ok(())
    }
}

impl<T> DynMatrix<T> {
    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Whether the matrix is square.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Whether the matrix holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column-major view of the elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable column-major view of the elements.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Create a matrix by calling `f(row, col)` for each element.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let m = DynMatrix::from_fn(3, 3, |i, j| if i == j { 1.0_f64 } else { 0.0 });
    /// assert_eq!(m[(0, 0)], 1.0);
    /// assert_eq!(m[(0, 1)], 0.0);
    /// ```
    pub fn from_fn(nrows: usize, ncols: usize, f: impl Fn(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// `Ok(())` if `self` has exactly `expected` shape.
    pub fn expect_shape(
        &self,
        context: &'static str,
        expected: (usize, usize),
    ) -> Result<(), DimensionMismatch> {
        if self.shape() == expected {
            Ok(())
        } else {
            Err(DimensionMismatch {
                context,
                expected,
                got: self.shape(),
            })
        }
    }

    fn check_index(&self, row: usize, col: usize) -> Result<(), IndexOutOfRange> {
        if row < self.nrows && col < self.ncols {
            Ok(())
        } else {
            Err(IndexOutOfRange {
                index: (row, col),
                shape: self.shape(),
            })
        }
    }
}

// ── MatrixRef / MatrixMut ───────────────────────────────────────────

impl<T> MatrixRef<T> for DynMatrix<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self.data[col * self.nrows + row]
    }

    #[inline]
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[T] {
        let start = col * self.nrows + row_start;
        let end = col * self.nrows + self.nrows;
        &self.data[start..end]
    }
}

impl<T> MatrixMut<T> for DynMatrix<T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[col * self.nrows + row]
    }

    #[inline]
    fn col_as_mut_slice(&mut self, col: usize, row_start: usize) -> &mut [T] {
        let start = col * self.nrows + row_start;
        let end = col * self.nrows + self.nrows;
        &mut self.data[start..end]
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<(usize, usize)> for DynMatrix<T> {
    type Output = T;

    /// Panics when out of range; see [`DynMatrix::try_get`].
    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.nrows && col < self.ncols,
            "index ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols,
        );
        &self.data[col * self.nrows + row]
    }
}

impl<T> IndexMut<(usize, usize)> for DynMatrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.nrows && col < self.ncols,
            "index ({}, {}) out of range for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols,
        );
        &mut self.data[col * self.nrows + row]
    }
}
