use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::traits::Scalar;

use super::{DimensionMismatch, DynMatrix, MatrixError};

// ── Checked operations ──────────────────────────────────────────────

impl<T: Scalar> DynMatrix<T> {
    fn zip_with(
        &self,
        rhs: &Self,
        context: &'static str,
        f: impl Fn(T, T) -> T,
    ) -> Result<Self, MatrixError> {
        rhs.expect_shape(context, self.shape())?;
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(DynMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        })
    }

    /// Element-wise sum. Shapes must match.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let a = DynMatrix::from_rows(1, 2, &[1.0, 2.0]);
    /// let b = DynMatrix::from_rows(1, 2, &[3.0, 4.0]);
    /// assert_eq!(a.try_add(&b).unwrap(), DynMatrix::from_rows(1, 2, &[4.0, 6.0]));
    /// assert!(a.try_add(&DynMatrix::zeros(2, 1)).is_err());
    /// ```
    pub fn try_add(&self, rhs: &Self) -> Result<Self, MatrixError> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    /// Element-wise difference. Shapes must match.
    pub fn try_sub(&self, rhs: &Self) -> Result<Self, MatrixError> {
        self.zip_with(rhs, "subtract", |a, b| a - b)
    }

    /// Matrix product `(M×N) * (N×P) → (M×P)`.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let a = DynMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let b = DynMatrix::from_rows(3, 1, &[1.0, 0.0, -1.0]);
    /// let c = a.try_mul(&b).unwrap();
    /// assert_eq!(c, DynMatrix::from_rows(2, 1, &[-2.0, -2.0]));
    /// ```
    pub fn try_mul(&self, rhs: &Self) -> Result<Self, MatrixError> {
        if self.ncols != rhs.nrows {
            return Err(DimensionMismatch {
                context: "multiply",
                expected: (self.ncols, rhs.ncols),
                got: rhs.shape(),
            }
            .into());
        }
        let m = self.nrows;
        let n = self.ncols;
        let p = rhs.ncols;
        let mut data = vec![T::zero(); m * p];
        // Column-major: accumulate column j of the result as a combination
        // of the columns of `self`.
        for j in 0..p {
            let out = &mut data[j * m..(j + 1) * m];
            for k in 0..n {
                let b_kj = rhs.data[j * n + k];
                let a_col = &self.data[k * m..(k + 1) * m];
                for (o, &a) in out.iter_mut().zip(a_col) {
                    *o = *o + a * b_kj;
                }
            }
        }
        Ok(DynMatrix {
            data,
            nrows: m,
            ncols: p,
        })
    }

    /// Multiply every element by `s`, preserving shape.
    pub fn scale(&self, s: T) -> Self {
        let data = self.data.iter().map(|&x| x * s).collect();
        DynMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Transpose: `t[(i, j)] == self[(j, i)]`.
    ///
    /// ```
    /// use tinyekf::DynMatrix;
    /// let a = DynMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let t = a.transpose();
    /// assert_eq!(t.nrows(), 3);
    /// assert_eq!(t[(2, 1)], 6.0);
    /// ```
    pub fn transpose(&self) -> Self {
        let m = self.nrows;
        let n = self.ncols;
        let mut data: Vec<T> = Vec::with_capacity(m * n);
        for i in 0..m {
            for j in 0..n {
                data.push(self.data[j * m + i]);
            }
        }
        DynMatrix {
            data,
            nrows: n,
            ncols: m,
        }
    }
}

// ── Element-wise addition ───────────────────────────────────────────

impl<T: Scalar> Add<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    /// Panics on shape mismatch; see [`DynMatrix::try_add`].
    fn add(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        self.try_add(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Scalar> Add for DynMatrix<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        &self + &rhs
    }
}

impl<T: Scalar> Add<&DynMatrix<T>> for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn add(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        &self + rhs
    }
}

impl<T: Scalar> Add<DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn add(self, rhs: DynMatrix<T>) -> DynMatrix<T> {
        self + &rhs
    }
}

impl<T: Scalar> AddAssign<&DynMatrix<T>> for DynMatrix<T> {
    fn add_assign(&mut self, rhs: &DynMatrix<T>) {
        if let Err(e) = rhs.expect_shape("add", self.shape()) {
            panic!("{}", e);
        }
        for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a = *a + b;
        }
    }
}

impl<T: Scalar> AddAssign for DynMatrix<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.add_assign(&rhs);
    }
}

// ── Element-wise subtraction ────────────────────────────────────────

impl<T: Scalar> Sub<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    /// Panics on shape mismatch; see [`DynMatrix::try_sub`].
    fn sub(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        self.try_sub(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Scalar> Sub for DynMatrix<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        &self - &rhs
    }
}

impl<T: Scalar> Sub<&DynMatrix<T>> for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn sub(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        &self - rhs
    }
}

impl<T: Scalar> Sub<DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn sub(self, rhs: DynMatrix<T>) -> DynMatrix<T> {
        self - &rhs
    }
}

impl<T: Scalar> SubAssign<&DynMatrix<T>> for DynMatrix<T> {
    fn sub_assign(&mut self, rhs: &DynMatrix<T>) {
        if let Err(e) = rhs.expect_shape("subtract", self.shape()) {
            panic!("{}", e);
        }
        for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a = *a - b;
        }
    }
}

impl<T: Scalar> SubAssign for DynMatrix<T> {
    fn sub_assign(&mut self, rhs: Self) {
        self.sub_assign(&rhs);
    }
}

// ── Negation ────────────────────────────────────────────────────────

impl<T: Scalar> Neg for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn neg(self) -> DynMatrix<T> {
        let data = self.data.iter().map(|&x| T::zero() - x).collect();
        DynMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<T: Scalar> Neg for DynMatrix<T> {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}

// ── Matrix multiplication: (M×N) * (N×P) → (M×P) ──────────────────

impl<T: Scalar> Mul<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    /// Panics on shape mismatch; see [`DynMatrix::try_mul`].
    fn mul(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        self.try_mul(rhs).unwrap_or_else(|e| panic!("{}", e))
    }
}

impl<T: Scalar> Mul for DynMatrix<T> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        &self * &rhs
    }
}

impl<T: Scalar> Mul<&DynMatrix<T>> for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn mul(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        &self * rhs
    }
}

impl<T: Scalar> Mul<DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn mul(self, rhs: DynMatrix<T>) -> DynMatrix<T> {
        self * &rhs
    }
}

// ── Scalar multiplication: matrix * scalar ──────────────────────────

impl<T: Scalar> Mul<T> for DynMatrix<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        self.scale(rhs)
    }
}

impl<T: Scalar> Mul<T> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn mul(self, rhs: T) -> DynMatrix<T> {
        self.scale(rhs)
    }
}

impl<T: Scalar> MulAssign<T> for DynMatrix<T> {
    fn mul_assign(&mut self, rhs: T) {
        for x in self.data.iter_mut() {
            *x = *x * rhs;
        }
    }
}

// ── scalar * matrix (concrete impls) ────────────────────────────────

macro_rules! impl_scalar_mul_dyn {
    ($($t:ty),*) => {
        $(
            impl Mul<DynMatrix<$t>> for $t {
                type Output = DynMatrix<$t>;
                fn mul(self, rhs: DynMatrix<$t>) -> DynMatrix<$t> {
                    rhs.scale(self)
                }
            }

            impl Mul<&DynMatrix<$t>> for $t {
                type Output = DynMatrix<$t>;
                fn mul(self, rhs: &DynMatrix<$t>) -> DynMatrix<$t> {
                    rhs.scale(self)
                }
            }
        )*
    };
}

impl_scalar_mul_dyn!(f32, f64);
