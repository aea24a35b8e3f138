use crate::dynmatrix::DimensionMismatch;
use crate::traits::FloatScalar;
use crate::{DynMatrix, DynVector};

/// Process and measurement model supplied by the embedding application.
///
/// `n` is the state dimension and `m` the observation dimension the filter
/// was built with. The filter checks output shapes on every call; it does
/// not check that the functions are deterministic.
///
/// Both Jacobians default to forward differences of the corresponding
/// function, so a model may implement only [`transition`](Model::transition)
/// and [`observe`](Model::observe). If the function's output length changes
/// under perturbation, the default returns an empty 0×0 matrix, which the
/// filter rejects as a dimension mismatch.
///
/// ```
/// use tinyekf::estimate::Model;
/// use tinyekf::{DynMatrix, DynVector};
///
/// /// Range to a beacon at the origin, for a [x, y] state.
/// struct Range;
///
/// impl Model<f64> for Range {
///     fn transition(&self, x: &DynVector<f64>) -> DynVector<f64> {
///         x.clone()
///     }
///
///     fn state_jacobian(&self, _x: &DynVector<f64>) -> DynMatrix<f64> {
///         DynMatrix::eye(2)
///     }
///
///     fn observe(&self, x: &DynVector<f64>) -> DynVector<f64> {
///         DynVector::from_slice(&[x[0].hypot(x[1])])
///     }
/// }
///
/// let x = DynVector::from_slice(&[3.0, 4.0]);
/// let h = Range.observation_jacobian(&x);
/// assert!((h[(0, 0)] - 0.6).abs() < 1e-6);
/// assert!((h[(0, 1)] - 0.8).abs() < 1e-6);
/// ```
pub trait Model<T: FloatScalar> {
    /// State transition `f(x)`: length n in, length n out.
    fn transition(&self, x: &DynVector<T>) -> DynVector<T>;

    /// n×n Jacobian of [`transition`](Model::transition) at `x`.
    fn state_jacobian(&self, x: &DynVector<T>) -> DynMatrix<T> {
        fd_jacobian(|x| self.transition(x), x).unwrap_or_default()
    }

    /// Observation function `h(x)`: length n in, length m out.
    fn observe(&self, x: &DynVector<T>) -> DynVector<T>;

    /// m×n Jacobian of [`observe`](Model::observe) at `x`.
    fn observation_jacobian(&self, x: &DynVector<T>) -> DynMatrix<T> {
        fd_jacobian(|x| self.observe(x), x).unwrap_or_default()
    }
}

impl<T: FloatScalar, M: Model<T> + ?Sized> Model<T> for &M {
    fn transition(&self, x: &DynVector<T>) -> DynVector<T> {
        (**self).transition(x)
    }

    fn state_jacobian(&self, x: &DynVector<T>) -> DynMatrix<T> {
        (**self).state_jacobian(x)
    }

    fn observe(&self, x: &DynVector<T>) -> DynVector<T> {
        (**self).observe(x)
    }

    fn observation_jacobian(&self, x: &DynVector<T>) -> DynMatrix<T> {
        (**self).observation_jacobian(x)
    }
}

/// A [`Model`] assembled from four closures.
///
/// ```
/// use tinyekf::estimate::{FnModel, Model};
/// use tinyekf::{DynMatrix, DynVector};
///
/// let dt = 0.1;
/// let model = FnModel::new(
///     move |x: &DynVector<f64>| DynVector::from_slice(&[x[0] + dt * x[1], x[1]]),
///     move |_x: &DynVector<f64>| DynMatrix::from_rows(2, 2, &[1.0, dt, 0.0, 1.0]),
///     |x: &DynVector<f64>| DynVector::from_slice(&[x[0]]),
///     |_x: &DynVector<f64>| DynMatrix::from_rows(1, 2, &[1.0, 0.0]),
/// );
/// let x = DynVector::from_slice(&[0.0, 2.0]);
/// assert!((model.transition(&x)[0] - 0.2).abs() < 1e-12);
/// ```
#[derive(Clone, Copy)]
pub struct FnModel<F, FJ, H, HJ> {
    f: F,
    fj: FJ,
    h: H,
    hj: HJ,
}

impl<F, FJ, H, HJ> core::fmt::Debug for FnModel<F, FJ, H, HJ> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnModel").finish_non_exhaustive()
    }
}

impl<F, FJ, H, HJ> FnModel<F, FJ, H, HJ> {
    /// `f` state transition, `fj` its Jacobian, `h` observation function,
    /// `hj` its Jacobian.
    pub fn new(f: F, fj: FJ, h: H, hj: HJ) -> Self {
        Self { f, fj, h, hj }
    }
}

impl<T, F, FJ, H, HJ> Model<T> for FnModel<F, FJ, H, HJ>
where
    T: FloatScalar,
    F: Fn(&DynVector<T>) -> DynVector<T>,
    FJ: Fn(&DynVector<T>) -> DynMatrix<T>,
    H: Fn(&DynVector<T>) -> DynVector<T>,
    HJ: Fn(&DynVector<T>) -> DynMatrix<T>,
{
    fn transition(&self, x: &DynVector<T>) -> DynVector<T> {
        (self.f)(x)
    }

    fn state_jacobian(&self, x: &DynVector<T>) -> DynMatrix<T> {
        (self.fj)(x)
    }

    fn observe(&self, x: &DynVector<T>) -> DynVector<T> {
        (self.h)(x)
    }

    fn observation_jacobian(&self, x: &DynVector<T>) -> DynMatrix<T> {
        (self.hj)(x)
    }
}

/// Forward-difference Jacobian of `f` at `x`.
///
/// Uses step size `h_j = sqrt(ε) * max(|x_j|, 1)` for each component. The
/// result has `f(x).len()` rows and `x.len()` columns.
///
/// Fails if a perturbed evaluation returns a vector whose length differs
/// from `f(x)`.
///
/// ```
/// use tinyekf::estimate::fd_jacobian;
/// use tinyekf::DynVector;
///
/// let x = DynVector::from_slice(&[1.0, 2.0]);
/// let j = fd_jacobian(|x: &DynVector<f64>| DynVector::from_slice(&[x[0] * x[1]]), &x).unwrap();
/// assert_eq!(j.shape(), (1, 2));
/// assert!((j[(0, 0)] - 2.0).abs() < 1e-6);
/// ```
pub fn fd_jacobian<T: FloatScalar>(
    f: impl Fn(&DynVector<T>) -> DynVector<T>,
    x: &DynVector<T>,
) -> Result<DynMatrix<T>, DimensionMismatch> {
    let sqrt_eps = T::epsilon().sqrt();
    let f0 = f(x);
    let rows = f0.len();
    let mut jac = DynMatrix::zeros(rows, x.len());

    for j in 0..x.len() {
        let xj = x[j];
        let h = sqrt_eps * xj.abs().max(T::one());
        let mut x_pert = x.clone();
        x_pert[j] = xj + h;
        let f_pert = f(&x_pert);
        f_pert.expect_len("finite-difference Jacobian", rows)?;

        for i in 0..rows {
            jac[(i, j)] = (f_pert[i] - f0[i]) / h;
        }
    }

    Ok(jac)
}
