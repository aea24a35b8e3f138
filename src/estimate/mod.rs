//! Extended Kalman Filter over runtime-sized matrices.
//!
//! The filter owns the state estimate and its covariance and advances them
//! with [`Ekf::step`]. Problem-specific dynamics and measurement functions
//! come from a [`Model`], either a type implementing the trait or a
//! [`FnModel`] built from closures.
//!
//! # Example
//!
//! ```
//! use tinyekf::estimate::{Ekf, FnModel};
//! use tinyekf::{DynMatrix, DynVector};
//!
//! // Scalar random walk observed directly.
//! let model = FnModel::new(
//!     |x: &DynVector<f64>| x.clone(),
//!     |_x: &DynVector<f64>| DynMatrix::eye(1),
//!     |x: &DynVector<f64>| x.clone(),
//!     |_x: &DynVector<f64>| DynMatrix::eye(1),
//! );
//! let mut ekf = Ekf::new(model, 1, 1).unwrap();
//!
//! for _ in 0..50 {
//!     ekf.step(&[5.0]).unwrap();
//! }
//! assert!((ekf.state()[0] - 5.0).abs() < 0.1);
//! ```

mod ekf;
mod model;

#[cfg(test)]
mod tests;

pub use ekf::Ekf;
pub use model::{fd_jacobian, FnModel, Model};

use crate::dynmatrix::{DimensionMismatch, IndexOutOfRange, MatrixError};

/// Errors from constructing or stepping the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EkfError {
    /// State or observation dimension was zero.
    ZeroDimension { n: usize, m: usize },
    /// An observation, model output or Jacobian had the wrong shape.
    DimensionMismatch(DimensionMismatch),
    /// Innovation covariance `H P Hᵀ + R` is singular.
    SingularMatrix,
    /// Element access outside a matrix.
    IndexOutOfRange(IndexOutOfRange),
}

impl EkfError {
    /// Whether this is a shape error, including a zero dimension at
    /// construction.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            EkfError::ZeroDimension { .. } | EkfError::DimensionMismatch(_)
        )
    }
}

impl core::fmt::Display for EkfError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EkfError::ZeroDimension { n, m } => write!(
                f,
                "state and observation dimensions must be positive (n = {}, m = {})",
                n, m
            ),
            EkfError::DimensionMismatch(e) => e.fmt(f),
            EkfError::SingularMatrix => write!(f, "innovation covariance is singular"),
            EkfError::IndexOutOfRange(e) => e.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EkfError {}

impl From<DimensionMismatch> for EkfError {
    fn from(e: DimensionMismatch) -> Self {
        EkfError::DimensionMismatch(e)
    }
}

impl From<MatrixError> for EkfError {
    fn from(e: MatrixError) -> Self {
        match e {
            MatrixError::DimensionMismatch(e) => EkfError::DimensionMismatch(e),
            MatrixError::Singular => EkfError::SingularMatrix,
            MatrixError::IndexOutOfRange(e) => EkfError::IndexOutOfRange(e),
        }
    }
}

/// When the filter evaluates the model Jacobians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JacobianRefresh {
    /// `F` and `H` are evaluated once, at the initial (zero) state, and
    /// reused on every step. Call [`Ekf::refresh_jacobians`] to re-evaluate
    /// them at the current estimate.
    #[default]
    Construction,
    /// `F` is evaluated at the previous posterior and `H` at the predicted
    /// state on every step.
    EveryStep,
}

/// Filter configuration: initial covariance scale, noise levels and
/// Jacobian cadence.
///
/// `P₀ = pval · I`, `Q = qval · I`, `R = rval · I`.
///
/// ```
/// use tinyekf::estimate::{EkfConfig, JacobianRefresh};
///
/// let cfg = EkfConfig::<f64>::default()
///     .with_pval(1.0)
///     .with_jacobians(JacobianRefresh::EveryStep);
/// assert_eq!(cfg.qval, 1e-4);
/// assert_eq!(cfg.rval, 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EkfConfig<T> {
    /// Initial state covariance scale.
    pub pval: T,
    /// Process noise variance.
    pub qval: T,
    /// Measurement noise variance.
    pub rval: T,
    /// Jacobian evaluation cadence.
    pub jacobians: JacobianRefresh,
}

impl<T> EkfConfig<T> {
    pub fn new(pval: T, qval: T, rval: T) -> Self {
        Self {
            pval,
            qval,
            rval,
            jacobians: JacobianRefresh::Construction,
        }
    }

    pub fn with_pval(mut self, pval: T) -> Self {
        self.pval = pval;
        self
    }

    pub fn with_qval(mut self, qval: T) -> Self {
        self.qval = qval;
        self
    }

    pub fn with_rval(mut self, rval: T) -> Self {
        self.rval = rval;
        self
    }

    pub fn with_jacobians(mut self, jacobians: JacobianRefresh) -> Self {
        self.jacobians = jacobians;
        self
    }
}

macro_rules! impl_config_default {
    ($($t:ty),*) => {
        $(
            impl Default for EkfConfig<$t> {
                /// `pval = 0.1`, `qval = 1e-4`, `rval = 0.1`, Jacobians at construction.
                fn default() -> Self {
                    Self::new(0.1, 1e-4, 0.1)
                }
            }
        )*
    };
}

impl_config_default!(f32, f64);
