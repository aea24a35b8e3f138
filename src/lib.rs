//! # tinyekf
//!
//! Extended Kalman Filter with the small dense linear-algebra substrate it
//! needs, no-std compatible (requires `alloc`).
//!
//! ## Quick start
//!
//! ```
//! use tinyekf::estimate::{Ekf, EkfConfig, FnModel};
//! use tinyekf::{DynMatrix, DynVector};
//!
//! // Constant scalar observed directly; F = H = [1].
//! let model = FnModel::new(
//!     |x: &DynVector<f64>| x.clone(),
//!     |_x: &DynVector<f64>| DynMatrix::eye(1),
//!     |x: &DynVector<f64>| x.clone(),
//!     |_x: &DynVector<f64>| DynMatrix::eye(1),
//! );
//! let mut ekf = Ekf::with_config(model, 1, 1, EkfConfig::new(1.0, 1e-4, 0.1)).unwrap();
//!
//! let mut x = ekf.step(&[5.0]).unwrap();
//! for _ in 1..40 {
//!     x = ekf.step(&[5.0]).unwrap();
//! }
//! assert!((x[0] - 5.0).abs() < 0.01);
//! ```
//!
//! ## Modules
//!
//! - [`dynmatrix`]: Heap-allocated `DynMatrix<T>` with runtime dimensions.
//!   Column-major `Vec<T>` storage. Checked operations (`try_add`,
//!   `try_sub`, `try_mul`, `inverse`, `try_get`, `try_set`) report
//!   [`MatrixError`](dynmatrix::MatrixError); the `+`, `-`, `*` and index
//!   operators are panicking shorthands for them. [`DynVector<T>`] is a
//!   column-vector newtype.
//!
//! - [`linalg`]: LU decomposition with partial pivoting. Free functions
//!   operate in place on `&mut impl MatrixMut<T>`; `DynLu` offers `solve()`,
//!   `inverse()` and `det()`.
//!
//! - [`estimate`]: The [`Ekf`](estimate::Ekf) engine, the
//!   [`Model`](estimate::Model) trait for process and observation
//!   functions, [`FnModel`](estimate::FnModel) for closure-based models, and
//!   [`EkfConfig`](estimate::EkfConfig).
//!
//! - [`traits`]: Element traits:
//!   - [`Scalar`]: all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`]: real floats (`Scalar + Float`), used by LU and the filter
//!   - [`MatrixRef`] / [`MatrixMut`]: generic read/write access for algorithms
//!
//! ## Cargo features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `std`   | yes     | Hardware FPU via system libm, `std::error::Error` impls |
//! | `serde` | no      | `Serialize`/`Deserialize` for `EkfConfig` and `JacobianRefresh` |

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod dynmatrix;
pub mod estimate;
pub mod linalg;
pub mod traits;

pub use dynmatrix::{DynMatrix, DynVector};
pub use estimate::{Ekf, EkfConfig, EkfError, FnModel, JacobianRefresh, Model};
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};
