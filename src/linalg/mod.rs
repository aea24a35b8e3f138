//! Dense decompositions backing [`DynMatrix::inverse`](crate::DynMatrix::inverse).
//!
//! The free functions operate on `&mut impl MatrixMut<T>` in place; the
//! [`DynLu`](crate::dynmatrix::DynLu) wrapper owns the packed factors.

pub(crate) mod lu;

pub use lu::{lu_in_place, lu_solve};
