#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Fixed-size matrix types and operations.
pub mod mat;

/// Quaternion conversions in the `(qw, qx, qy, qz)` convention.
pub mod quat;

/// Rotation constructors.
pub mod transforms;

pub use mat::*;

/// Error types for the linear algebra kernel.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LinalgError {
    /// The matrix has no inverse.
    #[error("Matrix is singular (pivot {0:e})")]
    SingularMatrix(f64),

    /// Cannot build a rotation from a zero-length axis.
    #[error("Cannot compute rotation matrix from a zero vector")]
    ZeroAxis,
}
