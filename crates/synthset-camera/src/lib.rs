#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Coordinate conventions
//!
//! The rendering host uses x right, y up, z backward for its cameras (the
//! camera looks along `-Z`). Everything produced by this crate is expressed in
//! the computer-vision convention: x right, y down, z forward.
//!
//! ```
//! use synthset_camera::{derive_extrinsics, derive_intrinsics, projection_matrix};
//! use synthset_camera::intrinsics::{CameraLens, RenderSettings};
//! use synthset_linalg::IDENTITY4;
//!
//! let k = derive_intrinsics(&CameraLens::default(), &RenderSettings::default())?;
//! let rt = derive_extrinsics(&IDENTITY4)?;
//! let p = projection_matrix(&k, &rt);
//! assert_eq!(p[2][3], 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// World-to-camera extrinsics in the CV axis convention.
pub mod extrinsics;

/// Pixel-space pinhole intrinsics derived from lens and render settings.
pub mod intrinsics;

/// Projection matrices combining intrinsics and extrinsics.
pub mod projection;

/// Scene bounding volume and normalization transform.
pub mod scene;

pub use extrinsics::{derive_extrinsics, Extrinsics};
pub use intrinsics::{derive_intrinsics, CameraIntrinsic, ImageSize};
pub use projection::projection_matrix;
pub use scene::{
    compute_bounding_box, normalization_matrix, BoundingBox, ExclusionFilter, SceneObject,
};

use intrinsics::CameraProjection;

/// Error types for camera derivation.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// Only perspective cameras can be described by a pinhole matrix.
    #[error("Unsupported camera model: {0:?}")]
    UnsupportedCameraModel(CameraProjection),

    /// A lens or render parameter is out of range.
    #[error("Invalid camera parameter: {0}")]
    InvalidParameter(String),

    /// The world transform has a zero scale axis and cannot be decomposed.
    #[error("Degenerate world transform: {0}")]
    DegenerateTransform(String),

    /// The exclusion pattern is not a valid regular expression.
    #[error("Invalid exclusion pattern. {0}")]
    InvalidExcludePattern(#[from] regex::Error),

    /// Error from the linear algebra kernel.
    #[error(transparent)]
    Linalg(#[from] synthset_linalg::LinalgError),
}
