#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Every exporter reads a [`synthset_io::record::Dataset`] loaded from one batch
//! directory and writes a fresh layout into an output directory. Views missing a
//! file the format needs are skipped with a warning; a run without a single
//! complete view fails.

/// Aggregate `images`/`poses`/`focal` archive built from several batches.
pub mod assemble;

/// COLMAP sparse model with known poses.
pub mod colmap;

/// IDR `cameras.npz` layout.
pub mod idr;

/// NSVF Tanks&Temples layout.
pub mod nsvf;

/// Train/test partition of view indices.
pub mod split;

use std::path::PathBuf;

/// Error types for the exporters.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Error reading the batch or writing the output files.
    #[error(transparent)]
    DatasetIo(#[from] synthset_io::DatasetIoError),

    /// Error to manipulate the output directory.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error in the COLMAP text model.
    #[error(transparent)]
    Colmap(#[from] colmap::ColmapError),

    /// Error from a camera computation.
    #[error(transparent)]
    Camera(#[from] synthset_camera::CameraError),

    /// No view had every file the format needs.
    #[error("No complete views in {0}")]
    NoCompleteViews(PathBuf),

    /// The train fraction is outside `(0, 1)`.
    #[error("Invalid split fraction {0}, expected a value in (0, 1)")]
    InvalidSplit(f64),

    /// Images of an aggregate archive differ in size.
    #[error("Image {path} is {found_width}x{found_height}, expected {width}x{height}")]
    InconsistentImageSize {
        /// The offending image.
        path: PathBuf,
        /// The expected width.
        width: u32,
        /// The expected height.
        height: u32,
        /// The width of the offending image.
        found_width: u32,
        /// The height of the offending image.
        found_height: u32,
    },
}
