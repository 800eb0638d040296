#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Scanning of batch directories into per-view file tables.
pub mod batch;

/// Bounding box and normalization matrix files.
pub mod bbox;

/// Error types for the io module.
pub mod error;

/// Intrinsics files in their 4x4, 3x3 and compact schemas.
pub mod intrinsics;

/// Row-major matrix text and JSON files.
pub mod matrix;

/// Per-image pose and focal rows written by the batch generator.
pub mod metadata;

/// Numpy `.npz` archives of named arrays.
pub mod npz;

/// PNG image reading and writing.
pub mod png;

/// Canonical dataset records assembled from a batch directory.
pub mod record;

pub use error::DatasetIoError;
