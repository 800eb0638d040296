#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Small fixed-size matrix algebra.
#[doc(inline)]
pub use synthset_linalg as linalg;

/// Intrinsics, extrinsics and scene geometry.
#[doc(inline)]
pub use synthset_camera as camera;

/// Batch directory files and dataset records.
#[doc(inline)]
pub use synthset_io as io;

/// COLMAP, NSVF and IDR exporters and the archive assembler.
#[doc(inline)]
pub use synthset_export as export;

/// The batch generator and its plugins.
#[doc(inline)]
pub use synthset_batch as batch;
