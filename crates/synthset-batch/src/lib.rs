#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! The generator configures a [`host::RenderHost`], builds the plugins named in
//! a [`config::BatchConfig`] from a [`plugin::PluginRegistry`] and renders every
//! view in ascending order. Plugins write the per-view camera files and bind the
//! auxiliary outputs of the host before each render.

/// Versioned batch configuration.
pub mod config;

/// Numeric expressions in configuration values.
pub mod expr;

/// The per-view driver.
pub mod generator;

/// The interface of the rendering host.
pub mod host;

/// Plugin interface and registry.
pub mod plugin;

/// Built-in plugins.
pub mod plugins;

/// Camera placement.
pub mod sampling;

pub use config::{BatchConfig, ConfigError};
pub use generator::{generate_batch, BatchReport};
pub use plugin::{BatchPlugin, PluginRegistry};

/// Error types for batch generation.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The rendering host failed.
    #[error(transparent)]
    Host(#[from] host::HostError),

    /// Error writing a batch file.
    #[error(transparent)]
    DatasetIo(#[from] synthset_io::DatasetIoError),

    /// Error deriving the camera model.
    #[error(transparent)]
    Camera(#[from] synthset_camera::CameraError),

    /// Error building a camera transform.
    #[error(transparent)]
    Linalg(#[from] synthset_linalg::LinalgError),

    /// Error to manipulate the output directory.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),
}
