use std::path::Path;

use synthset_camera::{
    intrinsics::{CameraLens, RenderSettings},
    SceneObject,
};
use synthset_linalg::Mat4;

use crate::config::LightSettings;

/// Error reported by a rendering host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host rejected a request.
    #[error("Render host error: {0}")]
    Rejected(String),

    /// The host failed to write an output file.
    #[error("Render host failed to write output. {0}")]
    FileError(#[from] std::io::Error),
}

/// An auxiliary image the host writes next to every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputChannel {
    /// Binary object mask.
    Mask,
    /// The render with a transparent background.
    Masked,
    /// Normalized depth.
    Depth,
    /// World space normals.
    Normal,
}

impl OutputChannel {
    /// The name used in file prefixes.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputChannel::Mask => "mask",
            OutputChannel::Masked => "masked",
            OutputChannel::Depth => "depth",
            OutputChannel::Normal => "normal",
        }
    }

    /// The file prefix of a view, e.g. `007_mask_`.
    ///
    /// The host appends its frame number and extension.
    pub fn prefix(&self, index: u32) -> String {
        format!("{index:03}_{}_", self.as_str())
    }
}

/// A camera spawned by the host, as evaluated after constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct HostCamera {
    /// The evaluated camera-to-world matrix.
    pub world_matrix: Mat4,
    /// The lens state.
    pub lens: CameraLens,
}

/// A 3D application that owns the scene and renders it.
///
/// Calls are strictly sequential; a bound output stays bound until the next
/// call to [`RenderHost::bind_output`] for the same channel.
pub trait RenderHost {
    /// The render settings in effect.
    fn render_settings(&self) -> RenderSettings;

    /// Every object of the scene with its world matrix and local bounds.
    fn scene_objects(&self) -> Vec<SceneObject>;

    /// Apply the output settings and add the light.
    fn configure(&mut self, render: &RenderSettings, light: &LightSettings)
        -> Result<(), HostError>;

    /// Replace the active camera with one at `world_matrix` and return its evaluated state.
    fn spawn_camera(&mut self, world_matrix: &Mat4, lens: &CameraLens)
        -> Result<HostCamera, HostError>;

    /// Route the next render of `channel` to `dir` with the file prefix `prefix`.
    fn bind_output(
        &mut self,
        channel: OutputChannel,
        dir: &Path,
        prefix: &str,
    ) -> Result<(), HostError>;

    /// Render the active camera, writing the image to `path` and every bound channel.
    fn render(&mut self, path: &Path) -> Result<(), HostError>;
}
