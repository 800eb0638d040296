/// Intrinsics, extrinsics and projection files.
pub mod camera;

/// Auxiliary output channels of the host.
pub mod channel;

/// The `metadata.csv` pose table.
pub mod metadata;

/// Bounding box and normalization matrix.
pub mod scene;

use crate::plugin::PluginRegistry;

/// Register every built-in plugin.
pub fn register_builtin(registry: &mut PluginRegistry) {
    registry.register("camera_intrinsics", camera::CameraIntrinsicsPlugin::create);
    registry.register("camera_extrinsics", camera::CameraExtrinsicsPlugin::create);
    registry.register(
        "camera_projection_matrix",
        camera::ProjectionMatrixPlugin::create,
    );
    registry.register("bounding_box", scene::BoundingBoxPlugin::create);
    registry.register(
        "normalization_matrix",
        scene::NormalizationMatrixPlugin::create,
    );
    registry.register("metadata", metadata::MetadataPlugin::create);
    registry.register("mask", channel::create_mask);
    registry.register("masked", channel::create_masked);
    registry.register("depth", channel::create_depth);
    registry.register("normal", channel::create_normal);
}
